use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{FactsError, FactsResult};

const APP_DIR: &str = "vcenter-facts";
const CONFIG_FILE: &str = "config.yaml";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// A credential that must never be echoed.
///
/// `Debug` is redacted; the only way to read the value is [`Secret::expose`].
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(********)")
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Everything needed to open a vCenter session.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub endpoint: String,
    pub username: String,
    pub secret: Secret,
    pub verify_tls: bool,
    pub timeout_secs: u64,
}

/// Values given on the command line or through the environment.
#[derive(Debug, Default, Clone)]
pub struct ConnectionOverrides {
    pub vcenter: Option<String>,
    pub username: Option<String>,
    pub password: Option<Secret>,
    pub disable_ssl_verification: bool,
    pub timeout_secs: Option<u64>,
}

/// Optional YAML config file, lowest precedence.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub vcenter: Option<String>,
    pub username: Option<String>,
    pub password: Option<Secret>,
    pub disable_ssl_verification: Option<bool>,
    pub timeout_secs: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> FactsResult<Self> {
        let text = fs::read_to_string(path)?;
        debug!(path = %path.display(), "loaded config file");
        Self::parse(&text)
            .map_err(|e| FactsError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn parse(text: &str) -> Result<Self, serde_yaml::Error> {
        // An empty file deserializes to unit, not to a mapping
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    /// Load the explicit file if given, else the per-user default.
    /// A missing default file yields an empty config.
    pub fn discover(explicit: Option<&Path>) -> FactsResult<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match default_config_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

impl ConnectionConfig {
    /// Merge overrides on top of the file config.
    pub fn resolve(overrides: ConnectionOverrides, file: FileConfig) -> FactsResult<Self> {
        let endpoint = overrides
            .vcenter
            .or(file.vcenter)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| FactsError::Config("vcenter endpoint is required".to_string()))?;
        let username = overrides
            .username
            .or(file.username)
            .ok_or_else(|| FactsError::Config("username is required".to_string()))?;
        let secret = overrides
            .password
            .or(file.password)
            .ok_or_else(|| FactsError::Config("password is required".to_string()))?;

        let timeout_secs = overrides
            .timeout_secs
            .or(file.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(FactsError::Config(
                "timeout_secs must be at least 1 second".to_string(),
            ));
        }

        let disable_ssl = overrides.disable_ssl_verification
            || file.disable_ssl_verification.unwrap_or(false);

        Ok(Self {
            endpoint,
            username,
            secret,
            verify_tls: !disable_ssl,
            timeout_secs,
        })
    }
}
