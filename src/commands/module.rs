// Ansible binary module entry points
use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::{ConnectionConfig, ConnectionOverrides, FileConfig, Secret};
use crate::facts::{collect_from_vcenter, FactKind};
use crate::output::{module_failure, module_success, print_module_result};
use crate::sqlite::fetch_all_rows;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleKind {
    Facts(FactKind),
    Sqlite,
}

impl ModuleKind {
    /// Kind selected by an installed module name such as `vc_vm_facts`.
    pub fn from_program_name(name: &str) -> Option<Self> {
        let kind = match name {
            "vc_vm_facts" => Self::Facts(FactKind::Vm),
            "vc_cluster_facts" => Self::Facts(FactKind::Cluster),
            "vc_datastore_facts" => Self::Facts(FactKind::Datastore),
            "vc_datastore_cluster_facts" => Self::Facts(FactKind::DatastoreCluster),
            "vc_vlan_facts" | "vc_vlans_facts" => Self::Facts(FactKind::Vlan),
            "sqlite_fetchall" => Self::Sqlite,
            _ => return None,
        };
        Some(kind)
    }

    /// Kind given to the `module --kind` subcommand.
    pub fn from_kind_arg(kind: &str) -> Option<Self> {
        let kind = match kind {
            "vm" => Self::Facts(FactKind::Vm),
            "cluster" => Self::Facts(FactKind::Cluster),
            "datastore" => Self::Facts(FactKind::Datastore),
            "datastore-cluster" | "datastore_cluster" => Self::Facts(FactKind::DatastoreCluster),
            "vlan" => Self::Facts(FactKind::Vlan),
            "sqlite" => Self::Sqlite,
            _ => return None,
        };
        Some(kind)
    }

    pub fn result_key(&self) -> &'static str {
        match self {
            Self::Facts(kind) => kind.result_key(),
            Self::Sqlite => "sqlite_facts",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct VcenterModuleArgs {
    pub vcenter: Option<String>,
    pub username: Option<String>,
    pub password: Option<Secret>,
    #[serde(default, deserialize_with = "ansible_bool")]
    pub disable_ssl_verification: bool,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct SqliteModuleArgs {
    pub path: PathBuf,
    pub table: String,
}

// Playbooks may pass booleans as yes/no strings
fn ansible_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => Ok(value),
        Flag::Text(text) => match text.to_ascii_lowercase().as_str() {
            "yes" | "true" | "on" | "1" => Ok(true),
            "no" | "false" | "off" | "0" | "" => Ok(false),
            other => Err(de::Error::custom(format!("invalid boolean value '{}'", other))),
        },
    }
}

/// Module kind and arguments file when the binary runs under a module name.
pub fn module_invocation(args: &[OsString]) -> Option<(ModuleKind, Option<PathBuf>)> {
    let program = Path::new(args.first()?).file_stem()?.to_str()?;
    let kind = ModuleKind::from_program_name(program)?;
    Some((kind, args.get(1).map(PathBuf::from)))
}

pub fn handle_module_command(
    kind: &str,
    args_file: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let kind = ModuleKind::from_kind_arg(kind)
        .ok_or_else(|| format!("Unknown module kind: {}", kind))?;
    run_module(kind, Some(args_file))
}

/// Run one module invocation and print its result document. The document is
/// printed on failure too; the returned error only drives the exit status.
pub fn run_module(
    kind: ModuleKind,
    args_file: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let outcome: Result<Value, Box<dyn std::error::Error>> = match args_file {
        Some(path) => fs::read_to_string(path)
            .map_err(|e| format!("Unable to read module arguments {}: {}", path.display(), e).into())
            .and_then(|text| module_facts(kind, &text)),
        None => Err("Expected the module arguments file as the only argument".into()),
    };

    match outcome {
        Ok(facts) => {
            print_module_result(&module_success(kind.result_key(), facts));
            Ok(())
        }
        Err(e) => {
            print_module_result(&module_failure(&e.to_string()));
            Err(e)
        }
    }
}

fn module_facts(kind: ModuleKind, args_text: &str) -> Result<Value, Box<dyn std::error::Error>> {
    match kind {
        ModuleKind::Facts(fact_kind) => {
            let args: VcenterModuleArgs = serde_json::from_str(args_text)?;
            debug!(kind = fact_kind.result_key(), vcenter = ?args.vcenter, "running vCenter module");
            let config = ConnectionConfig::resolve(overrides_from(args), FileConfig::default())?;
            Ok(collect_from_vcenter(&config, fact_kind)?)
        }
        ModuleKind::Sqlite => {
            let args: SqliteModuleArgs = serde_json::from_str(args_text)?;
            let rows = fetch_all_rows(&args.path, &args.table)?;
            Ok(Value::from(rows))
        }
    }
}

fn overrides_from(args: VcenterModuleArgs) -> ConnectionOverrides {
    ConnectionOverrides {
        vcenter: args.vcenter,
        username: args.username,
        password: args.password,
        disable_ssl_verification: args.disable_ssl_verification,
        timeout_secs: args.timeout_secs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_program_names() {
        assert_eq!(
            ModuleKind::from_program_name("vc_datastore_cluster_facts"),
            Some(ModuleKind::Facts(FactKind::DatastoreCluster))
        );
        assert_eq!(ModuleKind::from_program_name("sqlite_fetchall"), Some(ModuleKind::Sqlite));
        assert_eq!(ModuleKind::from_program_name("vcenter-facts"), None);
    }

    #[test]
    fn test_module_invocation_uses_file_stem() {
        let args = vec![
            OsString::from("/home/ops/.ansible/tmp/vc_vm_facts"),
            OsString::from("/home/ops/.ansible/tmp/args"),
        ];
        let (kind, file) = module_invocation(&args).unwrap();
        assert_eq!(kind, ModuleKind::Facts(FactKind::Vm));
        assert_eq!(file, Some(PathBuf::from("/home/ops/.ansible/tmp/args")));

        assert!(module_invocation(&[OsString::from("vcenter-facts")]).is_none());
    }

    #[test]
    fn test_vcenter_args_ignore_ansible_keys() {
        let args: VcenterModuleArgs = serde_json::from_str(
            r#"{"vcenter": "vc01", "username": "ops", "password": "pw",
                "disable_ssl_verification": "yes", "_ansible_check_mode": false}"#,
        )
        .unwrap();
        assert!(args.disable_ssl_verification);
        assert_eq!(format!("{:?}", args.password), "Some(Secret(********))");

        let config = ConnectionConfig::resolve(overrides_from(args), FileConfig::default()).unwrap();
        assert!(!config.verify_tls);
        assert_eq!(config.endpoint, "vc01");
    }

    #[test]
    fn test_bad_boolean_is_rejected() {
        let result: Result<VcenterModuleArgs, _> =
            serde_json::from_str(r#"{"disable_ssl_verification": "maybe"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_credentials_fail_before_connecting() {
        let err = module_facts(ModuleKind::Facts(FactKind::Vm), r#"{"vcenter": "vc01"}"#)
            .unwrap_err();
        assert!(err.to_string().contains("username is required"));
    }

    #[test]
    fn test_sqlite_module_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let args = json!({
            "path": dir.path().join("absent.db"),
            "table": "hosts",
        });

        let err = module_facts(ModuleKind::Sqlite, &args.to_string()).unwrap_err();
        assert!(err.to_string().starts_with("SQLite database file"));
    }

    #[test]
    fn test_unreadable_args_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = run_module(ModuleKind::Sqlite, Some(&dir.path().join("missing")));
        assert!(result.is_err());
        assert!(run_module(ModuleKind::Sqlite, None).is_err());
    }
}
