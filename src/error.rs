use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while collecting facts.
///
/// Missing parent links and unset properties are not errors; they surface as
/// `null` fields in the returned records.
#[derive(Debug, Error)]
pub enum FactsError {
    /// Authentication or network failure while opening a session.
    #[error("Unable to connect to vCenter {endpoint}: {reason}")]
    Connection { endpoint: String, reason: String },

    /// The service answered with a SOAP fault after the session was open.
    #[error("vCenter fault {fault}: {message}")]
    Fault { fault: String, message: String },

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Malformed response: {0}")]
    Parse(String),

    #[error("SQLite database file {} does not exist", .0.display())]
    NotFound(PathBuf),

    /// The requested table is missing or holds no rows.
    #[error("Table {table} does not exist in the SQLite database {}", .path.display())]
    Query { table: String, path: PathBuf },

    #[error("SQLite error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FactsError {
    pub fn connection(endpoint: &str, reason: impl std::fmt::Display) -> Self {
        Self::Connection {
            endpoint: endpoint.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Name of the SOAP fault type, if this is a fault.
    pub fn fault_name(&self) -> Option<&str> {
        match self {
            Self::Fault { fault, .. } => Some(fault),
            _ => None,
        }
    }
}

impl From<quick_xml::Error> for FactsError {
    fn from(e: quick_xml::Error) -> Self {
        Self::Parse(format!("XML error: {e}"))
    }
}

impl From<quick_xml::events::attributes::AttrError> for FactsError {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        Self::Parse(format!("XML attribute error: {e}"))
    }
}

pub type FactsResult<T> = Result<T, FactsError>;
