use std::fmt;

use vigil_core::VigilError;

#[derive(Debug)]
pub enum StoreError {
    Sqlite(rusqlite::Error),
    Io(std::io::Error),
    Json(serde_json::Error),
    Config(String),
    InvalidData(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Sqlite(e) => write!(f, "SQLite error: {e}"),
            StoreError::Io(e) => write!(f, "I/O error: {e}"),
            StoreError::Json(e) => write!(f, "JSON error: {e}"),
            StoreError::Config(msg) => write!(f, "invalid configuration: {msg}"),
            StoreError::InvalidData(msg) => write!(f, "invalid data: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Sqlite(e) => Some(e),
            StoreError::Io(e) => Some(e),
            StoreError::Json(e) => Some(e),
            StoreError::Config(_) | StoreError::InvalidData(_) => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Sqlite(e)
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Json(e)
    }
}

impl From<toml::de::Error> for StoreError {
    fn from(e: toml::de::Error) -> Self {
        StoreError::Config(e.to_string())
    }
}

impl From<VigilError> for StoreError {
    fn from(e: VigilError) -> Self {
        match e {
            VigilError::Configuration(msg) => StoreError::Config(msg),
            VigilError::Persistence(msg) => StoreError::InvalidData(msg),
        }
    }
}

/// Backends surface every storage failure to the engine as a persistence error.
impl From<StoreError> for VigilError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Config(msg) => VigilError::Configuration(msg),
            other => VigilError::Persistence(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
