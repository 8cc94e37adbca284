use std::fmt;

/// Failure taxonomy for the scoring engine.
///
/// `Configuration` is fatal at construction. `Persistence` is surfaced per
/// call when a durable append fails; loads never produce it.
#[derive(Debug, Clone, PartialEq)]
pub enum VigilError {
    Configuration(String),
    Persistence(String),
}

impl fmt::Display for VigilError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VigilError::Configuration(msg) => write!(f, "configuration error: {msg}"),
            VigilError::Persistence(msg) => write!(f, "persistence error: {msg}"),
        }
    }
}

impl std::error::Error for VigilError {}

impl VigilError {
    pub fn config(msg: impl Into<String>) -> Self {
        VigilError::Configuration(msg.into())
    }

    pub fn persistence(msg: impl Into<String>) -> Self {
        VigilError::Persistence(msg.into())
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, VigilError::Configuration(_))
    }

    pub fn is_persistence(&self) -> bool {
        matches!(self, VigilError::Persistence(_))
    }
}

pub type Result<T> = std::result::Result<T, VigilError>;
