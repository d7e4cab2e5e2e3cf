use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The only failure the manga core reports. No codes, just a message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CoreError {
    pub message: String,
}

impl CoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<anyhow::Error> for CoreError {
    fn from(value: anyhow::Error) -> Self {
        Self {
            message: format!("{value:#}"),
        }
    }
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Error detail as published in observable state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub message: String,
}

impl ErrorInfo {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<CoreError> for ErrorInfo {
    fn from(value: CoreError) -> Self {
        Self {
            message: value.message,
        }
    }
}

impl From<&CoreError> for ErrorInfo {
    fn from(value: &CoreError) -> Self {
        Self {
            message: value.message.clone(),
        }
    }
}

impl std::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}
