//! Error types for TrustAgent.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrustError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Run log error: {0}")]
    Persistence(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TrustError {
    pub fn code(&self) -> i32 {
        match self {
            TrustError::Config(_) => -32010,
            TrustError::Persistence(_) => -32011,
            TrustError::Io(_) => -32006,
            TrustError::Json(_) => -32700,
        }
    }
}
