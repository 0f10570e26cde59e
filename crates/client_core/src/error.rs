use std::{io, path::PathBuf};

use shared::error::{ApiError, ErrorCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read '{}': {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to write '{}': {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("failed to parse '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to encode store contents: {0}")]
    Encode(#[source] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("invalid server address '{address}': {reason}")]
    InvalidServer { address: String, reason: String },
    #[error("failed to connect to server: {0}")]
    Unreachable(#[source] reqwest::Error),
    #[error("failed to parse server response: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("settings unavailable: {0}")]
    Settings(#[from] StoreError),
}

impl BackendError {
    pub fn code(&self) -> ErrorCode {
        match self {
            BackendError::InvalidServer { .. } => ErrorCode::InvalidServer,
            BackendError::Unreachable(_) => ErrorCode::Unreachable,
            BackendError::Malformed(_) => ErrorCode::Malformed,
            BackendError::Settings(_) => ErrorCode::Settings,
        }
    }
}

impl From<&BackendError> for ApiError {
    fn from(value: &BackendError) -> Self {
        ApiError::new(value.code(), value.to_string())
    }
}

impl From<BackendError> for ApiError {
    fn from(value: BackendError) -> Self {
        ApiError::from(&value)
    }
}
