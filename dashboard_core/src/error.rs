use std::sync::Arc;
use thiserror::Error;

/// Failure reported by an [`ObjectStore`](crate::stores::ObjectStore) download.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Transient error: {0}")]
    Transient(String),

    #[error("Download timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl StoreError {
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::NotFound(_) => "not_found",
            StoreError::PermissionDenied(_) => "permission_denied",
            StoreError::Transient(_) => "transient",
            StoreError::Timeout(_) => "timeout",
        }
    }
}

/// Errors surfaced by the metrics cache.
///
/// The type is `Clone` because one failed fetch is delivered to every caller
/// that was waiting on it.
#[derive(Error, Debug, Clone)]
pub enum CacheError {
    #[error("No file list configured for metric type '{0}'")]
    Configuration(String),

    #[error("Failed to download '{file}': {source}")]
    Fetch {
        file: String,
        #[source]
        source: StoreError,
    },

    #[error("Failed to decode '{file}': {source}")]
    Decode {
        file: String,
        #[source]
        source: Arc<DecodeFailure>,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Error, Debug)]
pub enum DecodeFailure {
    #[error("content is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("content is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl CacheError {
    pub fn decode(file: impl Into<String>, failure: impl Into<DecodeFailure>) -> Self {
        CacheError::Decode {
            file: file.into(),
            source: Arc::new(failure.into()),
        }
    }

    /// Stable label used in logs, statistics and HTTP error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            CacheError::Configuration(_) => "configuration",
            CacheError::Fetch { .. } => "fetch",
            CacheError::Decode { .. } => "decode",
            CacheError::Internal(_) => "internal",
        }
    }
}

pub type Result<T> = std::result::Result<T, CacheError>;
