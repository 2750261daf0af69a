use stowage_store::StoreError;
use stowage_types::TypeError;

/// Errors from reading or writing versioning metadata.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("metadata serialization error: {0}")]
    Serialization(String),

    #[error("invalid metadata path: {0}")]
    InvalidPath(#[from] TypeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for MetadataError {
    fn from(e: serde_json::Error) -> Self {
        MetadataError::Serialization(e.to_string())
    }
}

/// Result alias for metadata operations.
pub type MetadataResult<T> = Result<T, MetadataError>;

/// Errors that abort a retention pass.
///
/// Failures removing individual builds do not abort a pass; they are
/// collected in the [`RetentionReport`](crate::RetentionReport).
#[derive(Debug, thiserror::Error)]
pub enum RetentionError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("invalid path: {0}")]
    InvalidPath(#[from] TypeError),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result alias for retention operations.
pub type RetentionResult<T> = Result<T, RetentionError>;
