use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid repository path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("invalid snapshot timestamp {timestamp:?}: {reason}")]
    InvalidTimestamp { timestamp: String, reason: String },
}
