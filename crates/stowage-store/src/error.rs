use std::fmt;

use stowage_types::{RepositoryKey, RepositoryPath, TypeError};

/// A mutation that repository policy can forbid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Deploy,
    Redeploy,
    Delete,
    ForceDelete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Deploy => "deployment",
            Operation::Redeploy => "redeployment",
            Operation::Delete => "delete",
            Operation::ForceDelete => "force delete",
        })
    }
}

/// Errors from artifact storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Repository policy forbids the requested mutation.
    #[error("{operation} denied on repository {repository}: {reason}")]
    PolicyDenied {
        repository: RepositoryKey,
        operation: Operation,
        reason: String,
    },

    /// No artifact exists at the path.
    #[error("artifact not found: {0}")]
    NotFound(RepositoryPath),

    /// The path names a repository that is not configured.
    #[error("repository not found: {0}")]
    RepositoryNotFound(RepositoryKey),

    /// The path is malformed or reserved.
    #[error("invalid path: {0}")]
    InvalidPath(#[from] TypeError),

    /// The entry directory backend failed.
    #[error("entry directory error: {0}")]
    EntryDirectory(String),

    /// The repository registry is unusable.
    #[error("repository registry error: {0}")]
    Registry(String),

    /// Configuration could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error from the backing filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn is_policy_denied(&self) -> bool {
        matches!(self, StoreError::PolicyDenied { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
