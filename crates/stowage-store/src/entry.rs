use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stowage_crypto::Checksums;
use stowage_types::{RepositoryKey, RepositoryPath, TypeError};

/// Tag carried by the highest stored version of an identity group.
pub const LAST_VERSION: &str = "last-version";

/// Metadata record of one stored artifact.
///
/// Owned by the [`EntryDirectory`](crate::EntryDirectory); the storage core
/// only creates, updates and retires it in response to store, fetch and
/// delete.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactEntry {
    pub storage_id: String,
    pub repository_id: String,
    pub path: String,
    /// Completed fetches since first deployment.
    pub download_count: u64,
    /// Algorithm name -> hex digest of the stored bytes.
    pub checksums: Checksums,
    pub tags: BTreeSet<String>,
    /// Size of the stored content in bytes.
    pub size: u64,
    pub created: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl ArtifactEntry {
    /// A fresh entry for `path` with no downloads, checksums or tags.
    pub fn new(path: &RepositoryPath) -> Self {
        let now = Utc::now();
        Self {
            storage_id: path.storage_id().to_string(),
            repository_id: path.repository_id().to_string(),
            path: path.as_str().to_string(),
            download_count: 0,
            checksums: Checksums::new(),
            tags: BTreeSet::new(),
            size: 0,
            created: now,
            last_updated: now,
        }
    }

    pub fn repository_path(&self) -> Result<RepositoryPath, TypeError> {
        RepositoryPath::new(
            RepositoryKey::new(&self.storage_id, &self.repository_id),
            &self.path,
        )
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn is_last_version(&self) -> bool {
        self.has_tag(LAST_VERSION)
    }
}
