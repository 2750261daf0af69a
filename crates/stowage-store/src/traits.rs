use stowage_types::RepositoryPath;

use crate::entry::ArtifactEntry;
use crate::error::StoreResult;

/// One write in an [`EntryDirectory::apply_writes`] batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntryWrite {
    /// Create or replace an entry.
    Upsert(ArtifactEntry),
    /// Remove the entry at `(storage_id, repository_id, path)` if present.
    Delete {
        storage_id: String,
        repository_id: String,
        path: String,
    },
}

impl EntryWrite {
    pub fn delete(path: &RepositoryPath) -> Self {
        EntryWrite::Delete {
            storage_id: path.storage_id().to_string(),
            repository_id: path.repository_id().to_string(),
            path: path.as_str().to_string(),
        }
    }
}

/// Persistence boundary for artifact entries.
///
/// Entries are keyed by `(storage_id, repository_id, path)`. Implementations
/// must be thread-safe; the storage core serializes mutations of any single
/// entry itself, so a backend only needs each call to be atomic on its own.
pub trait EntryDirectory: Send + Sync {
    /// Look up the entry for a path. Returns `Ok(None)` if there is none.
    fn find_entry(
        &self,
        storage_id: &str,
        repository_id: &str,
        path: &str,
    ) -> StoreResult<Option<ArtifactEntry>>;

    /// Create or replace an entry.
    fn upsert_entry(&self, entry: &ArtifactEntry) -> StoreResult<()>;

    /// Remove an entry. Returns `true` if it existed.
    fn delete_entry(&self, storage_id: &str, repository_id: &str, path: &str)
        -> StoreResult<bool>;

    /// Apply several upserts and deletes in order.
    ///
    /// Every store and delete of an artifact publishes its entry change
    /// together with the last-version retag of its identity group through
    /// this call. Backends that can apply the batch atomically should
    /// override the default, which writes one entry at a time; otherwise
    /// readers may briefly observe a group with zero or two tagged entries.
    fn apply_writes(&self, writes: &[EntryWrite]) -> StoreResult<()> {
        for write in writes {
            match write {
                EntryWrite::Upsert(entry) => self.upsert_entry(entry)?,
                EntryWrite::Delete {
                    storage_id,
                    repository_id,
                    path,
                } => {
                    self.delete_entry(storage_id, repository_id, path)?;
                }
            }
        }
        Ok(())
    }
}
