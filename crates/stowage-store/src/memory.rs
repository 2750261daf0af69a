//! In-memory entry directory for tests and ephemeral use.
//!
//! [`InMemoryEntryDirectory`] keeps every entry in a `HashMap` behind a
//! single `RwLock`, so a batch of writes is applied atomically.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::entry::ArtifactEntry;
use crate::error::{StoreError, StoreResult};
use crate::traits::{EntryDirectory, EntryWrite};

type EntryKey = (String, String, String);

/// An in-memory implementation of [`EntryDirectory`].
#[derive(Debug)]
pub struct InMemoryEntryDirectory {
    entries: RwLock<HashMap<EntryKey, ArtifactEntry>>,
}

impl InMemoryEntryDirectory {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of entries across all repositories.
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.entries.read().map_err(poisoned)?.len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Every entry of one repository, ordered by path.
    pub fn entries_in(&self, storage_id: &str, repository_id: &str) -> StoreResult<Vec<ArtifactEntry>> {
        let entries = self.entries.read().map_err(poisoned)?;
        let mut found: Vec<ArtifactEntry> = entries
            .values()
            .filter(|e| e.storage_id == storage_id && e.repository_id == repository_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(found)
    }
}

impl Default for InMemoryEntryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

fn key_of(entry: &ArtifactEntry) -> EntryKey {
    (
        entry.storage_id.clone(),
        entry.repository_id.clone(),
        entry.path.clone(),
    )
}

fn poisoned<T>(e: std::sync::PoisonError<T>) -> StoreError {
    StoreError::EntryDirectory(format!("lock poisoned: {e}"))
}

impl EntryDirectory for InMemoryEntryDirectory {
    fn find_entry(
        &self,
        storage_id: &str,
        repository_id: &str,
        path: &str,
    ) -> StoreResult<Option<ArtifactEntry>> {
        let entries = self.entries.read().map_err(poisoned)?;
        let key = (storage_id.to_string(), repository_id.to_string(), path.to_string());
        Ok(entries.get(&key).cloned())
    }

    fn upsert_entry(&self, entry: &ArtifactEntry) -> StoreResult<()> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.insert(key_of(entry), entry.clone());
        Ok(())
    }

    fn delete_entry(&self, storage_id: &str, repository_id: &str, path: &str) -> StoreResult<bool> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        let key = (storage_id.to_string(), repository_id.to_string(), path.to_string());
        Ok(entries.remove(&key).is_some())
    }

    fn apply_writes(&self, writes: &[EntryWrite]) -> StoreResult<()> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        for write in writes {
            match write {
                EntryWrite::Upsert(entry) => {
                    entries.insert(key_of(entry), entry.clone());
                }
                EntryWrite::Delete {
                    storage_id,
                    repository_id,
                    path,
                } => {
                    entries.remove(&(storage_id.clone(), repository_id.clone(), path.clone()));
                }
            }
        }
        Ok(())
    }
}
