use std::sync::Arc;

use chrono::Utc;
use stowage_crypto::Checksums;
use stowage_types::RepositoryPath;
use tracing::debug;

use crate::entry::{ArtifactEntry, LAST_VERSION};
use crate::error::StoreResult;
use crate::lock::{path_key, LockRegistry, LockScope};
use crate::traits::{EntryDirectory, EntryWrite};

/// Content just written to a path.
#[derive(Clone, Debug)]
pub(crate) struct StoredContent {
    pub(crate) checksums: Checksums,
    pub(crate) size: u64,
    /// Whether the path held content before.
    pub(crate) redeploy: bool,
}

/// What happened to the path being published.
#[derive(Clone, Debug)]
pub(crate) enum PathChange {
    Stored(StoredContent),
    Removed,
    /// Nothing; only the identity group's tag is recomputed.
    Unchanged,
}

/// Serialized read-modify-write access to artifact entries.
///
/// Every mutation runs under the path's `Entry` lock, so concurrent
/// deploys, downloads and retags never lose each other's updates.
#[derive(Clone)]
pub(crate) struct EntryRecorder {
    entries: Arc<dyn EntryDirectory>,
    locks: LockRegistry,
}

impl EntryRecorder {
    pub(crate) fn new(entries: Arc<dyn EntryDirectory>, locks: LockRegistry) -> Self {
        Self { entries, locks }
    }

    pub(crate) fn find(&self, path: &RepositoryPath) -> StoreResult<Option<ArtifactEntry>> {
        self.entries
            .find_entry(path.storage_id(), path.repository_id(), path.as_str())
    }

    /// Count one completed download; returns the new count.
    pub(crate) fn record_download(&self, path: &RepositoryPath) -> StoreResult<u64> {
        let _guard = self.locks.write(LockScope::Entry, &path_key(path));
        let mut entry = self.find(path)?.unwrap_or_else(|| ArtifactEntry::new(path));
        entry.download_count += 1;
        self.entries.upsert_entry(&entry)?;
        Ok(entry.download_count)
    }

    /// Publish `change` to `subject` together with the last-version tag of
    /// its identity group.
    ///
    /// `siblings` are the group's stored members and `latest` the one that
    /// must carry the tag. The entries of the subject and of every sibling
    /// are locked in sorted order, and all resulting writes go to the
    /// directory as one batch. Siblings without an entry are left alone
    /// unless they are the new latest.
    pub(crate) fn publish(
        &self,
        subject: &RepositoryPath,
        change: PathChange,
        siblings: &[RepositoryPath],
        latest: Option<&RepositoryPath>,
    ) -> StoreResult<()> {
        let mut keys: Vec<String> = siblings
            .iter()
            .chain(std::iter::once(subject))
            .map(path_key)
            .collect();
        keys.sort();
        keys.dedup();
        let _guards: Vec<_> = keys
            .iter()
            .map(|key| self.locks.write(LockScope::Entry, key))
            .collect();

        let mut writes = Vec::new();
        let mut retagged = 0;
        for sibling in siblings {
            if sibling == subject && !matches!(change, PathChange::Unchanged) {
                continue;
            }
            let is_latest = latest == Some(sibling);
            let mut entry = match self.find(sibling)? {
                Some(entry) => entry,
                None if is_latest => ArtifactEntry::new(sibling),
                None => continue,
            };
            if set_last_version(&mut entry, is_latest) {
                retagged += 1;
                writes.push(EntryWrite::Upsert(entry));
            }
        }

        match change {
            PathChange::Stored(content) => {
                let entry = self.stored_entry(subject, content, latest == Some(subject))?;
                writes.push(EntryWrite::Upsert(entry));
            }
            PathChange::Removed => writes.push(EntryWrite::delete(subject)),
            PathChange::Unchanged => {}
        }

        if writes.is_empty() {
            return Ok(());
        }
        if retagged > 0 {
            debug!(
                retagged,
                latest = latest.map(|p| p.to_string()).unwrap_or_default(),
                "retagging last version"
            );
        }
        self.entries.apply_writes(&writes)
    }

    /// The entry recording `content` at `path`.
    ///
    /// An existing entry keeps its creation time and tags. A redeploy also
    /// keeps the download count; new content starts counting from zero.
    fn stored_entry(
        &self,
        path: &RepositoryPath,
        content: StoredContent,
        is_latest: bool,
    ) -> StoreResult<ArtifactEntry> {
        let mut entry = match self.find(path)? {
            Some(mut existing) => {
                if !content.redeploy {
                    existing.download_count = 0;
                }
                existing
            }
            None => ArtifactEntry::new(path),
        };
        entry.checksums = content.checksums;
        entry.size = content.size;
        entry.last_updated = Utc::now();
        set_last_version(&mut entry, is_latest);
        Ok(entry)
    }
}

/// Returns whether the tag changed.
fn set_last_version(entry: &mut ArtifactEntry, latest: bool) -> bool {
    if latest {
        entry.tags.insert(LAST_VERSION.to_string())
    } else {
        entry.tags.remove(LAST_VERSION)
    }
}
