//! The storage coordinator.
//!
//! [`ArtifactManager`] is the single entry point for storing, fetching and
//! deleting artifact content. It enforces repository policy, serializes
//! access per path, captures checksums while streaming, keeps download
//! counts and maintains the last-version tag of each identity group.

use std::fs::{self, File};
use std::io::{self, BufWriter, Read};
use std::sync::Arc;

use stowage_crypto::ChecksumCapture;
use stowage_types::{Repository, RepositoryPath, TypeError};
use tracing::debug;

use crate::config::{RepositoryRegistry, StoreConfig};
use crate::entry::ArtifactEntry;
use crate::error::{Operation, StoreError, StoreResult};
use crate::group::GroupResolver;
use crate::layout::StorageLayout;
use crate::lock::{path_key, LockRegistry, LockScope};
use crate::recorder::{EntryRecorder, PathChange, StoredContent};
use crate::stream::ArtifactStream;
use crate::tags::LastVersionTagger;
use crate::traits::EntryDirectory;

/// How removed content is disposed of.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Disposal {
    Trash,
    Permanent,
}

/// Coordinates store, fetch and delete over one storage root.
///
/// Safe to share across threads. Operations on one path are linearizable:
/// a store or delete holds the path exclusively, a fetch holds it shared
/// until its stream is dropped.
pub struct ArtifactManager {
    layout: StorageLayout,
    repositories: Arc<RepositoryRegistry>,
    entries: Arc<dyn EntryDirectory>,
    recorder: EntryRecorder,
    locks: LockRegistry,
}

impl ArtifactManager {
    pub fn new(
        layout: StorageLayout,
        repositories: Arc<RepositoryRegistry>,
        entries: Arc<dyn EntryDirectory>,
    ) -> Self {
        let locks = LockRegistry::new();
        let recorder = EntryRecorder::new(entries.clone(), locks.clone());
        Self {
            layout,
            repositories,
            entries,
            recorder,
            locks,
        }
    }

    pub fn from_config(config: &StoreConfig, entries: Arc<dyn EntryDirectory>) -> StoreResult<Self> {
        Ok(Self::new(
            config.layout(),
            Arc::new(RepositoryRegistry::from_config(config)?),
            entries,
        ))
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    pub fn repositories(&self) -> &Arc<RepositoryRegistry> {
        &self.repositories
    }

    pub fn entries(&self) -> &Arc<dyn EntryDirectory> {
        &self.entries
    }

    /// Store `content` at `path`, replacing any previous content.
    ///
    /// The bytes are streamed to a temporary file next to the target and
    /// renamed into place, so readers see either the old or the new
    /// content, never a mixture. Returns the number of bytes stored.
    pub fn store<R: Read>(&self, path: &RepositoryPath, content: &mut R) -> StoreResult<u64> {
        let repository = self.repositories.require(path.repository())?;
        if repository.is_group() {
            return Err(denied(&repository, Operation::Deploy, "group repositories are read-only"));
        }
        if !repository.policy.allows_deployment {
            return Err(denied(&repository, Operation::Deploy, "deployment is disabled"));
        }
        check_writable(path)?;

        let _guard = self.locks.write(LockScope::Path, &path_key(path));
        let target = self.layout.resolve(path);
        let redeploy = target.is_file();
        if redeploy && !repository.policy.allows_redeployment {
            return Err(denied(&repository, Operation::Redeploy, "artifact already exists"));
        }

        let dir = target
            .parent()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no parent"))?;
        fs::create_dir_all(dir)?;
        let staging = tempfile::Builder::new()
            .prefix(".stowage-")
            .suffix(".part")
            .tempfile_in(dir)?;

        let mut capture = ChecksumCapture::new(BufWriter::new(staging));
        let size = capture.copy_from(content)?;
        let (writer, checksums) = capture.finish()?;
        let staging = writer.into_inner().map_err(|e| e.into_error())?;
        staging.as_file().sync_all()?;
        staging.persist(&target).map_err(|e| e.error)?;

        let content = StoredContent {
            checksums,
            size,
            redeploy,
        };
        self.tagger().publish(path, PathChange::Stored(content))?;
        debug!(path = %path, size, redeploy, "stored artifact");
        Ok(size)
    }

    /// Open the content at `path` for reading.
    ///
    /// Paths in group repositories are first resolved to the first member
    /// holding the artifact; the stream reports the member path.
    pub fn fetch(&self, path: &RepositoryPath) -> StoreResult<ArtifactStream> {
        let resolved = self.resolve(path)?;
        let guard = self.locks.read(LockScope::Path, &path_key(&resolved));
        let file = match File::open(self.layout.resolve(&resolved)) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(path.clone()))
            }
            Err(e) => return Err(e.into()),
        };
        let metadata = file.metadata()?;
        if !metadata.is_file() {
            return Err(StoreError::NotFound(path.clone()));
        }
        debug!(path = %path, resolved = %resolved, "fetching artifact");
        Ok(ArtifactStream::new(
            file,
            resolved,
            metadata.len(),
            self.recorder.clone(),
            guard,
        ))
    }

    /// Delete the content at `path`.
    ///
    /// A non-forced delete in a repository with trash enabled moves the
    /// content to the trash; anything else removes it permanently.
    pub fn delete(&self, path: &RepositoryPath, force: bool) -> StoreResult<()> {
        let repository = self.repositories.require(path.repository())?;
        let operation = if force {
            Operation::ForceDelete
        } else {
            Operation::Delete
        };
        if repository.is_group() {
            return Err(denied(&repository, operation, "group repositories are read-only"));
        }
        if !repository.policy.allows_delete {
            return Err(denied(&repository, operation, "deletion is disabled"));
        }
        if force && !repository.policy.allows_force_deletion {
            return Err(denied(&repository, operation, "force deletion is disabled"));
        }

        let disposal = if !force && repository.policy.trash_enabled {
            Disposal::Trash
        } else {
            Disposal::Permanent
        };
        self.remove(path, disposal)
    }

    /// Permanently remove the content at `path`, bypassing delete policy.
    ///
    /// Meant for maintenance such as snapshot retention. Group repositories
    /// are still refused.
    pub fn purge(&self, path: &RepositoryPath) -> StoreResult<()> {
        let repository = self.repositories.require(path.repository())?;
        if repository.is_group() {
            return Err(denied(&repository, Operation::ForceDelete, "group repositories are read-only"));
        }
        self.remove(path, Disposal::Permanent)
    }

    /// Whether content exists at `path`, looking through group members.
    pub fn exists(&self, path: &RepositoryPath) -> StoreResult<bool> {
        match self.resolve(path) {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// The entry of `path`, looking through group members.
    pub fn entry(&self, path: &RepositoryPath) -> StoreResult<Option<ArtifactEntry>> {
        match self.resolve(path) {
            Ok(resolved) => self.recorder.find(&resolved),
            Err(StoreError::NotFound(_)) => self.recorder.find(path),
            Err(e) => Err(e),
        }
    }

    /// Map `path` to where its content lives.
    ///
    /// Plain repository paths resolve to themselves when the content
    /// exists; group paths resolve to the first member holding it.
    pub fn resolve(&self, path: &RepositoryPath) -> StoreResult<RepositoryPath> {
        let repository = self.repositories.require(path.repository())?;
        if repository.is_group() {
            return GroupResolver::new(&self.layout, &self.repositories).resolve(&repository, path);
        }
        if self.layout.is_file(path) {
            Ok(path.clone())
        } else {
            Err(StoreError::NotFound(path.clone()))
        }
    }

    fn remove(&self, path: &RepositoryPath, disposal: Disposal) -> StoreResult<()> {
        let _guard = self.locks.write(LockScope::Path, &path_key(path));
        let target = self.layout.resolve(path);
        if !target.is_file() {
            return Err(StoreError::NotFound(path.clone()));
        }

        match disposal {
            Disposal::Trash => {
                let trashed = self.layout.trash_path(path);
                if let Some(dir) = trashed.parent() {
                    fs::create_dir_all(dir)?;
                }
                fs::rename(&target, &trashed)?;
            }
            Disposal::Permanent => fs::remove_file(&target)?,
        }
        self.tagger().publish(path, PathChange::Removed)?;
        debug!(path = %path, ?disposal, "deleted artifact");
        Ok(())
    }

    fn tagger(&self) -> LastVersionTagger<'_> {
        LastVersionTagger::new(&self.layout, &self.recorder, &self.locks)
    }
}

fn denied(repository: &Repository, operation: Operation, reason: &str) -> StoreError {
    debug!(repository = %repository.key(), %operation, reason, "operation denied");
    StoreError::PolicyDenied {
        repository: repository.key(),
        operation,
        reason: reason.to_string(),
    }
}

fn check_writable(path: &RepositoryPath) -> Result<(), TypeError> {
    let invalid = |reason: &str| TypeError::InvalidPath {
        path: path.as_str().to_string(),
        reason: reason.to_string(),
    };
    if path.is_root() {
        return Err(invalid("cannot store at the repository root"));
    }
    if StorageLayout::is_reserved(path) {
        return Err(invalid("the trash area is reserved"));
    }
    Ok(())
}
