use std::path::{Path, PathBuf};

use stowage_types::{RepositoryKey, RepositoryPath};

/// Directory under each repository root that receives trashed content.
pub const TRASH_DIR: &str = ".trash";

/// Maps repository paths onto the filesystem.
///
/// Content of repository `s:r` lives under `<root>/s/r/`; trashed content
/// under `<root>/s/r/.trash/` at the same relative path.
#[derive(Clone, Debug)]
pub struct StorageLayout {
    root: PathBuf,
}

impl StorageLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn repository_dir(&self, repository: &RepositoryKey) -> PathBuf {
        self.root
            .join(&repository.storage_id)
            .join(&repository.repository_id)
    }

    /// Filesystem location of `path`.
    pub fn resolve(&self, path: &RepositoryPath) -> PathBuf {
        join_segments(self.repository_dir(path.repository()), path.as_str())
    }

    /// Where a trashed `path` is kept.
    pub fn trash_path(&self, path: &RepositoryPath) -> PathBuf {
        join_segments(
            self.repository_dir(path.repository()).join(TRASH_DIR),
            path.as_str(),
        )
    }

    /// True if `path` is in the reserved trash area.
    pub fn is_reserved(path: &RepositoryPath) -> bool {
        path.as_str().split('/').next() == Some(TRASH_DIR)
    }

    pub fn is_file(&self, path: &RepositoryPath) -> bool {
        self.resolve(path).is_file()
    }
}

fn join_segments(mut base: PathBuf, relative: &str) -> PathBuf {
    for segment in relative.split('/').filter(|s| !s.is_empty()) {
        base.push(segment);
    }
    base
}
