use std::fmt;

use serde::{Deserialize, Serialize};

use crate::coordinate::ArtifactCoordinate;
use crate::error::TypeError;
use crate::repository::RepositoryKey;

/// A path relative to a repository root.
///
/// Always `/`-separated, without leading or trailing slash, and free of
/// empty, `.` and `..` segments. The empty path is the repository root.
/// Carries the owning repository's identity, never a file handle.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepositoryPath {
    repository: RepositoryKey,
    path: String,
}

impl RepositoryPath {
    /// Validate and normalize `path` within `repository`.
    pub fn new(repository: RepositoryKey, path: impl AsRef<str>) -> Result<Self, TypeError> {
        let raw = path.as_ref();
        let trimmed = raw.trim_start_matches('/').trim_end_matches('/');
        if !trimmed.is_empty() {
            validate(raw, trimmed)?;
        }
        Ok(Self {
            repository,
            path: trimmed.to_string(),
        })
    }

    /// The root of `repository`.
    pub fn root(repository: RepositoryKey) -> Self {
        Self {
            repository,
            path: String::new(),
        }
    }

    /// The path of `coordinate` within `repository`.
    pub fn of_coordinate(
        repository: RepositoryKey,
        coordinate: &ArtifactCoordinate,
    ) -> Result<Self, TypeError> {
        Self::new(repository, coordinate.to_path())
    }

    pub fn repository(&self) -> &RepositoryKey {
        &self.repository
    }

    pub fn storage_id(&self) -> &str {
        &self.repository.storage_id
    }

    pub fn repository_id(&self) -> &str {
        &self.repository.repository_id
    }

    /// The relative path string.
    pub fn as_str(&self) -> &str {
        &self.path
    }

    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    /// Append `child` (which may itself contain `/`).
    pub fn resolve(&self, child: &str) -> Result<Self, TypeError> {
        if self.is_root() {
            return Self::new(self.repository.clone(), child);
        }
        Self::new(self.repository.clone(), format!("{}/{}", self.path, child))
    }

    /// A sibling of this path named `name`.
    pub fn resolve_sibling(&self, name: &str) -> Result<Self, TypeError> {
        match self.parent() {
            Some(parent) => parent.resolve(name),
            None => Self::new(self.repository.clone(), name),
        }
    }

    /// The parent directory, or `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        let parent = self.path.rsplit_once('/').map(|(p, _)| p).unwrap_or("");
        Some(Self {
            repository: self.repository.clone(),
            path: parent.to_string(),
        })
    }

    /// The final segment, or `None` at the root.
    pub fn file_name(&self) -> Option<&str> {
        if self.is_root() {
            return None;
        }
        Some(self.path.rsplit('/').next().unwrap_or(&self.path))
    }

    /// The same relative path inside another repository.
    pub fn with_repository(&self, repository: RepositoryKey) -> Self {
        Self {
            repository,
            path: self.path.clone(),
        }
    }

    /// The artifact coordinate this path encodes, if it is an artifact.
    pub fn coordinate(&self) -> Option<ArtifactCoordinate> {
        ArtifactCoordinate::from_path(&self.path)
    }
}

impl fmt::Display for RepositoryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.repository, self.path)
    }
}

fn validate(raw: &str, trimmed: &str) -> Result<(), TypeError> {
    let invalid = |reason: &str| TypeError::InvalidPath {
        path: raw.to_string(),
        reason: reason.to_string(),
    };
    if trimmed.contains('\\') {
        return Err(invalid("backslash is not a path separator"));
    }
    if trimmed.contains('\0') {
        return Err(invalid("contains NUL"));
    }
    for segment in trimmed.split('/') {
        match segment {
            "" => return Err(invalid("empty path segment")),
            "." | ".." => return Err(invalid("relative path segment")),
            _ => {}
        }
    }
    Ok(())
}
