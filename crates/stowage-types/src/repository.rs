use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a repository: the storage it lives in plus its id.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepositoryKey {
    pub storage_id: String,
    pub repository_id: String,
}

impl RepositoryKey {
    pub fn new(storage_id: impl Into<String>, repository_id: impl Into<String>) -> Self {
        Self {
            storage_id: storage_id.into(),
            repository_id: repository_id.into(),
        }
    }
}

impl fmt::Display for RepositoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.storage_id, self.repository_id)
    }
}

/// Mutation policy of a repository, read before every store and delete.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryPolicy {
    /// New artifacts may be stored.
    pub allows_deployment: bool,
    /// Existing artifacts may be overwritten.
    pub allows_redeployment: bool,
    /// Artifacts may be deleted.
    pub allows_delete: bool,
    /// Deletes may bypass the trash.
    pub allows_force_deletion: bool,
    /// Non-forced deletes move content into the repository trash.
    pub trash_enabled: bool,
}

impl Default for RepositoryPolicy {
    fn default() -> Self {
        Self {
            allows_deployment: true,
            allows_redeployment: true,
            allows_delete: true,
            allows_force_deletion: false,
            trash_enabled: false,
        }
    }
}

impl RepositoryPolicy {
    /// Everything allowed, trash disabled.
    pub fn permissive() -> Self {
        Self {
            allows_force_deletion: true,
            ..Default::default()
        }
    }

    /// No deployment, redeployment or deletion.
    pub fn read_only() -> Self {
        Self {
            allows_deployment: false,
            allows_redeployment: false,
            allows_delete: false,
            allows_force_deletion: false,
            trash_enabled: false,
        }
    }
}

/// Plain repositories hold content; groups aggregate other repositories.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RepositoryKind {
    #[default]
    Plain,
    /// Read-only view over `members`, searched in declared order.
    Group { members: Vec<RepositoryKey> },
}

/// A repository as seen by the storage core.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub storage_id: String,
    pub id: String,
    #[serde(default)]
    pub policy: RepositoryPolicy,
    #[serde(default)]
    pub kind: RepositoryKind,
}

impl Repository {
    /// A plain repository with the default policy.
    pub fn new(storage_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            storage_id: storage_id.into(),
            id: id.into(),
            policy: RepositoryPolicy::default(),
            kind: RepositoryKind::Plain,
        }
    }

    /// A group repository over `members`.
    pub fn group(
        storage_id: impl Into<String>,
        id: impl Into<String>,
        members: Vec<RepositoryKey>,
    ) -> Self {
        Self {
            kind: RepositoryKind::Group { members },
            ..Self::new(storage_id, id)
        }
    }

    pub fn with_policy(mut self, policy: RepositoryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn key(&self) -> RepositoryKey {
        RepositoryKey::new(&self.storage_id, &self.id)
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, RepositoryKind::Group { .. })
    }

    /// Group members in priority order; empty for plain repositories.
    pub fn members(&self) -> &[RepositoryKey] {
        match &self.kind {
            RepositoryKind::Plain => &[],
            RepositoryKind::Group { members } => members,
        }
    }
}
