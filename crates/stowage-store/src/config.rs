use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use stowage_types::{Repository, RepositoryKey, RepositoryKind, RepositoryPolicy};

use crate::error::{StoreError, StoreResult};
use crate::layout::StorageLayout;

/// Storage configuration, usually loaded from TOML.
///
/// ```toml
/// root = "/var/lib/stowage"
///
/// [[storages]]
/// id = "storage0"
///
/// [[storages.repositories]]
/// id = "releases"
/// policy = { allows_redeployment = false }
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreConfig {
    pub root: PathBuf,
    #[serde(default)]
    pub storages: Vec<StorageConfig>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            storages: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    pub id: String,
    #[serde(default)]
    pub repositories: Vec<RepositoryConfig>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RepositoryConfig {
    pub id: String,
    #[serde(default)]
    pub policy: RepositoryPolicy,
    #[serde(default)]
    pub kind: RepositoryKind,
}

impl StoreConfig {
    pub fn from_toml_str(s: &str) -> StoreResult<Self> {
        toml::from_str(s).map_err(|e| StoreError::Config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> StoreResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    pub fn layout(&self) -> StorageLayout {
        StorageLayout::new(&self.root)
    }

    /// Every configured repository with its storage id filled in.
    pub fn repositories(&self) -> Vec<Repository> {
        self.storages
            .iter()
            .flat_map(|storage| {
                storage.repositories.iter().map(move |repo| Repository {
                    storage_id: storage.id.clone(),
                    id: repo.id.clone(),
                    policy: repo.policy,
                    kind: repo.kind.clone(),
                })
            })
            .collect()
    }
}

/// Live repository definitions, looked up on every operation.
#[derive(Debug, Default)]
pub struct RepositoryRegistry {
    repositories: RwLock<HashMap<RepositoryKey, Repository>>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &StoreConfig) -> StoreResult<Self> {
        let registry = Self::new();
        for repository in config.repositories() {
            registry.insert(repository)?;
        }
        Ok(registry)
    }

    /// Add or replace a repository definition.
    pub fn insert(&self, repository: Repository) -> StoreResult<()> {
        let mut repos = self.repositories.write().map_err(poisoned)?;
        repos.insert(repository.key(), repository);
        Ok(())
    }

    pub fn remove(&self, key: &RepositoryKey) -> StoreResult<Option<Repository>> {
        let mut repos = self.repositories.write().map_err(poisoned)?;
        Ok(repos.remove(key))
    }

    pub fn get(&self, key: &RepositoryKey) -> StoreResult<Option<Repository>> {
        let repos = self.repositories.read().map_err(poisoned)?;
        Ok(repos.get(key).cloned())
    }

    /// Like [`get`](Self::get), but a missing repository is an error.
    pub fn require(&self, key: &RepositoryKey) -> StoreResult<Repository> {
        self.get(key)?
            .ok_or_else(|| StoreError::RepositoryNotFound(key.clone()))
    }

    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.repositories.read().map_err(poisoned)?.len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }
}

fn poisoned<T>(e: std::sync::PoisonError<T>) -> StoreError {
    StoreError::Registry(format!("lock poisoned: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        root = "/var/lib/stowage"

        [[storages]]
        id = "storage0"

        [[storages.repositories]]
        id = "releases"
        policy = { allows_redeployment = false, trash_enabled = true }

        [[storages.repositories]]
        id = "snapshots"

        [[storages.repositories]]
        id = "public"

        [storages.repositories.kind]
        type = "group"
        members = [
            { storage_id = "storage0", repository_id = "releases" },
            { storage_id = "storage0", repository_id = "snapshots" },
        ]
    "#;

    #[test]
    fn default_config() {
        let c = StoreConfig::default();
        assert_eq!(c.root, PathBuf::from("."));
        assert!(c.repositories().is_empty());
    }

    #[test]
    fn parses_storages_and_repositories() {
        let config = StoreConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.root, PathBuf::from("/var/lib/stowage"));
        let repos = config.repositories();
        assert_eq!(repos.len(), 3);
        assert!(repos.iter().all(|r| r.storage_id == "storage0"));

        let releases = &repos[0];
        assert!(!releases.policy.allows_redeployment);
        assert!(releases.policy.trash_enabled);
        assert!(releases.policy.allows_deployment);

        let public = &repos[2];
        assert!(public.is_group());
        assert_eq!(public.members()[1].repository_id, "snapshots");
    }

    #[test]
    fn malformed_toml_is_config_error() {
        let err = StoreConfig::from_toml_str("root = [").unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("stowage.toml");
        std::fs::write(&file, SAMPLE).unwrap();
        let config = StoreConfig::load(&file).unwrap();
        assert_eq!(config.storages.len(), 1);
    }

    #[test]
    fn registry_lookup() {
        let config = StoreConfig::from_toml_str(SAMPLE).unwrap();
        let registry = RepositoryRegistry::from_config(&config).unwrap();
        assert_eq!(registry.len().unwrap(), 3);

        let key = RepositoryKey::new("storage0", "releases");
        assert_eq!(registry.require(&key).unwrap().id, "releases");

        let missing = RepositoryKey::new("storage0", "nope");
        assert!(matches!(
            registry.require(&missing),
            Err(StoreError::RepositoryNotFound(_))
        ));

        assert!(registry.remove(&key).unwrap().is_some());
        assert!(registry.get(&key).unwrap().is_none());
    }

    #[test]
    fn poisoned_registry_reports_errors() {
        let registry = RepositoryRegistry::new();
        registry
            .insert(Repository::new("storage0", "releases"))
            .unwrap();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _repos = registry.repositories.write().unwrap();
            panic!("writer died");
        }));
        assert!(result.is_err());

        let key = RepositoryKey::new("storage0", "releases");
        assert!(matches!(
            registry.insert(Repository::new("storage0", "snapshots")),
            Err(StoreError::Registry(_))
        ));
        assert!(matches!(registry.get(&key), Err(StoreError::Registry(_))));
        assert!(matches!(registry.require(&key), Err(StoreError::Registry(_))));
        assert!(matches!(registry.remove(&key), Err(StoreError::Registry(_))));
        assert!(matches!(registry.len(), Err(StoreError::Registry(_))));
    }
}
