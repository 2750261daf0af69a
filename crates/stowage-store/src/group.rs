use std::collections::HashSet;

use stowage_types::{Repository, RepositoryKey, RepositoryKind, RepositoryPath};
use tracing::{debug, warn};

use crate::config::RepositoryRegistry;
use crate::error::{StoreError, StoreResult};
use crate::layout::StorageLayout;

/// Maps a path in a group repository to the first member holding it.
///
/// Members are searched in declared order. Nested groups are searched
/// depth-first; a group reached twice is skipped, so cyclic membership
/// terminates.
pub struct GroupResolver<'a> {
    layout: &'a StorageLayout,
    repositories: &'a RepositoryRegistry,
}

impl<'a> GroupResolver<'a> {
    pub fn new(layout: &'a StorageLayout, repositories: &'a RepositoryRegistry) -> Self {
        Self {
            layout,
            repositories,
        }
    }

    /// Resolve `path` against `group`, returning the member-qualified path.
    pub fn resolve(&self, group: &Repository, path: &RepositoryPath) -> StoreResult<RepositoryPath> {
        let mut visited = HashSet::new();
        match self.search(group, path, &mut visited)? {
            Some(found) => {
                debug!(path = %path, resolved = %found, "resolved group path");
                Ok(found)
            }
            None => Err(StoreError::NotFound(path.clone())),
        }
    }

    fn search(
        &self,
        repository: &Repository,
        path: &RepositoryPath,
        visited: &mut HashSet<RepositoryKey>,
    ) -> StoreResult<Option<RepositoryPath>> {
        if !visited.insert(repository.key()) {
            return Ok(None);
        }
        let members = match &repository.kind {
            RepositoryKind::Plain => {
                let candidate = path.with_repository(repository.key());
                return Ok(self.layout.is_file(&candidate).then_some(candidate));
            }
            RepositoryKind::Group { members } => members,
        };
        for key in members {
            let Some(member) = self.repositories.get(key)? else {
                warn!(group = %repository.key(), member = %key, "group member is not configured");
                continue;
            };
            if let Some(found) = self.search(&member, path, visited)? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn key(id: &str) -> RepositoryKey {
        RepositoryKey::new("storage0", id)
    }

    fn put(layout: &StorageLayout, repo: &str, path: &str, content: &[u8]) {
        let target = layout.resolve(&RepositoryPath::new(key(repo), path).unwrap());
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(target, content).unwrap();
    }

    fn setup() -> (tempfile::TempDir, StorageLayout, RepositoryRegistry) {
        let dir = tempfile::tempdir().unwrap();
        let layout = StorageLayout::new(dir.path());
        let registry = RepositoryRegistry::new();
        registry.insert(Repository::new("storage0", "releases")).unwrap();
        registry.insert(Repository::new("storage0", "snapshots")).unwrap();
        registry.insert(Repository::group(
            "storage0",
            "public",
            vec![key("releases"), key("snapshots")],
        ))
        .unwrap();
        (dir, layout, registry)
    }

    const JAR: &str = "org/example/widget/1.0/widget-1.0.jar";

    #[test]
    fn first_member_wins() {
        let (_dir, layout, registry) = setup();
        put(&layout, "releases", JAR, b"from releases");
        put(&layout, "snapshots", JAR, b"from snapshots");

        let group = registry.get(&key("public")).unwrap().unwrap();
        let path = RepositoryPath::new(key("public"), JAR).unwrap();
        let found = GroupResolver::new(&layout, &registry).resolve(&group, &path).unwrap();
        assert_eq!(found.repository_id(), "releases");
        assert_eq!(found.as_str(), JAR);
    }

    #[test]
    fn falls_through_to_later_members() {
        let (_dir, layout, registry) = setup();
        put(&layout, "snapshots", JAR, b"from snapshots");

        let group = registry.get(&key("public")).unwrap().unwrap();
        let path = RepositoryPath::new(key("public"), JAR).unwrap();
        let found = GroupResolver::new(&layout, &registry).resolve(&group, &path).unwrap();
        assert_eq!(found.repository_id(), "snapshots");
    }

    #[test]
    fn missing_everywhere_is_not_found() {
        let (_dir, layout, registry) = setup();
        let group = registry.get(&key("public")).unwrap().unwrap();
        let path = RepositoryPath::new(key("public"), JAR).unwrap();
        let err = GroupResolver::new(&layout, &registry)
            .resolve(&group, &path)
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn nested_and_cyclic_groups() {
        let (_dir, layout, registry) = setup();
        registry.insert(Repository::group(
            "storage0",
            "outer",
            vec![key("inner"), key("missing")],
        ))
        .unwrap();
        registry.insert(Repository::group(
            "storage0",
            "inner",
            vec![key("outer"), key("public")],
        ))
        .unwrap();
        put(&layout, "snapshots", JAR, b"x");

        let outer = registry.get(&key("outer")).unwrap().unwrap();
        let path = RepositoryPath::new(key("outer"), JAR).unwrap();
        let found = GroupResolver::new(&layout, &registry).resolve(&outer, &path).unwrap();
        assert_eq!(found.repository_id(), "snapshots");

        let other = RepositoryPath::new(key("outer"), "org/none/1/none-1.jar").unwrap();
        assert!(GroupResolver::new(&layout, &registry)
            .resolve(&outer, &other)
            .is_err());
    }
}
