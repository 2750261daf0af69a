use std::cmp::Ordering;
use std::fs;
use std::io;

use stowage_types::{compare_versions, ArtifactCoordinate, ArtifactIdentity, RepositoryPath};

use crate::error::StoreResult;
use crate::layout::StorageLayout;
use crate::lock::{identity_key, LockRegistry, LockScope};
use crate::recorder::{EntryRecorder, PathChange};

/// Keeps exactly one `last-version` tag per identity group.
///
/// An identity group is every stored artifact of one repository sharing
/// group id, artifact id and classifier. The tag belongs to the member
/// with the highest version; members with equal versions (a jar and its
/// pom, say) are ordered by path and the smallest path wins.
pub(crate) struct LastVersionTagger<'a> {
    layout: &'a StorageLayout,
    recorder: &'a EntryRecorder,
    locks: &'a LockRegistry,
}

impl<'a> LastVersionTagger<'a> {
    pub(crate) fn new(
        layout: &'a StorageLayout,
        recorder: &'a EntryRecorder,
        locks: &'a LockRegistry,
    ) -> Self {
        Self {
            layout,
            recorder,
            locks,
        }
    }

    /// Publish `change` to `path` and recompute the tag of the identity
    /// group `path` belongs to, all under the group's `Identity` lock.
    ///
    /// The caller has already changed the content on disk and still holds
    /// the path. Paths that are not artifacts have no group; only their own
    /// entry is written.
    pub(crate) fn publish(&self, path: &RepositoryPath, change: PathChange) -> StoreResult<()> {
        let Some(coordinate) = path.coordinate() else {
            return self.recorder.publish(path, change, &[], None);
        };
        let identity = coordinate.identity();
        let _guard = self.locks.write(
            LockScope::Identity,
            &identity_key(path.repository(), &identity),
        );

        let artifact_dir = RepositoryPath::new(
            path.repository().clone(),
            coordinate.artifact_directory(),
        )?;
        let members = self.members(&artifact_dir, &identity)?;
        let latest = members
            .iter()
            .max_by(|a, b| newer(a, b))
            .map(|(path, _)| path.clone());
        let paths: Vec<RepositoryPath> = members.into_iter().map(|(p, _)| p).collect();
        self.recorder.publish(path, change, &paths, latest.as_ref())
    }

    /// Stored artifacts of `identity` under its artifact directory.
    fn members(
        &self,
        artifact_dir: &RepositoryPath,
        identity: &ArtifactIdentity,
    ) -> StoreResult<Vec<(RepositoryPath, ArtifactCoordinate)>> {
        let mut members = Vec::new();
        let Some(versions) = read_dir_if_exists(&self.layout.resolve(artifact_dir))? else {
            return Ok(members);
        };
        for version in versions {
            let version = version?;
            if !version.file_type()?.is_dir() {
                continue;
            }
            let Some(version_name) = version.file_name().to_str().map(str::to_string) else {
                continue;
            };
            let Some(files) = read_dir_if_exists(&version.path())? else {
                continue;
            };
            for file in files {
                let file = file?;
                if !file.file_type()?.is_file() {
                    continue;
                }
                let Some(file_name) = file.file_name().to_str().map(str::to_string) else {
                    continue;
                };
                let relative = format!("{}/{}/{}", artifact_dir.as_str(), version_name, file_name);
                let Some(coordinate) = ArtifactCoordinate::from_path(&relative) else {
                    continue;
                };
                if coordinate.identity() == *identity {
                    let path = RepositoryPath::new(artifact_dir.repository().clone(), relative)?;
                    members.push((path, coordinate));
                }
            }
        }
        Ok(members)
    }
}

/// Order by version, then by reversed path so the smallest path is maximal.
fn newer(
    a: &(RepositoryPath, ArtifactCoordinate),
    b: &(RepositoryPath, ArtifactCoordinate),
) -> Ordering {
    compare_versions(&a.1.version, &b.1.version).then_with(|| b.0.cmp(&a.0))
}

fn read_dir_if_exists(dir: &std::path::Path) -> io::Result<Option<fs::ReadDir>> {
    match fs::read_dir(dir) {
        Ok(entries) => Ok(Some(entries)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}
