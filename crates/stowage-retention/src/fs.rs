//! Filesystem metadata manager.
//!
//! Documents are stored as `maven-metadata.json` inside the directory they
//! describe and replaced atomically on every write.

use std::cmp::Ordering;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use stowage_store::StorageLayout;
use stowage_types::{
    compare_versions, directory_identity, is_snapshot, ArtifactCoordinate, RepositoryPath,
    SnapshotBuild,
};
use tracing::debug;

use crate::error::MetadataResult;
use crate::metadata::{
    Metadata, Snapshot, SnapshotVersion, Versioning, LAST_UPDATED_FORMAT, METADATA_FILE,
};
use crate::traits::MetadataManager;

/// [`MetadataManager`] over a storage root.
#[derive(Clone, Debug)]
pub struct FsMetadataManager {
    layout: StorageLayout,
}

impl FsMetadataManager {
    pub fn new(layout: StorageLayout) -> Self {
        Self { layout }
    }

    /// Location of the metadata document of directory `path`.
    pub fn metadata_file(&self, path: &RepositoryPath) -> PathBuf {
        self.layout.resolve(path).join(METADATA_FILE)
    }

    /// Replace the metadata document of directory `path`.
    pub fn write_metadata(&self, path: &RepositoryPath, metadata: &Metadata) -> MetadataResult<()> {
        let target = self.metadata_file(path);
        let dir = target
            .parent()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "metadata file has no parent"))?;
        fs::create_dir_all(dir)?;

        let mut staging = tempfile::Builder::new()
            .prefix(".stowage-")
            .suffix(".part")
            .tempfile_in(dir)?;
        serde_json::to_writer_pretty(&mut staging, metadata)?;
        staging.flush()?;
        staging.persist(&target).map_err(|e| e.error)?;
        debug!(path = %path, "wrote metadata");
        Ok(())
    }

    /// Regenerate the version list of the artifact directory `base_path`.
    ///
    /// Every version directory holding at least one artifact file of the
    /// artifact is listed, in ascending version order. `latest` is the
    /// highest version and `release` the highest non-snapshot version.
    pub fn rebuild_artifact_metadata(&self, base_path: &RepositoryPath) -> MetadataResult<Metadata> {
        let (group_id, artifact_id) = directory_identity(base_path.as_str());
        let mut versions = Vec::new();
        for version_dir in subdirectories(&self.layout.resolve(base_path))? {
            let version_path = base_path.resolve(&version_dir)?;
            let holds_artifact = self
                .artifacts_in(&version_path)?
                .iter()
                .any(|c| c.artifact_id == artifact_id);
            if holds_artifact {
                versions.push(version_dir);
            }
        }
        versions.sort_by(|a, b| compare_versions(a, b));

        let metadata = Metadata {
            group_id,
            artifact_id,
            version: None,
            versioning: Some(Versioning {
                latest: versions.last().cloned(),
                release: versions.iter().rev().find(|v| !is_snapshot(v)).cloned(),
                versions,
                last_updated: Some(now_stamp()),
                ..Default::default()
            }),
        };
        self.write_metadata(base_path, &metadata)?;
        Ok(metadata)
    }

    /// Coordinates of the artifact files directly inside `dir`.
    fn artifacts_in(&self, dir: &RepositoryPath) -> MetadataResult<Vec<ArtifactCoordinate>> {
        let mut found = Vec::new();
        let entries = match fs::read_dir(self.layout.resolve(dir)) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(found),
            Err(e) => return Err(e.into()),
        };
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if let Some(coordinate) = ArtifactCoordinate::from_path(&format!("{}/{name}", dir.as_str())) {
                found.push(coordinate);
            }
        }
        Ok(found)
    }
}

impl MetadataManager for FsMetadataManager {
    fn read_versioning_metadata(&self, path: &RepositoryPath) -> MetadataResult<Option<Metadata>> {
        let text = match fs::read_to_string(self.metadata_file(path)) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&text)?))
    }

    fn generate_snapshot_versioning_metadata(
        &self,
        group_id: &str,
        artifact_id: &str,
        version_path: &RepositoryPath,
        base_version: &str,
        update_existing: bool,
    ) -> MetadataResult<()> {
        let mut builds: Vec<(SnapshotBuild, SnapshotVersion)> = self
            .artifacts_in(version_path)?
            .into_iter()
            .filter(|c| c.artifact_id == artifact_id)
            .filter_map(|c| {
                let build = SnapshotBuild::parse(&c.version)?;
                let updated = build.timestamp.replace('.', "");
                let snapshot_version = SnapshotVersion {
                    classifier: c.classifier,
                    extension: c.extension,
                    version: c.version,
                    updated,
                };
                Some((build, snapshot_version))
            })
            .collect();
        builds.sort_by(|(a, sa), (b, sb)| by_build(a, b).then_with(|| by_file(sa, sb)));

        let snapshot = builds.last().map(|(build, _)| Snapshot {
            timestamp: build.timestamp.clone(),
            build_number: build.build_number,
        });

        let existing = if update_existing {
            self.read_versioning_metadata(version_path)?
        } else {
            None
        };
        let mut metadata = existing.unwrap_or_else(|| Metadata {
            group_id: group_id.to_string(),
            artifact_id: artifact_id.to_string(),
            version: Some(base_version.to_string()),
            versioning: None,
        });
        let versioning = metadata.versioning.get_or_insert_with(Versioning::default);
        versioning.snapshot = snapshot;
        versioning.snapshot_versions = builds.into_iter().map(|(_, sv)| sv).collect();
        versioning.last_updated = Some(now_stamp());

        debug!(
            path = %version_path,
            builds = versioning.snapshot_versions.len(),
            "regenerated snapshot versioning"
        );
        self.write_metadata(version_path, &metadata)
    }
}

fn by_build(a: &SnapshotBuild, b: &SnapshotBuild) -> Ordering {
    a.build_number
        .cmp(&b.build_number)
        .then_with(|| a.timestamp.cmp(&b.timestamp))
}

fn by_file(a: &SnapshotVersion, b: &SnapshotVersion) -> Ordering {
    a.classifier
        .cmp(&b.classifier)
        .then_with(|| a.extension.cmp(&b.extension))
}

fn now_stamp() -> String {
    Utc::now().format(LAST_UPDATED_FORMAT).to_string()
}

/// Names of the directories directly inside `dir`, excluding hidden ones.
fn subdirectories(dir: &Path) -> io::Result<Vec<String>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if !name.starts_with('.') {
                names.push(name.to_string());
            }
        }
    }
    Ok(names)
}
