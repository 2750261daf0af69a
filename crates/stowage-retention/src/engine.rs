use std::sync::Arc;

use chrono::{NaiveDateTime, Utc};
use serde::Serialize;
use stowage_store::{ArtifactManager, StoreError};
use stowage_types::{
    directory_identity, to_snapshot_version, ArtifactIdentity, RepositoryPath, SnapshotBuild,
};
use tracing::{debug, error, warn};

use crate::config::RetentionConfig;
use crate::error::RetentionResult;
use crate::metadata::Versioning;
use crate::policy::{inventory, select_removals};
use crate::traits::MetadataManager;

/// Outcome of one retention pass.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RetentionReport {
    /// Version directories that had builds selected for removal.
    pub versions_pruned: Vec<RepositoryPath>,
    /// Build versions whose primary file was removed.
    pub builds_removed: Vec<String>,
    pub failures: Vec<RemovalFailure>,
}

impl RetentionReport {
    pub fn is_empty(&self) -> bool {
        self.versions_pruned.is_empty() && self.failures.is_empty()
    }
}

/// A path that could not be removed or regenerated, and why.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RemovalFailure {
    pub path: RepositoryPath,
    pub reason: String,
}

/// Prunes old timestamped snapshot builds.
///
/// Removal goes through [`ArtifactManager::purge`], so every deleted file
/// is locked, retired from the entry directory and retagged like any other
/// delete. A pass takes no lock of its own; builds deployed while it runs
/// may be missed until the next pass.
pub struct SnapshotRetention {
    artifacts: Arc<ArtifactManager>,
    metadata: Arc<dyn MetadataManager>,
    config: RetentionConfig,
}

impl SnapshotRetention {
    pub fn new(artifacts: Arc<ArtifactManager>, metadata: Arc<dyn MetadataManager>) -> Self {
        Self::with_config(artifacts, metadata, RetentionConfig::default())
    }

    pub fn with_config(
        artifacts: Arc<ArtifactManager>,
        metadata: Arc<dyn MetadataManager>,
        config: RetentionConfig,
    ) -> Self {
        Self {
            artifacts,
            metadata,
            config,
        }
    }

    pub fn config(&self) -> &RetentionConfig {
        &self.config
    }

    /// Run a pass over the artifact directory `base_path`.
    ///
    /// Reads the directory's version list from its metadata; a directory
    /// without metadata or versions is left alone.
    pub fn remove_timestamped_snapshots(
        &self,
        base_path: &RepositoryPath,
        number_to_keep: u32,
        keep_period_days: u32,
    ) -> RetentionResult<RetentionReport> {
        self.artifacts.repositories().require(base_path.repository())?;
        let Some(versioning) = self
            .metadata
            .read_versioning_metadata(base_path)?
            .and_then(|m| m.versioning)
        else {
            debug!(path = %base_path, "no versioning metadata, nothing to prune");
            return Ok(RetentionReport::default());
        };
        Ok(self.delete_timestamped_snapshot_artifacts(
            base_path,
            &versioning,
            number_to_keep,
            keep_period_days,
        ))
    }

    /// Prune every version listed in `versioning` under `base_path`.
    pub fn delete_timestamped_snapshot_artifacts(
        &self,
        base_path: &RepositoryPath,
        versioning: &Versioning,
        number_to_keep: u32,
        keep_period_days: u32,
    ) -> RetentionReport {
        let mut report = RetentionReport::default();
        if !self.artifacts.layout().resolve(base_path).is_dir() {
            error!(path = %base_path, "snapshot retention base path does not exist");
            return report;
        }
        if versioning.versions.is_empty() {
            return report;
        }

        let (group_id, artifact_id) = directory_identity(base_path.as_str());
        let artifact = ArtifactIdentity {
            group_id: group_id.clone(),
            artifact_id: artifact_id.clone(),
            classifier: None,
        };
        debug!(
            path = %base_path,
            number_to_keep,
            keep_period_days,
            "removing timestamped snapshots"
        );
        let now = Utc::now().naive_utc();

        for version in &versioning.versions {
            let version_path = match base_path.resolve(&to_snapshot_version(version)) {
                Ok(path) => path,
                Err(e) => {
                    warn!(path = %base_path, version = %version, error = %e, "skipping unusable version");
                    continue;
                }
            };
            if !self.prune_version(
                &version_path,
                &artifact,
                number_to_keep,
                keep_period_days,
                now,
                &mut report,
            ) {
                continue;
            }

            debug!(path = %version_path, "regenerating snapshot versioning metadata");
            if let Err(e) = self.metadata.generate_snapshot_versioning_metadata(
                &group_id,
                &artifact_id,
                &version_path,
                version,
                true,
            ) {
                error!(path = %version_path, error = %e, "failed to regenerate snapshot metadata");
                report.failures.push(RemovalFailure {
                    path: version_path.clone(),
                    reason: e.to_string(),
                });
            }
            report.versions_pruned.push(version_path);
        }
        report
    }

    /// Remove the selected builds of one version directory.
    ///
    /// Returns `true` if any build was selected, whether or not every
    /// removal succeeded.
    fn prune_version(
        &self,
        version_path: &RepositoryPath,
        artifact: &ArtifactIdentity,
        number_to_keep: u32,
        keep_period_days: u32,
        now: NaiveDateTime,
        report: &mut RetentionReport,
    ) -> bool {
        let metadata = match self.metadata.read_versioning_metadata(version_path) {
            Ok(Some(metadata)) => metadata,
            Ok(None) => return false,
            Err(e) => {
                warn!(path = %version_path, error = %e, "unreadable snapshot metadata, skipping version");
                return false;
            }
        };
        let Some(versioning) = metadata.versioning else {
            return false;
        };

        let builds = inventory(&versioning, &self.config.primary_extension);
        let selected = select_removals(
            &builds,
            number_to_keep as usize,
            i64::from(keep_period_days),
            now,
        );
        if selected.is_empty() {
            return false;
        }

        for build in &selected {
            self.remove_build(version_path, artifact, build, report);
        }
        true
    }

    /// Remove the primary file of `build` and its descriptor.
    fn remove_build(
        &self,
        version_path: &RepositoryPath,
        artifact: &ArtifactIdentity,
        build: &SnapshotBuild,
        report: &mut RetentionReport,
    ) {
        let (primary, descriptor) = self.config.build_files(artifact, build);
        let (primary, descriptor) = (primary.file_name(), descriptor.file_name());

        match self.purge(version_path, &primary, report) {
            Some(true) => report.builds_removed.push(build.version.clone()),
            Some(false) => debug!(path = %version_path, file = %primary, "build file already gone"),
            None => {}
        }
        if self.purge(version_path, &descriptor, report) == Some(false) {
            debug!(path = %version_path, file = %descriptor, "build has no descriptor");
        }
    }

    /// `Some(true)` if removed, `Some(false)` if absent, `None` on failure.
    fn purge(
        &self,
        version_path: &RepositoryPath,
        file_name: &str,
        report: &mut RetentionReport,
    ) -> Option<bool> {
        let path = match version_path.resolve(file_name) {
            Ok(path) => path,
            Err(e) => {
                report.failures.push(RemovalFailure {
                    path: version_path.clone(),
                    reason: e.to_string(),
                });
                return None;
            }
        };
        match self.artifacts.purge(&path) {
            Ok(()) => Some(true),
            Err(StoreError::NotFound(_)) => Some(false),
            Err(e) => {
                error!(path = %path, error = %e, "failed to remove snapshot build");
                report.failures.push(RemovalFailure {
                    path,
                    reason: e.to_string(),
                });
                None
            }
        }
    }
}
