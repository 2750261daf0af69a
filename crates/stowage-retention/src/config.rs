use serde::{Deserialize, Serialize};
use stowage_types::{ArtifactCoordinate, ArtifactIdentity, SnapshotBuild};

use crate::error::{RetentionError, RetentionResult};

/// Packaging extensions retention works with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    /// Builds are inventoried by their files of this extension.
    pub primary_extension: String,
    /// Removed alongside each primary file with the same stem.
    pub descriptor_extension: String,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            primary_extension: "jar".to_string(),
            descriptor_extension: "pom".to_string(),
        }
    }
}

impl RetentionConfig {
    pub fn from_toml_str(s: &str) -> RetentionResult<Self> {
        toml::from_str(s).map_err(|e| RetentionError::Config(e.to_string()))
    }

    /// Coordinates of the primary file of `build` and of its descriptor.
    pub fn build_files(
        &self,
        artifact: &ArtifactIdentity,
        build: &SnapshotBuild,
    ) -> (ArtifactCoordinate, ArtifactCoordinate) {
        let primary = ArtifactCoordinate::new(
            &artifact.group_id,
            &artifact.artifact_id,
            &build.version,
            &self.primary_extension,
        );
        let descriptor = primary.with_extension(&self.descriptor_extension);
        (primary, descriptor)
    }
}
