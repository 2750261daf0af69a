//! Versioning metadata documents.
//!
//! An artifact directory carries the list of its versions; a `-SNAPSHOT`
//! version directory carries the list of its timestamped builds.

use serde::{Deserialize, Serialize};
use stowage_types::SnapshotBuild;

/// File name of a metadata document inside its directory.
pub const METADATA_FILE: &str = "maven-metadata.json";

/// Format of [`Versioning::last_updated`] and [`SnapshotVersion::updated`].
pub const LAST_UPDATED_FORMAT: &str = "%Y%m%d%H%M%S";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub group_id: String,
    pub artifact_id: String,
    /// Set on version-level documents only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub versioning: Option<Versioning>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Versioning {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
    #[serde(default)]
    pub versions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<Snapshot>,
    #[serde(default)]
    pub snapshot_versions: Vec<SnapshotVersion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

/// The newest build of a snapshot version.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub timestamp: String,
    pub build_number: u32,
}

/// One file of one timestamped build.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotVersion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classifier: Option<String>,
    pub extension: String,
    /// Timestamped version, e.g. `2.0-20240131.235959-3`.
    pub version: String,
    pub updated: String,
}

impl SnapshotVersion {
    /// The parsed build, if `version` is a timestamped snapshot version.
    pub fn build(&self) -> Option<SnapshotBuild> {
        SnapshotBuild::parse(&self.version)
    }
}

impl Metadata {
    pub fn versions(&self) -> &[String] {
        self.versioning
            .as_ref()
            .map(|v| v.versions.as_slice())
            .unwrap_or_default()
    }
}
