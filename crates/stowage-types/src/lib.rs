//! Foundation types for Stowage.
//!
//! This crate provides the value types shared by every other Stowage crate:
//! the Maven-style artifact coordinate and its path codec, repository-relative
//! paths, timestamped snapshot versions, version ordering, and the repository
//! model (plain vs. group repositories and their policy flags).
//!
//! Nothing in here touches the filesystem. All functions are pure.
//!
//! # Key Types
//!
//! - [`ArtifactCoordinate`] -- groupId/artifactId/version/classifier/extension
//! - [`RepositoryPath`] -- a path relative to a repository root
//! - [`SnapshotBuild`] -- a parsed `<base>-<yyyyMMdd.HHmmss>-<build>` version
//! - [`Repository`] -- repository identity, policy and kind
//! - [`compare_versions`] -- numeric-segment-aware version ordering

pub mod coordinate;
pub mod error;
pub mod path;
pub mod repository;
pub mod snapshot;
pub mod version;

pub use coordinate::{directory_identity, ArtifactCoordinate, ArtifactIdentity};
pub use error::TypeError;
pub use path::RepositoryPath;
pub use repository::{Repository, RepositoryKey, RepositoryKind, RepositoryPolicy};
pub use snapshot::{
    format_timestamp, is_snapshot, snapshot_build_version, to_snapshot_version, SnapshotBuild,
    SNAPSHOT_SUFFIX, TIMESTAMP_FORMAT,
};
pub use version::{compare_versions, ComparableVersion};
