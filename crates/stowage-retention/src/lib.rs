//! Snapshot retention for Stowage.
//!
//! A `-SNAPSHOT` version accumulates one timestamped build per deployment.
//! [`SnapshotRetention`] prunes them per artifact directory under either a
//! count policy (keep the newest N builds) or an age policy (drop builds
//! older than N days), then regenerates the version's snapshot metadata.
//!
//! Metadata documents sit behind the [`MetadataManager`] trait;
//! [`FsMetadataManager`] keeps them as `maven-metadata.json` files next to
//! the content they describe.

pub mod config;
pub mod engine;
pub mod error;
pub mod fs;
pub mod metadata;
pub mod policy;
pub mod traits;

pub use config::RetentionConfig;
pub use engine::{RemovalFailure, RetentionReport, SnapshotRetention};
pub use error::{MetadataError, MetadataResult, RetentionError, RetentionResult};
pub use fs::FsMetadataManager;
pub use metadata::{Metadata, Snapshot, SnapshotVersion, Versioning, METADATA_FILE};
pub use policy::{inventory, select_removals};
pub use traits::MetadataManager;
