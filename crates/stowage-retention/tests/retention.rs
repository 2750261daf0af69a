//! End-to-end snapshot retention over a real storage root.

use std::sync::Arc;

use chrono::{Duration, Utc};
use stowage_retention::{
    FsMetadataManager, MetadataManager, RetentionConfig, RetentionError, SnapshotRetention,
};
use stowage_store::{
    ArtifactManager, InMemoryEntryDirectory, RepositoryRegistry, StorageLayout, StoreError,
};
use stowage_types::{
    format_timestamp, snapshot_build_version, Repository, RepositoryKey, RepositoryPath,
    RepositoryPolicy,
};

const BASE: &str = "org/example/timestamped";
const VERSION_DIR: &str = "org/example/timestamped/2.0-SNAPSHOT";

struct Harness {
    _dir: tempfile::TempDir,
    artifacts: Arc<ArtifactManager>,
    metadata: Arc<FsMetadataManager>,
}

impl Harness {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let layout = StorageLayout::new(dir.path());
        let registry = RepositoryRegistry::new();
        registry.insert(
            Repository::new("storage0", "snapshots").with_policy(RepositoryPolicy {
                allows_delete: false,
                ..RepositoryPolicy::default()
            }),
        )
        .unwrap();
        let artifacts = Arc::new(ArtifactManager::new(
            layout.clone(),
            Arc::new(registry),
            Arc::new(InMemoryEntryDirectory::new()),
        ));
        let metadata = Arc::new(FsMetadataManager::new(layout));
        Self {
            _dir: dir,
            artifacts,
            metadata,
        }
    }

    fn retention(&self) -> SnapshotRetention {
        SnapshotRetention::new(self.artifacts.clone(), self.metadata.clone())
    }

    /// Deploy the jar and pom of one build, returning the build version.
    fn deploy_build(&self, days_old: i64, build_number: u32) -> String {
        let built = Utc::now().naive_utc() - Duration::days(days_old);
        let version = snapshot_build_version("2.0-SNAPSHOT", &format_timestamp(built), build_number);
        for extension in ["jar", "pom"] {
            let path = file(&format!("timestamped-{version}.{extension}"));
            self.artifacts
                .store(&path, &mut format!("{version} {extension}").as_bytes())
                .unwrap();
        }
        version
    }

    fn write_metadata(&self) {
        self.metadata
            .generate_snapshot_versioning_metadata(
                "org.example",
                "timestamped",
                &path(VERSION_DIR),
                "2.0-SNAPSHOT",
                false,
            )
            .unwrap();
        self.metadata.rebuild_artifact_metadata(&path(BASE)).unwrap();
    }

    fn exists(&self, version: &str, extension: &str) -> bool {
        self.artifacts
            .exists(&file(&format!("timestamped-{version}.{extension}")))
            .unwrap()
    }

    fn listed_builds(&self) -> Vec<String> {
        let metadata = self
            .metadata
            .read_versioning_metadata(&path(VERSION_DIR))
            .unwrap()
            .unwrap();
        let mut versions: Vec<String> = metadata
            .versioning
            .unwrap()
            .snapshot_versions
            .into_iter()
            .map(|sv| sv.version)
            .collect();
        versions.dedup();
        versions
    }
}

fn repository() -> RepositoryKey {
    RepositoryKey::new("storage0", "snapshots")
}

fn path(p: &str) -> RepositoryPath {
    RepositoryPath::new(repository(), p).unwrap()
}

fn file(name: &str) -> RepositoryPath {
    path(&format!("{VERSION_DIR}/{name}"))
}

#[test]
fn count_policy_keeps_newest_build() {
    let h = Harness::new();
    let first = h.deploy_build(0, 1);
    let second = h.deploy_build(0, 2);
    let third = h.deploy_build(0, 3);
    h.write_metadata();
    assert_eq!(h.listed_builds(), vec![first.clone(), second.clone(), third.clone()]);

    let report = h
        .retention()
        .remove_timestamped_snapshots(&path(BASE), 1, 0)
        .unwrap();

    assert_eq!(report.builds_removed, vec![first.clone(), second.clone()]);
    assert_eq!(report.versions_pruned, vec![path(VERSION_DIR)]);
    assert!(report.failures.is_empty());

    for removed in [&first, &second] {
        assert!(!h.exists(removed, "jar"));
        assert!(!h.exists(removed, "pom"));
        let entry = h
            .artifacts
            .entry(&file(&format!("timestamped-{removed}.jar")))
            .unwrap();
        assert!(entry.is_none());
    }
    assert!(h.exists(&third, "jar"));
    assert!(h.exists(&third, "pom"));
    assert_eq!(h.listed_builds(), vec![third.clone()]);

    let survivor = h
        .artifacts
        .entry(&file(&format!("timestamped-{third}.jar")))
        .unwrap()
        .unwrap();
    assert!(survivor.is_last_version());
}

#[test]
fn age_policy_removes_expired_builds() {
    let h = Harness::new();
    let old = h.deploy_build(5, 2);
    let recent = h.deploy_build(0, 3);
    h.write_metadata();

    let report = h
        .retention()
        .remove_timestamped_snapshots(&path(BASE), 0, 3)
        .unwrap();

    assert_eq!(report.builds_removed, vec![old.clone()]);
    assert!(!h.exists(&old, "jar"));
    assert!(!h.exists(&old, "pom"));
    assert!(h.exists(&recent, "jar"));
    assert!(h.exists(&recent, "pom"));
    assert_eq!(h.listed_builds(), vec![recent]);
}

#[test]
fn nothing_selected_leaves_metadata_untouched() {
    let h = Harness::new();
    let only = h.deploy_build(0, 1);
    h.write_metadata();
    let before = h
        .metadata
        .read_versioning_metadata(&path(VERSION_DIR))
        .unwrap();

    let report = h
        .retention()
        .remove_timestamped_snapshots(&path(BASE), 0, 3)
        .unwrap();

    assert!(report.is_empty());
    assert!(h.exists(&only, "jar"));
    let after = h
        .metadata
        .read_versioning_metadata(&path(VERSION_DIR))
        .unwrap();
    assert_eq!(before, after);
}

#[test]
fn missing_descriptor_is_not_a_failure() {
    let h = Harness::new();
    let first = h.deploy_build(0, 1);
    let second = h.deploy_build(0, 2);
    h.artifacts.purge(&file(&format!("timestamped-{first}.pom"))).unwrap();
    h.write_metadata();

    let report = h
        .retention()
        .remove_timestamped_snapshots(&path(BASE), 1, 0)
        .unwrap();
    assert_eq!(report.builds_removed, vec![first.clone()]);
    assert!(report.failures.is_empty());
    assert!(h.exists(&second, "jar"));
}

#[test]
fn configured_extensions_are_honoured() {
    let h = Harness::new();
    let first = h.deploy_build(0, 1);
    let second = h.deploy_build(0, 2);
    h.write_metadata();

    // Treat the pom as the primary file and the jar as its descriptor.
    let retention = SnapshotRetention::with_config(
        h.artifacts.clone(),
        h.metadata.clone(),
        RetentionConfig {
            primary_extension: "pom".into(),
            descriptor_extension: "jar".into(),
        },
    );
    let report = retention
        .remove_timestamped_snapshots(&path(BASE), 1, 0)
        .unwrap();
    assert_eq!(report.builds_removed, vec![first.clone()]);
    assert!(!h.exists(&first, "jar"));
    assert!(h.exists(&second, "pom"));
}

#[test]
fn without_metadata_nothing_happens() {
    let h = Harness::new();
    let build = h.deploy_build(10, 1);
    let report = h
        .retention()
        .remove_timestamped_snapshots(&path(BASE), 0, 1)
        .unwrap();
    assert!(report.is_empty());
    assert!(h.exists(&build, "jar"));
}

#[test]
fn unknown_repository_is_an_error() {
    let h = Harness::new();
    let elsewhere = RepositoryPath::new(RepositoryKey::new("storage0", "nope"), BASE).unwrap();
    let err = h
        .retention()
        .remove_timestamped_snapshots(&elsewhere, 1, 0)
        .unwrap_err();
    assert!(matches!(
        err,
        RetentionError::Store(StoreError::RepositoryNotFound(_))
    ));
}
