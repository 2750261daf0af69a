//! Artifact coordinates and the Maven 2 path codec.
//!
//! A coordinate maps to exactly one repository-relative path:
//!
//! ```text
//! org.example:widget:1.0:jar:sources
//!   -> org/example/widget/1.0/widget-1.0-sources.jar
//! ```
//!
//! Timestamped snapshot builds live in their `-SNAPSHOT` directory:
//!
//! ```text
//! org.example:widget:2.0-20240131.235959-3:jar
//!   -> org/example/widget/2.0-SNAPSHOT/widget-2.0-20240131.235959-3.jar
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::snapshot::{timestamped_prefix_len, to_snapshot_version, SNAPSHOT_SUFFIX};

/// Extensions of side files that accompany an artifact but are not artifacts.
const SIDE_FILE_EXTENSIONS: &[&str] = &["sha1", "md5", "sha256", "sha512", "asc"];

/// Immutable artifact coordinate.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArtifactCoordinate {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub classifier: Option<String>,
    pub extension: String,
}

/// The identity group a "last version" tag is unique within.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArtifactIdentity {
    pub group_id: String,
    pub artifact_id: String,
    pub classifier: Option<String>,
}

impl ArtifactCoordinate {
    /// Create a coordinate without a classifier.
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: version.into(),
            classifier: None,
            extension: extension.into(),
        }
    }

    /// Set the classifier. An empty classifier means "no classifier".
    ///
    /// The first `.` after the version starts the extension in a path, so a
    /// classifier containing `.` does not survive [`from_path`](Self::from_path).
    pub fn with_classifier(mut self, classifier: impl Into<String>) -> Self {
        let classifier = classifier.into();
        self.classifier = (!classifier.is_empty()).then_some(classifier);
        self
    }

    /// The same coordinate with another extension (e.g. the `.pom` descriptor
    /// of a `.jar`).
    pub fn with_extension(&self, extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
            ..self.clone()
        }
    }

    /// Parse `groupId:artifactId:version[:extension[:classifier]]`.
    ///
    /// The extension defaults to `jar`. A classifier containing `.` is
    /// rejected since its path would parse back differently.
    pub fn from_gavtc(gavtc: &str) -> Option<Self> {
        let mut parts = gavtc.split(':');
        let group_id = parts.next().filter(|s| !s.is_empty())?;
        let artifact_id = parts.next().filter(|s| !s.is_empty())?;
        let version = parts.next().unwrap_or_default();
        let extension = parts.next().filter(|s| !s.is_empty()).unwrap_or("jar");
        let classifier = parts.next().unwrap_or_default();
        if parts.next().is_some() || classifier.contains('.') {
            return None;
        }
        Some(Self::new(group_id, artifact_id, version, extension).with_classifier(classifier))
    }

    /// Directory holding this artifact's files: the base `-SNAPSHOT` version
    /// for snapshot builds, the version itself otherwise.
    pub fn version_directory(&self) -> String {
        to_snapshot_version(&self.version)
    }

    /// File name: `artifactId-version[-classifier].extension`.
    pub fn file_name(&self) -> String {
        match &self.classifier {
            Some(classifier) => format!(
                "{}-{}-{}.{}",
                self.artifact_id, self.version, classifier, self.extension
            ),
            None => format!("{}-{}.{}", self.artifact_id, self.version, self.extension),
        }
    }

    /// Path of the directory holding every version of this artifact.
    pub fn artifact_directory(&self) -> String {
        format!("{}/{}", self.group_id.replace('.', "/"), self.artifact_id)
    }

    /// Repository-relative path of this coordinate. Total: blank fields
    /// become empty segments.
    pub fn to_path(&self) -> String {
        format!(
            "{}/{}/{}",
            self.artifact_directory(),
            self.version_directory(),
            self.file_name()
        )
    }

    /// Inverse of [`to_path`](Self::to_path).
    ///
    /// Returns `None` unless `path` has the artifact shape
    /// `group.../artifactId/version/artifactId-version[-classifier].ext`.
    /// Metadata documents, checksum and signature side files, directories and
    /// temporary files are not artifacts. Classifiers never contain `.`:
    /// `widget-1.0-a.b.jar` has classifier `a` and extension `b.jar`.
    pub fn from_path(path: &str) -> Option<Self> {
        let path = path.strip_prefix('/').unwrap_or(path);
        let segments: Vec<&str> = path.split('/').collect();
        if segments.len() < 4 || segments.iter().any(|s| s.is_empty()) {
            return None;
        }

        let n = segments.len();
        let file_name = segments[n - 1];
        let version_dir = segments[n - 2];
        let artifact_id = segments[n - 3];
        let group_id = segments[..n - 3].join(".");

        let rest = file_name.strip_prefix(artifact_id)?.strip_prefix('-')?;
        let (version, tail) = split_version(rest, version_dir)?;

        let (classifier, extension) = if let Some(ext) = tail.strip_prefix('.') {
            (None, ext)
        } else if let Some(classified) = tail.strip_prefix('-') {
            let (classifier, ext) = classified.split_once('.')?;
            if classifier.is_empty() {
                return None;
            }
            (Some(classifier.to_string()), ext)
        } else {
            return None;
        };

        if extension.is_empty() || is_side_file(extension) {
            return None;
        }

        Some(Self {
            group_id,
            artifact_id: artifact_id.to_string(),
            version,
            classifier,
            extension: extension.to_string(),
        })
    }

    /// The (groupId, artifactId, classifier) identity of this coordinate.
    pub fn identity(&self) -> ArtifactIdentity {
        ArtifactIdentity {
            group_id: self.group_id.clone(),
            artifact_id: self.artifact_id.clone(),
            classifier: self.classifier.clone(),
        }
    }
}

impl fmt::Display for ArtifactCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.group_id, self.artifact_id, self.version, self.extension
        )?;
        if let Some(classifier) = &self.classifier {
            write!(f, ":{classifier}")?;
        }
        Ok(())
    }
}

impl fmt::Display for ArtifactIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_id, self.artifact_id)?;
        if let Some(classifier) = &self.classifier {
            write!(f, ":{classifier}")?;
        }
        Ok(())
    }
}

/// Derive `(groupId, artifactId)` from an artifact directory path such as
/// `org/example/widget/`.
///
/// The parent segments, dot-joined, form the group id; the final segment is
/// the artifact id. A path without any `/` yields an empty group id.
pub fn directory_identity(directory: &str) -> (String, String) {
    let path = directory.strip_suffix('/').unwrap_or(directory);
    match path.rsplit_once('/') {
        Some((group, artifact)) => (group.replace('/', "."), artifact.to_string()),
        None => (String::new(), path.to_string()),
    }
}

/// Split the version off the front of `rest`, returning `(version, tail)`.
fn split_version<'a>(rest: &'a str, version_dir: &str) -> Option<(String, &'a str)> {
    if let Some(release) = version_dir.strip_suffix(SNAPSHOT_SUFFIX) {
        let build = rest.strip_prefix(release).and_then(|r| r.strip_prefix('-'));
        if let Some(build) = build {
            if let Some(len) = timestamped_prefix_len(build) {
                let version = format!("{release}-{}", &build[..len]);
                return Some((version, &build[len..]));
            }
        }
    }
    let tail = rest.strip_prefix(version_dir)?;
    Some((version_dir.to_string(), tail))
}

fn is_side_file(extension: &str) -> bool {
    let last = extension.rsplit('.').next().unwrap_or(extension);
    SIDE_FILE_EXTENSIONS.contains(&last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn widget(version: &str) -> ArtifactCoordinate {
        ArtifactCoordinate::new("org.example", "widget", version, "jar")
    }

    #[test]
    fn release_path() {
        assert_eq!(
            widget("1.0").to_path(),
            "org/example/widget/1.0/widget-1.0.jar"
        );
    }

    #[test]
    fn classified_path() {
        let c = widget("1.0").with_classifier("sources");
        assert_eq!(c.to_path(), "org/example/widget/1.0/widget-1.0-sources.jar");
    }

    #[test]
    fn snapshot_build_lives_in_snapshot_directory() {
        let c = widget("2.0-20240131.235959-3");
        assert_eq!(
            c.to_path(),
            "org/example/widget/2.0-SNAPSHOT/widget-2.0-20240131.235959-3.jar"
        );
    }

    #[test]
    fn blank_fields_degrade_to_empty_segments() {
        let c = ArtifactCoordinate::new("org.example", "", "", "jar");
        assert_eq!(c.to_path(), "org/example///-.jar");
        assert!(ArtifactCoordinate::from_path(&c.to_path()).is_none());
    }

    #[test]
    fn parse_release_path() {
        let c = ArtifactCoordinate::from_path(
            "org/example/stowage/stowage-utils/8.0/stowage-utils-8.0.jar",
        )
        .unwrap();
        assert_eq!(c.group_id, "org.example.stowage");
        assert_eq!(c.artifact_id, "stowage-utils");
        assert_eq!(c.version, "8.0");
        assert_eq!(c.classifier, None);
        assert_eq!(c.extension, "jar");
    }

    #[test]
    fn parse_classifier_and_compound_extension() {
        let c = ArtifactCoordinate::from_path("org/example/widget/1.0/widget-1.0-dist.tar.gz")
            .unwrap();
        assert_eq!(c.classifier.as_deref(), Some("dist"));
        assert_eq!(c.extension, "tar.gz");
    }

    #[test]
    fn classifier_ends_at_first_dot() {
        let c = ArtifactCoordinate::from_path("org/example/widget/1.0/widget-1.0-a.b.jar").unwrap();
        assert_eq!(c.classifier.as_deref(), Some("a"));
        assert_eq!(c.extension, "b.jar");
        assert_eq!(c.to_path(), "org/example/widget/1.0/widget-1.0-a.b.jar");

        assert!(ArtifactCoordinate::from_gavtc("org.example:widget:1.0:jar:a.b").is_none());
    }

    #[test]
    fn parse_snapshot_paths() {
        let plain = ArtifactCoordinate::from_path(
            "org/example/widget/2.0-SNAPSHOT/widget-2.0-SNAPSHOT.jar",
        )
        .unwrap();
        assert_eq!(plain.version, "2.0-SNAPSHOT");

        let build = ArtifactCoordinate::from_path(
            "org/example/widget/2.0-SNAPSHOT/widget-2.0-20240131.235959-3-sources.jar",
        )
        .unwrap();
        assert_eq!(build.version, "2.0-20240131.235959-3");
        assert_eq!(build.classifier.as_deref(), Some("sources"));
    }

    #[test]
    fn leading_slash_is_ignored() {
        assert_eq!(
            ArtifactCoordinate::from_path("/org/example/widget/1.0/widget-1.0.jar"),
            Some(widget("1.0"))
        );
    }

    #[test]
    fn non_artifacts_are_rejected() {
        let rejected = [
            "org/example/widget/maven-metadata.xml",
            "org/example/widget/2.0-SNAPSHOT/maven-metadata.json",
            "org/example/widget/1.0/widget-1.0.jar.sha1",
            "org/example/widget/1.0/widget-1.0.jar.md5",
            "org/example/widget/1.0/widget-1.0.pom.asc",
            "org/example/widget/1.0/",
            "org/example/widget/1.0",
            "widget/1.0/widget-1.0.jar",
            "org/example/widget/1.0/other-1.0.jar",
            "org/example/widget/1.0/widget-1.1.jar",
            "org/example/widget/1.0/widget-1.0",
            "org/example/widget/1.0/widget-1.0-.jar",
            "org/example/widget/1.0/.widget-1.0.jar.tmp",
            "org//widget/1.0/widget-1.0.jar",
        ];
        for path in rejected {
            assert!(ArtifactCoordinate::from_path(path).is_none(), "{path}");
        }
    }

    #[test]
    fn gavtc_parsing() {
        let c = ArtifactCoordinate::from_gavtc("org.example:widget:1.0:jar:sources").unwrap();
        assert_eq!(c, widget("1.0").with_classifier("sources"));
        assert_eq!(c.to_string(), "org.example:widget:1.0:jar:sources");

        let c = ArtifactCoordinate::from_gavtc("org.example:widget:1.0").unwrap();
        assert_eq!(c, widget("1.0"));

        assert!(ArtifactCoordinate::from_gavtc("org.example").is_none());
        assert!(ArtifactCoordinate::from_gavtc("a:b:c:d:e:f").is_none());
    }

    #[test]
    fn empty_classifier_is_none() {
        assert_eq!(widget("1.0").with_classifier("").classifier, None);
    }

    #[test]
    fn descriptor_swaps_extension() {
        let pom = widget("2.0-20240131.235959-3").with_extension("pom");
        assert_eq!(
            pom.to_path(),
            "org/example/widget/2.0-SNAPSHOT/widget-2.0-20240131.235959-3.pom"
        );
    }

    #[test]
    fn identity_ignores_version_and_extension() {
        let a = widget("1.0");
        let b = widget("2.0").with_extension("pom");
        let c = widget("2.0").with_classifier("sources");
        assert_eq!(a.identity(), b.identity());
        assert_ne!(a.identity(), c.identity());
    }

    #[test]
    fn directory_identity_splits_group_and_artifact() {
        assert_eq!(
            directory_identity("org/example/stowage/timestamped"),
            ("org.example.stowage".to_string(), "timestamped".to_string())
        );
        assert_eq!(
            directory_identity("org/example/stowage/timestamped/"),
            ("org.example.stowage".to_string(), "timestamped".to_string())
        );
        assert_eq!(
            directory_identity("timestamped"),
            (String::new(), "timestamped".to_string())
        );
    }

    fn version_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            "[0-9]{1,3}(\\.[0-9]{1,3}){0,3}",
            "[0-9]{1,3}(\\.[0-9]{1,3}){0,2}-SNAPSHOT",
            "[0-9]{1,3}(\\.[0-9]{1,3}){0,2}-(alpha|beta|rc)-[0-9]",
            (
                "[0-9]{1,3}(\\.[0-9]{1,3}){0,2}",
                "20[0-9]{6}\\.[0-9]{6}",
                1u32..500
            )
                .prop_map(|(base, ts, build)| format!("{base}-{ts}-{build}")),
        ]
    }

    fn coordinate_strategy() -> impl Strategy<Value = ArtifactCoordinate> {
        (
            "[a-z][a-z0-9]{0,7}(\\.[a-z][a-z0-9]{0,7}){0,3}",
            "[a-z][a-z0-9]{0,7}(-[a-z][a-z0-9]{0,5}){0,2}",
            version_strategy(),
            proptest::option::of("[a-z][a-z0-9]{0,7}"),
            "[a-z]{1,4}(\\.[a-z]{2})?".prop_filter("side-file extension", |e| !is_side_file(e)),
        )
            .prop_map(|(group_id, artifact_id, version, classifier, extension)| {
                ArtifactCoordinate {
                    group_id,
                    artifact_id,
                    version,
                    classifier,
                    extension,
                }
            })
    }

    proptest! {
        #[test]
        fn path_round_trip(c in coordinate_strategy()) {
            let path = c.to_path();
            prop_assert_eq!(ArtifactCoordinate::from_path(&path), Some(c));
        }
    }
}
