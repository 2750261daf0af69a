//! Timestamped snapshot versions.
//!
//! A snapshot version such as `2.0-SNAPSHOT` is stored on disk under
//! build-specific names: every deployment gets a UTC timestamp and a build
//! number, producing versions like `2.0-20240131.235959-3`.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// The mutable marker that ends every snapshot base version.
pub const SNAPSHOT_SUFFIX: &str = "-SNAPSHOT";

/// `chrono` format of the `yyyyMMdd.HHmmss` build timestamp.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d.%H%M%S";

/// Length of a `yyyyMMdd.HHmmss` timestamp.
const TIMESTAMP_LEN: usize = 15;

/// One timestamped build of a snapshot version.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotBuild {
    /// The full timestamped version, e.g. `2.0-20240131.235959-3`.
    pub version: String,
    /// The `yyyyMMdd.HHmmss` build timestamp.
    pub timestamp: String,
    /// Build number, always `>= 1`.
    pub build_number: u32,
}

impl SnapshotBuild {
    /// Parse a timestamped snapshot version.
    ///
    /// Returns `None` for anything that does not follow
    /// `<base>-<yyyyMMdd.HHmmss>-<buildNumber>`: such a version is simply not
    /// a snapshot build.
    pub fn parse(version: &str) -> Option<Self> {
        let (head, build) = version.rsplit_once('-')?;
        if build.is_empty() || !build.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let build_number: u32 = build.parse().ok()?;
        if build_number == 0 {
            return None;
        }

        let (base, timestamp) = head.rsplit_once('-')?;
        if base.is_empty() || !is_timestamp(timestamp) {
            return None;
        }

        Some(Self {
            version: version.to_string(),
            timestamp: timestamp.to_string(),
            build_number,
        })
    }

    /// The version without timestamp and build number, e.g. `2.0`.
    pub fn release_part(&self) -> &str {
        self.version.rsplitn(3, '-').nth(2).unwrap_or_default()
    }

    /// The `-SNAPSHOT` version this build belongs to, e.g. `2.0-SNAPSHOT`.
    pub fn base_version(&self) -> String {
        format!("{}{SNAPSHOT_SUFFIX}", self.release_part())
    }

    /// The build timestamp as a UTC date-time.
    pub fn built_at(&self) -> Result<NaiveDateTime, TypeError> {
        NaiveDateTime::parse_from_str(&self.timestamp, TIMESTAMP_FORMAT).map_err(|e| {
            TypeError::InvalidTimestamp {
                timestamp: self.timestamp.clone(),
                reason: e.to_string(),
            }
        })
    }
}

impl fmt::Display for SnapshotBuild {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.version)
    }
}

/// Build the timestamped version for one deployment of `base_version`.
///
/// A trailing `-SNAPSHOT` on `base_version` is dropped:
/// `snapshot_build_version("2.0-SNAPSHOT", "20240131.235959", 3)` yields
/// `2.0-20240131.235959-3`.
pub fn snapshot_build_version(base_version: &str, timestamp: &str, build_number: u32) -> String {
    let release = base_version
        .strip_suffix(SNAPSHOT_SUFFIX)
        .unwrap_or(base_version);
    format!("{release}-{timestamp}-{build_number}")
}

/// Map a timestamped build version to its `-SNAPSHOT` base version.
///
/// Any other version is returned unchanged.
pub fn to_snapshot_version(version: &str) -> String {
    match SnapshotBuild::parse(version) {
        Some(build) => build.base_version(),
        None => version.to_string(),
    }
}

/// Returns `true` for `-SNAPSHOT` versions and timestamped snapshot builds.
pub fn is_snapshot(version: &str) -> bool {
    version.ends_with(SNAPSHOT_SUFFIX) || SnapshotBuild::parse(version).is_some()
}

/// Format a date-time as a `yyyyMMdd.HHmmss` build timestamp.
pub fn format_timestamp(at: NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Length of the `<timestamp>-<build>` prefix of `s`, if `s` starts with one.
pub(crate) fn timestamped_prefix_len(s: &str) -> Option<usize> {
    let timestamp = s.get(..TIMESTAMP_LEN)?;
    if !is_timestamp(timestamp) {
        return None;
    }
    let rest = s[TIMESTAMP_LEN..].strip_prefix('-')?;
    let build_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if build_len == 0 {
        return None;
    }
    Some(TIMESTAMP_LEN + 1 + build_len)
}

fn is_timestamp(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == TIMESTAMP_LEN
        && bytes[8] == b'.'
        && bytes[..8].iter().all(u8::is_ascii_digit)
        && bytes[9..].iter().all(u8::is_ascii_digit)
}
