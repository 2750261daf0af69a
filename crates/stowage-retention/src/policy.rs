//! Which timestamped builds a retention pass removes.

use chrono::NaiveDateTime;
use stowage_types::SnapshotBuild;
use tracing::warn;

use crate::metadata::Versioning;

/// Builds recorded in `versioning` whose file has `extension`.
///
/// Ordered by build number, then timestamp, one entry per build version
/// (a classified file of the same build does not add another). Versions
/// that are not timestamped builds are skipped. Two builds sharing a build
/// number are both kept and reported.
pub fn inventory(versioning: &Versioning, extension: &str) -> Vec<SnapshotBuild> {
    let mut builds: Vec<SnapshotBuild> = versioning
        .snapshot_versions
        .iter()
        .filter(|sv| sv.extension == extension)
        .filter_map(|sv| sv.build())
        .collect();
    builds.sort_by(|a, b| {
        a.build_number
            .cmp(&b.build_number)
            .then_with(|| a.timestamp.cmp(&b.timestamp))
    });
    builds.dedup_by(|a, b| a.version == b.version);

    for pair in builds.windows(2) {
        if pair[0].build_number == pair[1].build_number {
            warn!(
                build_number = pair[0].build_number,
                first = %pair[0],
                second = %pair[1],
                "duplicate snapshot build number"
            );
        }
    }
    builds
}

/// Select the builds to remove from an ordered inventory.
///
/// A non-zero `number_to_keep` keeps that many of the highest builds and
/// takes precedence. Otherwise a non-zero `keep_period_days` removes every
/// build more than that many whole days older than `now`. With both zero
/// nothing is removed.
pub fn select_removals(
    builds: &[SnapshotBuild],
    number_to_keep: usize,
    keep_period_days: i64,
    now: NaiveDateTime,
) -> Vec<SnapshotBuild> {
    if number_to_keep > 0 {
        let excess = builds.len().saturating_sub(number_to_keep);
        return builds[..excess].to_vec();
    }
    if keep_period_days <= 0 {
        return Vec::new();
    }
    builds
        .iter()
        .filter(|build| match build.built_at() {
            Ok(built_at) => (now - built_at).num_days() > keep_period_days,
            Err(e) => {
                warn!(build = %build, error = %e, "malformed snapshot timestamp, keeping build");
                false
            }
        })
        .cloned()
        .collect()
}
