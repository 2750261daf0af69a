use stowage_types::RepositoryPath;

use crate::error::MetadataResult;
use crate::metadata::Metadata;

/// Reads and regenerates versioning metadata documents.
pub trait MetadataManager: Send + Sync {
    /// The metadata document of the directory `path`, or `Ok(None)` when
    /// the directory has none.
    fn read_versioning_metadata(&self, path: &RepositoryPath) -> MetadataResult<Option<Metadata>>;

    /// Regenerate the snapshot versioning of the version directory
    /// `version_path` from the builds present in it.
    ///
    /// With `update_existing`, fields of an existing document other than
    /// the snapshot section are preserved.
    fn generate_snapshot_versioning_metadata(
        &self,
        group_id: &str,
        artifact_id: &str,
        version_path: &RepositoryPath,
        base_version: &str,
        update_existing: bool,
    ) -> MetadataResult<()>;
}
