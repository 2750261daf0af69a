use std::fmt;
use std::fs::File;
use std::io::{self, Read};

use stowage_types::RepositoryPath;
use tracing::{trace, warn};

use crate::lock::LockGuard;
use crate::recorder::EntryRecorder;

/// Content of a fetched artifact.
///
/// Holds the path's shared lock until dropped, so no store or delete can
/// replace the bytes mid-read. Reading to end of stream counts exactly one
/// download; dropping early counts nothing.
pub struct ArtifactStream {
    file: File,
    path: RepositoryPath,
    size: u64,
    read: u64,
    counted: bool,
    recorder: EntryRecorder,
    // Declared last so it is released after everything above.
    _guard: LockGuard,
}

impl ArtifactStream {
    pub(crate) fn new(
        file: File,
        path: RepositoryPath,
        size: u64,
        recorder: EntryRecorder,
        guard: LockGuard,
    ) -> Self {
        Self {
            file,
            path,
            size,
            read: 0,
            counted: false,
            recorder,
            _guard: guard,
        }
    }

    /// The path the content was served from (a member path for groups).
    pub fn path(&self) -> &RepositoryPath {
        &self.path
    }

    /// Content length in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn bytes_read(&self) -> u64 {
        self.read
    }

    fn count_download(&mut self) {
        self.counted = true;
        match self.recorder.record_download(&self.path) {
            Ok(count) => trace!(path = %self.path, count, "download completed"),
            Err(e) => warn!(path = %self.path, error = %e, "failed to record download"),
        }
    }
}

impl Read for ArtifactStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.file.read(buf)?;
        self.read += n as u64;
        if n == 0 && !buf.is_empty() && !self.counted {
            self.count_download();
        }
        Ok(n)
    }
}

impl fmt::Debug for ArtifactStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactStream")
            .field("path", &self.path)
            .field("size", &self.size)
            .field("read", &self.read)
            .finish()
    }
}
