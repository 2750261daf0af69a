use std::io::{self, Read, Write};

use crate::checksum::{ChecksumAlgorithm, Checksums, Digester};

/// A [`Write`] adapter that digests every byte it forwards.
///
/// Only bytes actually accepted by the inner writer are digested, so the
/// checksums always describe exactly what landed in storage.
pub struct ChecksumCapture<W> {
    inner: W,
    digesters: Vec<Box<dyn Digester>>,
    bytes: u64,
}

impl<W: Write> ChecksumCapture<W> {
    /// Capture every built-in algorithm.
    pub fn new(inner: W) -> Self {
        Self::with_algorithms(inner, &ChecksumAlgorithm::ALL)
    }

    pub fn with_algorithms(inner: W, algorithms: &[ChecksumAlgorithm]) -> Self {
        let digesters = algorithms.iter().map(|alg| alg.digester()).collect();
        Self::with_digesters(inner, digesters)
    }

    /// Capture with caller-supplied digest functions.
    pub fn with_digesters(inner: W, digesters: Vec<Box<dyn Digester>>) -> Self {
        Self {
            inner,
            digesters,
            bytes: 0,
        }
    }

    /// Copy `reader` to the end into this writer; returns the bytes copied.
    pub fn copy_from<R: Read>(&mut self, reader: &mut R) -> io::Result<u64> {
        io::copy(reader, self)
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Flush and return the inner writer with the finished checksums.
    pub fn finish(mut self) -> io::Result<(W, Checksums)> {
        self.inner.flush()?;
        let checksums = self
            .digesters
            .into_iter()
            .map(|d| (d.algorithm_name().to_string(), d.finalize_hex()))
            .collect();
        Ok((self.inner, checksums))
    }
}

impl<W: Write> Write for ChecksumCapture<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        for digester in &mut self.digesters {
            digester.update(&buf[..n]);
        }
        self.bytes += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
