use std::collections::BTreeMap;
use std::fmt;

use md5::Md5;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

/// Checksum set of one artifact: algorithm name -> lower-case hex digest.
pub type Checksums = BTreeMap<String, String>;

/// An incremental digest function.
///
/// Implement this to plug another algorithm into
/// [`ChecksumCapture`](crate::ChecksumCapture).
pub trait Digester: Send {
    /// Name recorded as the key in [`Checksums`], e.g. `"SHA-1"`.
    fn algorithm_name(&self) -> &str;

    /// Feed more bytes.
    fn update(&mut self, data: &[u8]);

    /// Consume the digester and return the lower-case hex digest.
    fn finalize_hex(self: Box<Self>) -> String;
}

/// Built-in checksum algorithms.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChecksumAlgorithm {
    Sha1,
    Md5,
}

impl ChecksumAlgorithm {
    /// Every algorithm captured on store, in a stable order.
    pub const ALL: [Self; 2] = [Self::Sha1, Self::Md5];

    /// Algorithm name as persisted in artifact entries.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sha1 => "SHA-1",
            Self::Md5 => "MD5",
        }
    }

    /// A fresh incremental digester.
    pub fn digester(&self) -> Box<dyn Digester> {
        match self {
            Self::Sha1 => Box::new(RustCryptoDigester::<Sha1>::new(self.name())),
            Self::Md5 => Box::new(RustCryptoDigester::<Md5>::new(self.name())),
        }
    }

    /// One-shot hex digest of `data`.
    pub fn digest(&self, data: &[u8]) -> String {
        let mut digester = self.digester();
        digester.update(data);
        digester.finalize_hex()
    }

    /// Every built-in checksum of `data`.
    pub fn digest_all(data: &[u8]) -> Checksums {
        Self::ALL
            .iter()
            .map(|alg| (alg.name().to_string(), alg.digest(data)))
            .collect()
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Adapter from any RustCrypto [`Digest`] to [`Digester`].
struct RustCryptoDigester<D> {
    name: &'static str,
    inner: D,
}

impl<D: Digest> RustCryptoDigester<D> {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            inner: D::new(),
        }
    }
}

impl<D: Digest + Send> Digester for RustCryptoDigester<D> {
    fn algorithm_name(&self) -> &str {
        self.name
    }

    fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.inner, data);
    }

    fn finalize_hex(self: Box<Self>) -> String {
        hex::encode(self.inner.finalize())
    }
}
