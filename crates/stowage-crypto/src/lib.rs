//! Checksum primitives for Stowage.
//!
//! Every stored artifact gets a checksum set (algorithm name -> lower-case hex
//! digest) computed in the same pass that writes its bytes. Algorithms are
//! pluggable through the [`Digester`] trait; SHA-1 and MD5 are built in.
//!
//! Digest implementations come from the RustCrypto crates.

pub mod capture;
pub mod checksum;

pub use capture::ChecksumCapture;
pub use checksum::{ChecksumAlgorithm, Checksums, Digester};
