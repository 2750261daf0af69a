//! Concurrent artifact storage for Stowage.
//!
//! [`ArtifactManager`] stores, fetches and deletes artifact content under a
//! storage root laid out as `<root>/<storage>/<repository>/<path>`. Every
//! artifact has an [`ArtifactEntry`] in an [`EntryDirectory`] carrying its
//! checksums, download count and tags.
//!
//! # Guarantees
//!
//! 1. Per-path linearizability: stores and deletes hold a path exclusively,
//!    fetches hold it shared for the lifetime of their stream. Readers never
//!    observe torn or interleaved content.
//! 2. Policy first: a denied operation leaves content and entries untouched.
//! 3. Group repositories are read-only views; fetches resolve to the first
//!    member holding the path.
//! 4. Each identity group (group id, artifact id, classifier) has exactly one
//!    `last-version` tag once any member is stored, on its highest version.
//! 5. A download is counted once per stream read to end, never for a stream
//!    dropped early.
//!
//! # Entry Directories
//!
//! - [`InMemoryEntryDirectory`]: `HashMap`-based directory for tests and
//!   embedding

pub mod config;
pub mod entry;
pub mod error;
pub mod group;
pub mod layout;
pub mod lock;
pub mod manager;
pub mod memory;
mod recorder;
pub mod stream;
mod tags;
pub mod traits;

pub use config::{RepositoryConfig, RepositoryRegistry, StorageConfig, StoreConfig};
pub use entry::{ArtifactEntry, LAST_VERSION};
pub use error::{Operation, StoreError, StoreResult};
pub use group::GroupResolver;
pub use layout::{StorageLayout, TRASH_DIR};
pub use lock::{LockGuard, LockRegistry, LockScope};
pub use manager::ArtifactManager;
pub use memory::InMemoryEntryDirectory;
pub use stream::ArtifactStream;
pub use traits::{EntryDirectory, EntryWrite};
