//! Keyed shared/exclusive locks.
//!
//! Locks are created on first use and reclaimed when the last guard for a
//! key is released, so the registry only ever holds locks that are in use.
//!
//! Shared guards are recursive: a thread already holding a key shared can
//! take it shared again even while a writer is queued on it.
//!
//! Acquisition order across scopes is fixed: `Path` before `Identity`
//! before `Entry`. Several `Entry` locks are always taken in sorted key
//! order.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::lock_api::{ArcRwLockReadGuard, ArcRwLockWriteGuard};
use parking_lot::{RawRwLock, RwLock};
use stowage_types::{ArtifactIdentity, RepositoryKey, RepositoryPath};

/// What a lock key protects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LockScope {
    /// Stored content at a path.
    Path,
    /// The artifact entry of a path.
    Entry,
    /// Last-version state of one identity group.
    Identity,
}

type LockKey = (LockScope, String);
type LockTable = DashMap<LockKey, Arc<RwLock<()>>>;

/// Registry of keyed reader/writer locks.
///
/// Cloning is cheap; clones share the same table.
#[derive(Clone, Default)]
pub struct LockRegistry {
    locks: Arc<LockTable>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until `key` is held shared.
    pub fn read(&self, scope: LockScope, key: &str) -> LockGuard {
        let key = (scope, key.to_string());
        let held = Held::Read(self.handle(&key).read_arc_recursive());
        LockGuard::new(held, self.locks.clone(), key)
    }

    /// Block until `key` is held exclusively.
    pub fn write(&self, scope: LockScope, key: &str) -> LockGuard {
        let key = (scope, key.to_string());
        let held = Held::Write(self.handle(&key).write_arc());
        LockGuard::new(held, self.locks.clone(), key)
    }

    /// Number of keys with a live lock.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    fn handle(&self, key: &LockKey) -> Arc<RwLock<()>> {
        self.locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(RwLock::new(())))
            .clone()
    }
}

impl fmt::Debug for LockRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockRegistry")
            .field("live", &self.locks.len())
            .finish()
    }
}

enum Held {
    Read(#[allow(dead_code)] ArcRwLockReadGuard<RawRwLock, ()>),
    Write(#[allow(dead_code)] ArcRwLockWriteGuard<RawRwLock, ()>),
}

/// A held lock. Releasing the last guard of a key drops the key's lock.
pub struct LockGuard {
    held: Option<Held>,
    locks: Arc<LockTable>,
    key: LockKey,
}

impl LockGuard {
    fn new(held: Held, locks: Arc<LockTable>, key: LockKey) -> Self {
        Self {
            held: Some(held),
            locks,
            key,
        }
    }

    pub fn scope(&self) -> LockScope {
        self.key.0
    }

    pub fn is_exclusive(&self) -> bool {
        matches!(self.held, Some(Held::Write(_)))
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        self.held.take();
        // The table's own handle is the only one left once no guard or
        // waiter references the lock. `remove_if` runs under the shard lock,
        // which `handle` also takes, so a concurrent acquirer either already
        // holds a clone or will create a fresh lock.
        self.locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl fmt::Debug for LockGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockGuard")
            .field("scope", &self.key.0)
            .field("key", &self.key.1)
            .field("exclusive", &self.is_exclusive())
            .finish()
    }
}

/// Key for `Path` and `Entry` locks.
pub fn path_key(path: &RepositoryPath) -> String {
    path.to_string()
}

/// Key for `Identity` locks.
pub fn identity_key(repository: &RepositoryKey, identity: &ArtifactIdentity) -> String {
    format!("{repository}/{identity}")
}
