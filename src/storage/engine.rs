//! Thread-Safe Cache Store with Lazy Expiry
//!
//! This module implements the shared store behind every client connection.
//! It maps keys to [`Entry`] values carrying the client's opaque flags, the
//! declared byte count and an optional absolute expiry time.
//!
//! ## Design Decisions
//!
//! 1. **Sharded Locks**: Instead of one big lock, keys are spread over 64 shards.
//! 2. **Lazy Expiry**: Entries are only checked for expiry when looked up. There is
//!    no background sweeper; an expired entry lingers until a lookup evicts it.
//! 3. **RwLock per shard**: Concurrent readers, exclusive writers. Every operation
//!    on a key holds that key's shard lock, so single-key operations are linearizable.
//!
//! ## Concurrency Model
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     StorageEngine                           │
//! │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐           │
//! │  │ Shard 0 │ │ Shard 1 │ │ Shard 2 │ │ Shard N │           │
//! │  │ RwLock  │ │ RwLock  │ │ RwLock  │ │ RwLock  │           │
//! │  │ HashMap │ │ HashMap │ │ HashMap │ │ HashMap │           │
//! │  └─────────┘ └─────────┘ └─────────┘ └─────────┘           │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use crate::storage::clock::{Clock, SystemClock};
use bytes::Bytes;
use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::trace;

/// Number of shards for the store.
/// More shards = less lock contention, but more memory overhead.
const NUM_SHARDS: usize = 64;

/// One stored value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// The payload line sent by the client
    pub value: Bytes,
    /// Opaque client metadata, echoed back byte for byte
    pub flags: String,
    /// Absolute Unix time (seconds) at which the entry expires (None = never)
    pub expires_at: Option<i64>,
    /// Length declared by the client; echoed back, never checked against `value`
    pub byte_count: String,
}

impl Entry {
    /// Checks if this entry has expired at time `now`.
    #[inline]
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at.map(|exp| now >= exp).unwrap_or(false)
    }
}

/// A single shard containing a portion of the key-value pairs.
#[derive(Debug, Default)]
struct Shard {
    data: RwLock<HashMap<String, Entry>>,
}

impl Shard {
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Entry>> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Entry>> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The cache store shared by all connections.
///
/// Wrap it in an `Arc` and hand a clone to each connection task.
///
/// # Example
///
/// ```
/// use linecache::storage::StorageEngine;
/// use bytes::Bytes;
///
/// let engine = StorageEngine::new();
///
/// assert!(engine.put("name".into(), Bytes::from("alice"), "7".into(), 0, "5".into(), false));
///
/// let entry = engine.get("name").unwrap();
/// assert_eq!(entry.value, Bytes::from("alice"));
/// assert_eq!(entry.flags, "7");
///
/// // replace only works on keys that already exist
/// assert!(!engine.put("other".into(), Bytes::from("x"), "0".into(), 0, "1".into(), true));
/// ```
pub struct StorageEngine {
    shards: Vec<Shard>,

    /// Source of "now" for expiry
    clock: Arc<dyn Clock>,

    /// Statistics: number of resident keys (approximate)
    key_count: AtomicU64,

    /// Statistics: total lookups
    get_count: AtomicU64,

    /// Statistics: lookups that found a live entry
    hit_count: AtomicU64,

    /// Statistics: successful stores
    set_count: AtomicU64,

    /// Statistics: stores rejected because the key was missing
    rejected_count: AtomicU64,

    /// Statistics: entries evicted because they had expired
    expired_count: AtomicU64,
}

impl std::fmt::Debug for StorageEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageEngine")
            .field("shards", &self.shards.len())
            .field("clock", &self.clock)
            .field("key_count", &self.key_count.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for StorageEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageEngine {
    /// Creates an empty store that reads time from the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty store with a custom time source.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let shards = (0..NUM_SHARDS).map(|_| Shard::default()).collect();

        Self {
            shards,
            clock,
            key_count: AtomicU64::new(0),
            get_count: AtomicU64::new(0),
            hit_count: AtomicU64::new(0),
            set_count: AtomicU64::new(0),
            rejected_count: AtomicU64::new(0),
            expired_count: AtomicU64::new(0),
        }
    }

    #[inline]
    fn shard_index(&self, key: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() as usize) % NUM_SHARDS
    }

    #[inline]
    fn get_shard(&self, key: &str) -> &Shard {
        &self.shards[self.shard_index(key)]
    }

    /// Converts a relative exptime from the wire into an absolute expiry.
    ///
    /// Zero means "never". Anything else is added to the current time, so a
    /// negative value produces a timestamp that has already passed.
    fn expiry_from(&self, exptime: i64) -> Option<i64> {
        if exptime == 0 {
            None
        } else {
            Some(self.clock.now().saturating_add(exptime))
        }
    }

    /// Stores `value` under `key`.
    ///
    /// With `require_existing` set (the `replace` command), the store is
    /// refused unless a live entry already exists for `key`. The check and the
    /// write happen under the same shard lock.
    ///
    /// # Returns
    ///
    /// Returns `true` if the entry was stored, `false` if it was rejected.
    pub fn put(
        &self,
        key: String,
        value: Bytes,
        flags: String,
        exptime: i64,
        byte_count: String,
        require_existing: bool,
    ) -> bool {
        let expires_at = self.expiry_from(exptime);
        let now = self.clock.now();

        let shard = self.get_shard(&key);
        let mut data = shard.write();

        let existing_live = match data.get(&key).map(|entry| entry.is_expired_at(now)) {
            Some(true) => {
                if require_existing {
                    // Evict on the way out; a dead entry does not satisfy replace
                    data.remove(&key);
                    self.key_count.fetch_sub(1, Ordering::Relaxed);
                    self.expired_count.fetch_add(1, Ordering::Relaxed);
                }
                false
            }
            Some(false) => true,
            None => false,
        };

        if require_existing && !existing_live {
            self.rejected_count.fetch_add(1, Ordering::Relaxed);
            trace!(key = %key, "Store rejected, key not present");
            return false;
        }

        let entry = Entry {
            value,
            flags,
            expires_at,
            byte_count,
        };
        if data.insert(key, entry).is_none() {
            self.key_count.fetch_add(1, Ordering::Relaxed);
        }
        self.set_count.fetch_add(1, Ordering::Relaxed);

        true
    }

    /// Looks up the entry for `key`.
    ///
    /// Returns `None` if the key doesn't exist or has expired.
    /// An expired entry is removed by the lookup that finds it.
    pub fn get(&self, key: &str) -> Option<Entry> {
        self.get_count.fetch_add(1, Ordering::Relaxed);

        let shard = self.get_shard(key);
        let now = self.clock.now();

        // Fast path under the read lock
        {
            let data = shard.read();
            match data.get(key) {
                Some(entry) if !entry.is_expired_at(now) => {
                    self.hit_count.fetch_add(1, Ordering::Relaxed);
                    return Some(entry.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }

        // Expired: re-check under the write lock before removing
        let mut data = shard.write();
        match data.get(key).map(|entry| entry.is_expired_at(now)) {
            Some(true) => {
                data.remove(key);
                self.key_count.fetch_sub(1, Ordering::Relaxed);
                self.expired_count.fetch_add(1, Ordering::Relaxed);
                trace!(key = %key, "Evicted expired entry");
                None
            }
            // Another connection stored a fresh entry in between
            Some(false) => {
                self.hit_count.fetch_add(1, Ordering::Relaxed);
                data.get(key).cloned()
            }
            None => None,
        }
    }

    /// Removes `key` regardless of its expiry.
    ///
    /// Returns `true` if the key was present.
    pub fn delete(&self, key: &str) -> bool {
        let shard = self.get_shard(key);
        let mut data = shard.write();

        if data.remove(key).is_some() {
            self.key_count.fetch_sub(1, Ordering::Relaxed);
            true
        } else {
            false
        }
    }

    /// Checks whether `key` is resident, without applying lazy expiry.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get_shard(key).read().contains_key(key)
    }

    /// Returns the approximate number of resident keys, expired ones included.
    pub fn len(&self) -> u64 {
        self.key_count.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns store statistics.
    pub fn stats(&self) -> StorageStats {
        let get_ops = self.get_count.load(Ordering::Relaxed);
        let hits = self.hit_count.load(Ordering::Relaxed);
        StorageStats {
            keys: self.key_count.load(Ordering::Relaxed),
            get_ops,
            hits,
            misses: get_ops.saturating_sub(hits),
            set_ops: self.set_count.load(Ordering::Relaxed),
            rejected: self.rejected_count.load(Ordering::Relaxed),
            expired: self.expired_count.load(Ordering::Relaxed),
        }
    }
}

/// Store statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageStats {
    pub keys: u64,
    pub get_ops: u64,
    pub hits: u64,
    pub misses: u64,
    pub set_ops: u64,
    pub rejected: u64,
    pub expired: u64,
}
