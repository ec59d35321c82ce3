//! Storage Module
//!
//! The shared cache store: a sharded, lock-protected map from key to
//! [`Entry`], with lazy per-key expiry.
//!
//! ## Features
//!
//! - **Sharded Storage**: 64 independent shards reduce lock contention
//! - **RwLock**: Multiple concurrent readers, exclusive writers
//! - **Lazy Expiry**: Expired keys are evicted by the lookup that finds them
//! - **Injectable Clock**: Tests drive expiry with a [`ManualClock`]
//!
//! ## Example
//!
//! ```
//! use linecache::storage::{ManualClock, StorageEngine};
//! use bytes::Bytes;
//! use std::sync::Arc;
//!
//! let clock = Arc::new(ManualClock::new(1_000));
//! let engine = StorageEngine::with_clock(clock.clone());
//!
//! engine.put("session".into(), Bytes::from("token123"), "0".into(), 60, "8".into(), false);
//! assert!(engine.get("session").is_some());
//!
//! clock.advance(60);
//! assert!(engine.get("session").is_none());
//! ```

pub mod clock;
pub mod engine;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{Entry, StorageEngine, StorageStats};
