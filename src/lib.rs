//! # linecache - A Small In-Memory Cache Server
//!
//! linecache is an in-memory key-value cache that speaks a simplified
//! memcached text protocol over TCP. It serves many clients concurrently,
//! supports per-key expiry and `replace` (store only if the key exists).
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              linecache                                  │
//! │                                                                         │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐                  │
//! │  │ TCP Server  │───>│ Connection  │───>│  Command    │                  │
//! │  │ (Listener)  │    │  Handler    │    │  Handler    │                  │
//! │  └─────────────┘    └──────┬──────┘    └──────┬──────┘                  │
//! │                            │                  │                         │
//! │                            ▼                  ▼                         │
//! │  ┌─────────────┐    ┌──────────────────────────────────────────────┐   │
//! │  │  Header     │    │              StorageEngine                   │   │
//! │  │  Parser     │    │  ┌────────┐ ┌────────┐ ┌────────┐ ┌────────┐ │   │
//! │  │             │    │  │Shard 0 │ │Shard 1 │ │Shard 2 │ │...N    │ │   │
//! │  └─────────────┘    │  │RwLock  │ │RwLock  │ │RwLock  │ │shards  │ │   │
//! │                     │  └────────┘ └────────┘ └────────┘ └────────┘ │   │
//! │                     └──────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use linecache::{Config, Server, StorageEngine};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let storage = Arc::new(StorageEngine::new());
//!     let server = Server::bind(&Config::default(), storage).await?;
//!     server.run(async { let _ = tokio::signal::ctrl_c().await; }).await;
//!     Ok(())
//! }
//! ```
//!
//! ## Protocol
//!
//! | Client sends | Server replies |
//! |---|---|
//! | `set <key> <flags> <exptime> <bytes>\r\n<value>\r\n` | `STORED` or `NOT_STORED` |
//! | `replace <key> <flags> <exptime> <bytes>\r\n<value>\r\n` | `STORED` or `NOT_STORED` |
//! | `get <key>\r\n` | `VALUE <key> <flags> <bytes>\r\n<value>\r\n` or `END` |
//! | malformed line | nothing |
//!
//! `exptime` is relative seconds; 0 never expires, negative is already expired.
//!
//! ## Module Overview
//!
//! - [`protocol`]: request header parser and reply types
//! - [`storage`]: thread-safe store with lazy expiry
//! - [`commands`]: executes commands against the store
//! - [`connection`]: per-client read/execute/reply loop
//! - [`server`]: listener and accept loop
//! - [`config`]: command-line options
//!
//! ## Design Highlights
//!
//! ### Thread Safety
//!
//! The store is split into 64 shards, each behind its own `RwLock`. Every
//! operation on a key runs under that key's shard lock, so reads and writes of
//! a single key are linearizable across connections.
//!
//! ### Lazy Expiry
//!
//! There is no background sweeper. A `get` that finds an expired entry
//! removes it and reports a miss.

pub mod commands;
pub mod config;
pub mod connection;
pub mod protocol;
pub mod server;
pub mod storage;

pub use commands::CommandHandler;
pub use config::Config;
pub use connection::{handle_connection, ConnectionError};
pub use protocol::{parse_command, Command, ParseError, Response};
pub use server::Server;
pub use storage::{Entry, StorageEngine};

/// The default port linecache listens on (same as memcached)
pub const DEFAULT_PORT: u16 = 11211;

/// The default host linecache binds to (all interfaces)
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Version of linecache
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
