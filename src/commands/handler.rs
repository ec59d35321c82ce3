//! Command Handler
//!
//! Executes parsed commands against the store and decides what, if anything,
//! to send back.
//!
//! | Command   | Store call                        | Reply                    |
//! |-----------|-----------------------------------|--------------------------|
//! | `set`     | `put(.., require_existing=false)` | `STORED` / `NOT_STORED`  |
//! | `replace` | `put(.., require_existing=true)`  | `STORED` / `NOT_STORED`  |
//! | `get`     | `get(key)`                        | `VALUE ..` / `END`       |
//! | invalid   | none                              | none                     |

use crate::protocol::{Command, Response, StoreArgs};
use crate::storage::StorageEngine;
use bytes::Bytes;
use std::sync::Arc;
use tracing::debug;

/// Dispatches commands to the store.
///
/// Cheap to clone; every connection gets its own handle to the shared store.
#[derive(Debug, Clone)]
pub struct CommandHandler {
    storage: Arc<StorageEngine>,
}

impl CommandHandler {
    pub fn new(storage: Arc<StorageEngine>) -> Self {
        Self { storage }
    }

    /// Executes a command and returns the reply.
    ///
    /// `payload` is the value line read after a `set`/`replace` header; it is
    /// ignored for other commands.
    ///
    /// Returns `None` for [`Command::Invalid`]: malformed lines get no reply.
    pub fn execute(&self, command: Command, payload: Option<Bytes>) -> Option<Response> {
        match command {
            Command::Set(args) => Some(self.cmd_store(args, payload.unwrap_or_default(), false)),
            Command::Replace(args) => {
                Some(self.cmd_store(args, payload.unwrap_or_default(), true))
            }
            Command::Get { key } => Some(self.cmd_get(key)),
            Command::Invalid(reason) => {
                debug!(reason = %reason, "Ignoring malformed request");
                None
            }
        }
    }

    /// set / replace
    fn cmd_store(&self, args: StoreArgs, value: Bytes, require_existing: bool) -> Response {
        let StoreArgs {
            key,
            flags,
            exptime,
            byte_count,
        } = args;

        debug!(
            key = %key,
            flags = %flags,
            exptime,
            bytes = %byte_count,
            replace = require_existing,
            "Store request"
        );

        if self
            .storage
            .put(key, value, flags, exptime, byte_count, require_existing)
        {
            Response::Stored
        } else {
            Response::NotStored
        }
    }

    /// get
    fn cmd_get(&self, key: String) -> Response {
        debug!(key = %key, "Get request");

        match self.storage.get(&key) {
            Some(entry) => Response::Value {
                key,
                flags: entry.flags,
                byte_count: entry.byte_count,
                data: entry.value,
            },
            None => Response::End,
        }
    }
}
