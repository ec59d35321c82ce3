//! Command Handler Module
//!
//! This module sits between the protocol parser and the store. It receives a
//! parsed [`Command`](crate::protocol::Command) plus its payload line,
//! executes it against the [`StorageEngine`](crate::storage::StorageEngine)
//! and returns the reply to send, if any.
//!
//! ## Architecture
//!
//! ```text
//! Client Request
//!       │
//!       ▼
//! ┌─────────────────┐
//! │ Header Parser   │  (protocol module)
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ CommandHandler  │  (this module)
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ StorageEngine   │  (storage module)
//! └─────────────────┘
//! ```

pub mod handler;

pub use handler::CommandHandler;
