//! Text Protocol Implementation
//!
//! This module implements the memcached-style text protocol spoken by the
//! server: request header parsing and reply serialization.
//!
//! ## Modules
//!
//! - `types`: `Command`, `StoreArgs` and `Response`
//! - `parser`: header line -> `Command`
//!
//! ## Example
//!
//! ```
//! use linecache::protocol::{parse_command, Command, Response};
//! use bytes::Bytes;
//!
//! // Parsing a request header
//! let command = parse_command(b"set name 0 0 5");
//! assert!(command.expects_payload());
//!
//! // Creating replies
//! let reply = Response::Value {
//!     key: "name".to_string(),
//!     flags: "0".to_string(),
//!     byte_count: "5".to_string(),
//!     data: Bytes::from("alice"),
//! };
//! assert_eq!(reply.serialize(), b"VALUE name 0 5\r\nalice\r\n");
//! ```

pub mod parser;
pub mod types;

pub use parser::{parse_command, parse_header, ParseError, ParseResult};
pub use types::{Command, Response, StoreArgs};
