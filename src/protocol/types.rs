//! Text Protocol Data Types
//!
//! This module defines the requests the server understands and the replies it
//! sends back. Everything on the wire is a line of text terminated by CRLF.
//!
//! ## Requests
//!
//! ```text
//! set <key> <flags> <exptime> <bytes>\r\n<value>\r\n
//! replace <key> <flags> <exptime> <bytes>\r\n<value>\r\n
//! get <key>\r\n
//! ```
//!
//! ## Replies
//!
//! ```text
//! STORED\r\n
//! NOT_STORED\r\n
//! END\r\n
//! VALUE <key> <flags> <bytes>\r\n<value>\r\n
//! ```

use crate::protocol::parser::ParseError;
use bytes::Bytes;
use std::fmt;

/// The CRLF terminator used on the wire
pub const CRLF: &[u8] = b"\r\n";

/// Reply keywords
pub mod reply {
    pub const STORED: &[u8] = b"STORED\r\n";
    pub const NOT_STORED: &[u8] = b"NOT_STORED\r\n";
    pub const END: &[u8] = b"END\r\n";
    pub const VALUE: &[u8] = b"VALUE ";
}

/// Arguments shared by the storage commands (`set` and `replace`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreArgs {
    pub key: String,
    /// Opaque client metadata, kept as the digits the client sent
    pub flags: String,
    /// Seconds until expiry; 0 = never, negative = already expired
    pub exptime: i64,
    /// Declared payload length, kept as sent and never checked
    pub byte_count: String,
}

/// A parsed request header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Store unconditionally.
    Set(StoreArgs),

    /// Store only if the key already exists.
    Replace(StoreArgs),

    /// Retrieve a single key.
    Get { key: String },

    /// A line that matched no known command. The server sends no reply.
    Invalid(ParseError),
}

impl Command {
    /// Returns the storage arguments if this command is followed by a payload line.
    pub fn store_args(&self) -> Option<&StoreArgs> {
        match self {
            Command::Set(args) | Command::Replace(args) => Some(args),
            _ => None,
        }
    }

    /// Returns true if a payload line follows this header on the wire.
    pub fn expects_payload(&self) -> bool {
        self.store_args().is_some()
    }

    /// Command name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Set(_) => "set",
            Command::Replace(_) => "replace",
            Command::Get { .. } => "get",
            Command::Invalid(_) => "invalid",
        }
    }
}

/// A reply sent back to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// The write was applied
    Stored,

    /// The write was rejected by store policy
    NotStored,

    /// `get` found nothing (missing or expired)
    End,

    /// `get` found a live entry
    Value {
        key: String,
        flags: String,
        byte_count: String,
        data: Bytes,
    },
}

impl Response {
    /// Serializes the reply to bytes for sending over the wire.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.serialize_into(&mut buf);
        buf
    }

    /// Serializes the reply into an existing buffer.
    pub fn serialize_into(&self, buf: &mut Vec<u8>) {
        match self {
            Response::Stored => buf.extend_from_slice(reply::STORED),
            Response::NotStored => buf.extend_from_slice(reply::NOT_STORED),
            Response::End => buf.extend_from_slice(reply::END),
            Response::Value {
                key,
                flags,
                byte_count,
                data,
            } => {
                buf.extend_from_slice(reply::VALUE);
                buf.extend_from_slice(key.as_bytes());
                buf.push(b' ');
                buf.extend_from_slice(flags.as_bytes());
                buf.push(b' ');
                buf.extend_from_slice(byte_count.as_bytes());
                buf.extend_from_slice(CRLF);
                buf.extend_from_slice(data);
                buf.extend_from_slice(CRLF);
            }
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Stored => write!(f, "STORED"),
            Response::NotStored => write!(f, "NOT_STORED"),
            Response::End => write!(f, "END"),
            Response::Value {
                key,
                flags,
                byte_count,
                ..
            } => write!(f, "VALUE {} {} {}", key, flags, byte_count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_replies() {
        assert_eq!(Response::Stored.serialize(), b"STORED\r\n");
        assert_eq!(Response::NotStored.serialize(), b"NOT_STORED\r\n");
        assert_eq!(Response::End.serialize(), b"END\r\n");
    }

    #[test]
    fn test_value_reply() {
        let value = Response::Value {
            key: "k".to_string(),
            flags: "12".to_string(),
            byte_count: "3".to_string(),
            data: Bytes::from("abc"),
        };
        assert_eq!(value.serialize(), b"VALUE k 12 3\r\nabc\r\n");
        assert_eq!(value.to_string(), "VALUE k 12 3");
    }

    #[test]
    fn test_value_reply_echoes_declared_length() {
        let value = Response::Value {
            key: "k".to_string(),
            flags: "0".to_string(),
            byte_count: "10".to_string(),
            data: Bytes::from("abc"),
        };
        assert_eq!(value.serialize(), b"VALUE k 0 10\r\nabc\r\n");
    }

    #[test]
    fn test_value_reply_echoes_tokens_verbatim() {
        let value = Response::Value {
            key: "k".to_string(),
            flags: "0042".to_string(),
            byte_count: "003".to_string(),
            data: Bytes::from("abc"),
        };
        assert_eq!(value.serialize(), b"VALUE k 0042 003\r\nabc\r\n");
    }

    #[test]
    fn test_command_payload() {
        let args = StoreArgs {
            key: "k".to_string(),
            flags: "0".to_string(),
            exptime: 0,
            byte_count: "1".to_string(),
        };
        assert!(Command::Set(args.clone()).expects_payload());
        assert!(Command::Replace(args).expects_payload());
        assert!(!Command::Get { key: "k".into() }.expects_payload());
        assert!(!Command::Invalid(ParseError::EmptyLine).expects_payload());
    }
}
