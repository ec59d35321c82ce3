//! Request Header Parser
//!
//! Turns one request line into a typed [`Command`]. The parser is pure: it
//! performs no I/O and never touches the store. Reading the payload line that
//! follows a `set`/`replace` header is the connection handler's job.
//!
//! ## Grammar
//!
//! ```text
//! set     <key> <flags> <exptime> <bytes>
//! replace <key> <flags> <exptime> <bytes>
//! get     <key>
//!
//! key     = [A-Za-z0-9_]+
//! flags   = [0-9]+          (kept as sent)
//! exptime = -?[0-9]+        (fits in i64)
//! bytes   = [0-9]+          (kept as sent)
//! ```
//!
//! Tokens are separated by ASCII whitespace and the keyword is case-sensitive
//! and must start the line. Tokens after the required ones are ignored.
//! Anything that does not match yields [`Command::Invalid`] carrying the reason.
//!
//! `flags` and `bytes` are only checked to be digits. The server never does
//! arithmetic on them, so they are stored and echoed exactly as written:
//! `007` stays `007` and there is no width limit.

use crate::protocol::types::{Command, StoreArgs};
use thiserror::Error;

/// Why a request line was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The line had no tokens
    #[error("empty line")]
    EmptyLine,

    /// Whitespace before the keyword
    #[error("leading whitespace before command")]
    LeadingWhitespace,

    /// The line is not valid UTF-8
    #[error("invalid UTF-8: {0}")]
    InvalidUtf8(String),

    /// The first token is not a known command
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// Too few arguments for the command
    #[error("wrong number of arguments for '{command}': expected {expected}, got {got}")]
    WrongArgCount {
        command: &'static str,
        expected: usize,
        got: usize,
    },

    /// The key contains characters other than ASCII word characters
    #[error("invalid key: {0:?}")]
    InvalidKey(String),

    /// A numeric field is malformed (or, for exptime, out of range)
    #[error("invalid {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Parses a raw header line (terminator already stripped).
///
/// Never fails: malformed input becomes [`Command::Invalid`].
///
/// # Example
///
/// ```
/// use linecache::protocol::{parse_command, Command};
///
/// let command = parse_command(b"get greeting");
/// assert_eq!(command, Command::Get { key: "greeting".to_string() });
///
/// assert!(matches!(parse_command(b"foo bar"), Command::Invalid(_)));
/// ```
pub fn parse_command(line: &[u8]) -> Command {
    let parsed = std::str::from_utf8(line)
        .map_err(|e| ParseError::InvalidUtf8(e.to_string()))
        .and_then(parse_header);

    match parsed {
        Ok(command) => command,
        Err(e) => Command::Invalid(e),
    }
}

/// Parses a header line into a command, reporting why it was rejected.
///
/// Never returns [`Command::Invalid`]; rejections come back as `Err`.
pub fn parse_header(line: &str) -> ParseResult<Command> {
    let tokens: Vec<&str> = line.split_ascii_whitespace().collect();

    let (&name, args) = tokens.split_first().ok_or(ParseError::EmptyLine)?;
    if !line.starts_with(name) {
        return Err(ParseError::LeadingWhitespace);
    }

    match name {
        "set" => parse_store_args("set", args).map(Command::Set),
        "replace" => parse_store_args("replace", args).map(Command::Replace),
        "get" => {
            require_args("get", args, 1)?;
            let key = parse_key(args[0])?;
            Ok(Command::Get { key })
        }
        other => Err(ParseError::UnknownCommand(other.to_string())),
    }
}

/// `<key> <flags> <exptime> <bytes>`
fn parse_store_args(command: &'static str, args: &[&str]) -> ParseResult<StoreArgs> {
    require_args(command, args, 4)?;

    Ok(StoreArgs {
        key: parse_key(args[0])?,
        flags: parse_digits("flags", args[1])?,
        exptime: parse_signed("exptime", args[2])?,
        byte_count: parse_digits("bytes", args[3])?,
    })
}

fn require_args(command: &'static str, args: &[&str], expected: usize) -> ParseResult<()> {
    if args.len() < expected {
        return Err(ParseError::WrongArgCount {
            command,
            expected,
            got: args.len(),
        });
    }
    Ok(())
}

fn parse_key(token: &str) -> ParseResult<String> {
    if is_word(token) {
        Ok(token.to_string())
    } else {
        Err(ParseError::InvalidKey(token.to_string()))
    }
}

/// Returns true if `token` is non-empty and made of `[A-Za-z0-9_]`.
#[inline]
fn is_word(token: &str) -> bool {
    !token.is_empty()
        && token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

#[inline]
fn is_digits(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

/// Accepts `[0-9]+` and returns the token untouched. A leading `+` or `-`
/// is rejected.
fn parse_digits(field: &'static str, token: &str) -> ParseResult<String> {
    if is_digits(token) {
        Ok(token.to_string())
    } else {
        Err(ParseError::InvalidNumber {
            field,
            value: token.to_string(),
        })
    }
}

/// Parses `-?[0-9]+`.
fn parse_signed(field: &'static str, token: &str) -> ParseResult<i64> {
    let invalid = || ParseError::InvalidNumber {
        field,
        value: token.to_string(),
    };

    let digits = token.strip_prefix('-').unwrap_or(token);
    if !is_digits(digits) {
        return Err(invalid());
    }
    token.parse().map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_args(key: &str, flags: &str, exptime: i64, byte_count: &str) -> StoreArgs {
        StoreArgs {
            key: key.to_string(),
            flags: flags.to_string(),
            exptime,
            byte_count: byte_count.to_string(),
        }
    }

    #[test]
    fn test_parse_set() {
        assert_eq!(
            parse_header("set k 0 0 3"),
            Ok(Command::Set(store_args("k", "0", 0, "3")))
        );
    }

    #[test]
    fn test_parse_replace() {
        assert_eq!(
            parse_header("replace user_101 7 3600 42"),
            Ok(Command::Replace(store_args("user_101", "7", 3600, "42")))
        );
    }

    #[test]
    fn test_parse_get() {
        assert_eq!(
            parse_header("get k"),
            Ok(Command::Get {
                key: "k".to_string()
            })
        );
    }

    #[test]
    fn test_negative_exptime_is_accepted() {
        assert_eq!(
            parse_header("set k 0 -1 3"),
            Ok(Command::Set(store_args("k", "0", -1, "3")))
        );
    }

    #[test]
    fn test_extra_whitespace() {
        assert_eq!(
            parse_header("set \t k   1  2 3"),
            Ok(Command::Set(store_args("k", "1", 2, "3")))
        );
    }

    #[test]
    fn test_leading_whitespace_is_rejected() {
        assert_eq!(parse_header(" get a"), Err(ParseError::LeadingWhitespace));
        assert_eq!(
            parse_header("\tset k 0 0 1"),
            Err(ParseError::LeadingWhitespace)
        );
    }

    #[test]
    fn test_only_ascii_whitespace_separates_tokens() {
        // U+00A0 is not a separator, so this is one unknown token
        assert_eq!(
            parse_header("get\u{a0}a"),
            Err(ParseError::UnknownCommand("get\u{a0}a".to_string()))
        );
        assert_eq!(
            parse_header("get a\u{3000}"),
            Err(ParseError::InvalidKey("a\u{3000}".to_string()))
        );
        assert_eq!(
            parse_header("get\x0ca"),
            Ok(Command::Get {
                key: "a".to_string()
            })
        );
    }

    #[test]
    fn test_trailing_tokens_are_ignored() {
        assert_eq!(
            parse_header("set k 0 0 3 noreply"),
            Ok(Command::Set(store_args("k", "0", 0, "3")))
        );
        assert_eq!(
            parse_header("get a b"),
            Ok(Command::Get {
                key: "a".to_string()
            })
        );
    }

    #[test]
    fn test_keyword_is_case_sensitive() {
        assert_eq!(
            parse_header("GET k"),
            Err(ParseError::UnknownCommand("GET".to_string()))
        );
        assert_eq!(
            parse_header("Set k 0 0 1"),
            Err(ParseError::UnknownCommand("Set".to_string()))
        );
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            parse_header("foo bar"),
            Err(ParseError::UnknownCommand("foo".to_string()))
        );
        // The keyword must be a whole token
        assert!(parse_header("setx k 0 0 1").is_err());
    }

    #[test]
    fn test_empty_line() {
        assert_eq!(parse_header(""), Err(ParseError::EmptyLine));
        assert_eq!(parse_header("   "), Err(ParseError::EmptyLine));
    }

    #[test]
    fn test_missing_arguments() {
        assert_eq!(
            parse_header("set k 0 0"),
            Err(ParseError::WrongArgCount {
                command: "set",
                expected: 4,
                got: 3
            })
        );
        assert_eq!(
            parse_header("get"),
            Err(ParseError::WrongArgCount {
                command: "get",
                expected: 1,
                got: 0
            })
        );
    }

    #[test]
    fn test_invalid_key() {
        assert_eq!(
            parse_header("get foo-bar"),
            Err(ParseError::InvalidKey("foo-bar".to_string()))
        );
        assert!(parse_header("set k:1 0 0 1").is_err());
        assert!(parse_header("get ключ").is_err());
    }

    #[test]
    fn test_invalid_numbers() {
        // flags and bytes are unsigned
        assert!(parse_header("set k -1 0 3").is_err());
        assert!(parse_header("set k 0 0 -3").is_err());
        // no explicit sign
        assert!(parse_header("set k +1 0 3").is_err());
        assert!(parse_header("set k 0 +1 3").is_err());
        // not numbers
        assert!(parse_header("set k a 0 3").is_err());
        assert!(parse_header("set k 0 - 3").is_err());
        assert!(parse_header("set k 0 0 3x").is_err());
    }

    #[test]
    fn test_flags_and_bytes_are_kept_verbatim() {
        assert_eq!(
            parse_header("set a 007 0 03"),
            Ok(Command::Set(store_args("a", "007", 0, "03")))
        );
        assert_eq!(
            parse_header("set b 4294967296 0 3"),
            Ok(Command::Set(store_args("b", "4294967296", 0, "3")))
        );
        assert_eq!(
            parse_header("replace c 0 0 99999999999999999999999"),
            Ok(Command::Replace(store_args(
                "c",
                "0",
                0,
                "99999999999999999999999"
            )))
        );
    }

    #[test]
    fn test_exptime_out_of_range() {
        assert_eq!(
            parse_header("set k 0 9223372036854775808 1"),
            Err(ParseError::InvalidNumber {
                field: "exptime",
                value: "9223372036854775808".to_string()
            })
        );
        assert!(parse_header("set k 0 9223372036854775807 1").is_ok());
    }

    #[test]
    fn test_parse_command_wraps_errors() {
        assert_eq!(
            parse_command(b"foo bar"),
            Command::Invalid(ParseError::UnknownCommand("foo".to_string()))
        );
        assert!(matches!(
            parse_command(b"get \xff\xfe"),
            Command::Invalid(ParseError::InvalidUtf8(_))
        ));
        assert_eq!(
            parse_command(b"get k"),
            Command::Get {
                key: "k".to_string()
            }
        );
    }
}
