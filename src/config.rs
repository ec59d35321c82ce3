//! Server configuration, parsed from the command line.

use crate::{DEFAULT_HOST, DEFAULT_PORT};
use clap::Parser;

/// Command-line options.
#[derive(Debug, Clone, Parser, PartialEq, Eq)]
#[command(
    name = "linecache",
    version,
    about = "In-memory cache server speaking a memcached-style text protocol"
)]
pub struct Config {
    /// Host to bind to
    #[arg(long, default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Log filter (e.g. "info", "linecache=debug"); RUST_LOG takes precedence
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Returns the bind address as a string
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
