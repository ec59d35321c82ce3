//! linecache - in-memory cache server
//!
//! Entry point: parses options, sets up logging, binds the listener and
//! serves until Ctrl+C.

use clap::Parser;
use linecache::{Config, Server, StorageEngine};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn print_banner(config: &Config) {
    println!(
        r#"
linecache v{} - in-memory cache server
──────────────────────────────────────
Server started on {}
Ready to accept connections.

Use Ctrl+C to shutdown gracefully.
"#,
        linecache::VERSION,
        config.bind_address()
    );
}

/// Completes on Ctrl+C. If the handler cannot be installed, never completes.
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // RUST_LOG wins over --log-level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    let storage = Arc::new(StorageEngine::new());

    // A bind failure ends the process
    let server = Server::bind(&config, Arc::clone(&storage)).await?;
    print_banner(&config);

    server.run(shutdown_signal()).await;

    let stats = storage.stats();
    info!(
        keys = stats.keys,
        gets = stats.get_ops,
        hits = stats.hits,
        misses = stats.misses,
        sets = stats.set_ops,
        rejected = stats.rejected,
        expired = stats.expired,
        "Server shutdown complete"
    );
    Ok(())
}
