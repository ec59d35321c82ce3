//! TCP listener and accept loop.
//!
//! Binds the configured address and spawns one [`handle_connection`] task per
//! accepted client. There is no connection limit. Failing to bind is the only
//! error that stops the process; accept and per-connection errors are logged
//! and the server keeps going.

use crate::commands::CommandHandler;
use crate::config::Config;
use crate::connection::handle_connection;
use crate::storage::StorageEngine;
use anyhow::Context;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// A bound listener plus the store its connections share.
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    storage: Arc<StorageEngine>,
}

impl Server {
    /// Binds the address from `config`.
    pub async fn bind(config: &Config, storage: Arc<StorageEngine>) -> anyhow::Result<Self> {
        let address = config.bind_address();
        let listener = TcpListener::bind(&address)
            .await
            .with_context(|| format!("failed to bind {}", address))?;

        Ok(Self { listener, storage })
    }

    /// The address actually bound (useful with port 0).
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections until `shutdown` completes.
    ///
    /// Connection tasks already running are not waited for.
    pub async fn run(self, shutdown: impl Future<Output = ()>) {
        if let Ok(addr) = self.local_addr() {
            info!("Listening on {}", addr);
        }

        tokio::select! {
            _ = accept_loop(self.listener, self.storage) => {}
            _ = shutdown => {
                info!("Shutdown signal received, stopping server...");
            }
        }
    }
}

/// Main loop that accepts incoming connections
async fn accept_loop(listener: TcpListener, storage: Arc<StorageEngine>) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let handler = CommandHandler::new(Arc::clone(&storage));

                tokio::spawn(async move {
                    handle_connection(stream, addr, handler).await;
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
