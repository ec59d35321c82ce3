//! Connection Handler Module
//!
//! This module handles individual client connections. Each client gets its
//! own task that runs a loop reading requests and sending replies.
//!
//! ## Connection Lifecycle
//!
//! ```text
//! 1. Client connects (TCP handshake)
//!        │
//!        ▼
//! 2. ConnectionHandler spawned
//!        │
//!        ▼
//! 3. ┌──────────────────────────────────┐
//!    │      AwaitHeader                 │
//!    │                                  │
//!    │  ┌─────────────────────────────┐ │
//!    │  │ Read header line            │ │
//!    │  └───────────┬─────────────────┘ │
//!    │              ▼                   │
//!    │  ┌─────────────────────────────┐ │
//!    │  │ Parse header                │ │
//!    │  └───────────┬─────────────────┘ │
//!    │              ▼                   │
//!    │  ┌─────────────────────────────┐ │
//!    │  │ set/replace: read payload   │ │
//!    │  └───────────┬─────────────────┘ │
//!    │              ▼                   │
//!    │  ┌─────────────────────────────┐ │
//!    │  │ Execute, send reply (if any)│ │
//!    │  └───────────┬─────────────────┘ │
//!    │              ▼                   │
//!    │         [Loop back]              │
//!    └──────────────────────────────────┘
//!        │
//!        ▼
//! 4. Client disconnects / error  ->  Closed
//! ```
//!
//! ## Framing
//!
//! Requests are newline-terminated lines; a trailing `\r` is stripped. TCP
//! may deliver half a line or several lines at once, so incoming bytes are
//! accumulated in a `BytesMut` and lines are split off as they complete.
//! Bytes left over after a line stay buffered for the next request.

use crate::commands::CommandHandler;
use crate::protocol::{parse_command, Response};
use bytes::{Bytes, BytesMut};
use std::net::SocketAddr;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;
use tracing::{debug, error, info, trace, warn};

/// Longest line accepted before the connection is dropped (64 KB)
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Initial buffer capacity
const INITIAL_BUFFER_SIZE: usize = 4096;

/// Handles a single client connection.
///
/// Generic over the stream so the loop can run against in-memory mocks in
/// tests; the server always uses a [`TcpStream`].
pub struct ConnectionHandler<S = TcpStream> {
    /// The client stream, write side buffered
    stream: BufWriter<S>,

    /// Client's address (for logging)
    addr: SocketAddr,

    /// Bytes received but not yet consumed as lines
    buffer: BytesMut,

    /// The command handler (shares the store with every other connection)
    command_handler: CommandHandler,
}

impl<S> ConnectionHandler<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new connection handler.
    ///
    /// # Arguments
    ///
    /// * `stream` - The client stream for this connection
    /// * `addr` - The client's socket address
    /// * `command_handler` - The command handler for executing commands
    pub fn new(stream: S, addr: SocketAddr, command_handler: CommandHandler) -> Self {
        Self {
            stream: BufWriter::new(stream),
            addr,
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_SIZE),
            command_handler,
        }
    }

    /// Runs the connection loop until the client disconnects or an error occurs.
    ///
    /// A client that closes between requests ends the loop with `Ok(())`.
    pub async fn run(mut self) -> Result<(), ConnectionError> {
        info!(client = %self.addr, "Client connected");

        let result = self.main_loop().await;

        match &result {
            Ok(()) => info!(client = %self.addr, "Client disconnected"),
            Err(ConnectionError::Io(io_err))
                if io_err.kind() == std::io::ErrorKind::ConnectionReset =>
            {
                debug!(client = %self.addr, "Connection reset by client")
            }
            Err(e) => warn!(client = %self.addr, error = %e, "Connection error"),
        }

        result
    }

    /// The read-execute-respond loop. One request is fully answered before
    /// the next header is read.
    async fn main_loop(&mut self) -> Result<(), ConnectionError> {
        loop {
            let header = match self.read_line().await {
                Ok(line) => line,
                Err(ConnectionError::ClientDisconnected) => return Ok(()),
                Err(e) => return Err(e),
            };
            let command = parse_command(&header);
            trace!(client = %self.addr, command = command.name(), "Parsed header");

            // The payload line is consumed even if the store will reject it
            let payload = if command.expects_payload() {
                match self.read_line().await {
                    Ok(line) => Some(line),
                    Err(ConnectionError::ClientDisconnected) => {
                        return Err(ConnectionError::UnexpectedEof)
                    }
                    Err(e) => return Err(e),
                }
            } else {
                None
            };

            match self.command_handler.execute(command, payload) {
                Some(response) => self.send_response(&response).await?,
                None => {
                    debug!(
                        client = %self.addr,
                        line = %String::from_utf8_lossy(&header),
                        "Dropped malformed request"
                    );
                }
            }
        }
    }

    /// Reads the next complete line, without its terminator.
    async fn read_line(&mut self) -> Result<Bytes, ConnectionError> {
        loop {
            if let Some(line) = self.try_take_line() {
                return Ok(line);
            }
            self.read_more_data().await?;
        }
    }

    /// Splits one line off the front of the buffer if a newline has arrived.
    fn try_take_line(&mut self) -> Option<Bytes> {
        let newline = self.buffer.iter().position(|&b| b == b'\n')?;

        let mut line = self.buffer.split_to(newline + 1);
        line.truncate(newline);
        if line.last() == Some(&b'\r') {
            line.truncate(newline - 1);
        }

        trace!(
            client = %self.addr,
            len = line.len(),
            remaining = self.buffer.len(),
            "Framed line"
        );
        Some(line.freeze())
    }

    /// Reads more data from the socket into the buffer.
    async fn read_more_data(&mut self) -> Result<(), ConnectionError> {
        if self.buffer.len() >= MAX_LINE_LENGTH {
            error!(
                client = %self.addr,
                size = self.buffer.len(),
                "Line length limit exceeded"
            );
            return Err(ConnectionError::LineTooLong);
        }

        if self.buffer.capacity() - self.buffer.len() < 1024 {
            self.buffer.reserve(4096);
        }

        let n = self.stream.get_mut().read_buf(&mut self.buffer).await?;

        if n == 0 {
            if self.buffer.is_empty() {
                return Err(ConnectionError::ClientDisconnected);
            } else {
                // Partial line in buffer
                return Err(ConnectionError::UnexpectedEof);
            }
        }

        trace!(client = %self.addr, bytes = n, "Read data");
        Ok(())
    }

    /// Sends a reply to the client.
    async fn send_response(&mut self, response: &Response) -> Result<(), ConnectionError> {
        let bytes = response.serialize();
        self.stream.write_all(&bytes).await?;
        self.stream.flush().await?;
        trace!(
            client = %self.addr,
            reply = %response,
            bytes = bytes.len(),
            "Sent reply"
        );
        Ok(())
    }
}

/// Errors that end a connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// I/O error (network issue)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stream ended on a line boundary. The main loop turns this into a
    /// clean exit between requests and into `UnexpectedEof` before a payload.
    #[error("Client disconnected")]
    ClientDisconnected,

    /// Stream ended in the middle of a line or before a payload line
    #[error("Unexpected end of stream")]
    UnexpectedEof,

    /// A line grew past [`MAX_LINE_LENGTH`] without a terminator
    #[error("Line exceeds {} bytes", MAX_LINE_LENGTH)]
    LineTooLong,
}

/// Handles a client connection.
///
/// Creates a [`ConnectionHandler`] and runs it to completion. Errors end
/// only this connection.
pub async fn handle_connection(stream: TcpStream, addr: SocketAddr, command_handler: CommandHandler) {
    let handler = ConnectionHandler::new(stream, addr, command_handler);
    if let Err(e) = handler.run().await {
        match e {
            ConnectionError::Io(ref io_err)
                if io_err.kind() == std::io::ErrorKind::ConnectionReset => {}
            _ => {
                debug!(client = %addr, error = %e, "Connection ended with error");
            }
        }
    }
}
