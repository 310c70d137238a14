//! Downstream connection establishment.

use crate::config::ConnectConfig;
use crate::error::BridgeError;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

/// An open connection to the language server.
#[derive(Debug)]
pub struct Connection {
    stream: TcpStream,
    control: std::net::TcpStream,
    peer_addr: SocketAddr,
}

impl Connection {
    /// Wraps a connected stream.
    ///
    /// Keeps a duplicate socket handle so the connection can still be shut
    /// down after the stream itself has been split between forwarders.
    pub fn new(stream: TcpStream) -> io::Result<Self> {
        let peer_addr = stream.peer_addr()?;
        let std_stream = stream.into_std()?;
        let control = std_stream.try_clone()?;
        let stream = TcpStream::from_std(std_stream)?;
        Ok(Self {
            stream,
            control,
            peer_addr,
        })
    }

    /// Returns the server address.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Splits the connection into its read half, its write half, and the
    /// closer that stays with the owner.
    pub fn into_split(self) -> (OwnedReadHalf, OwnedWriteHalf, ConnectionCloser) {
        let (read_half, write_half) = self.stream.into_split();
        let closer = ConnectionCloser {
            control: self.control,
            peer_addr: self.peer_addr,
            closed: AtomicBool::new(false),
        };
        (read_half, write_half, closer)
    }
}

/// Closes a split connection.
#[derive(Debug)]
pub struct ConnectionCloser {
    control: std::net::TcpStream,
    peer_addr: SocketAddr,
    closed: AtomicBool,
}

impl ConnectionCloser {
    /// Shuts the socket down in both directions.
    ///
    /// Pending reads on the read half return end-of-stream and later writes
    /// fail. Errors are ignored since the peer may already be gone. Returns
    /// `true` only for the call that closed it.
    pub fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::SeqCst) {
            return false;
        }

        tracing::debug!("Closing connection to {}", self.peer_addr);
        if let Err(e) = self.control.shutdown(std::net::Shutdown::Both) {
            tracing::debug!("Shutdown of {} failed (ignored): {}", self.peer_addr, e);
        }
        true
    }
}

/// Connects to the configured server with bounded retries.
///
/// Each attempt is limited by `timeout_ms`; attempts are separated by
/// `retry_delay_ms`. No timeout applies once connected.
pub async fn connect(config: &ConnectConfig) -> Result<Connection, BridgeError> {
    let host = config.host.as_str();
    let port = config.port;
    let stream = connect_with(config, move || TcpStream::connect((host, port))).await?;

    if let Err(e) = stream.set_nodelay(true) {
        tracing::debug!("Failed to set TCP_NODELAY: {}", e);
    }

    Ok(Connection::new(stream)?)
}

/// Runs the retry policy of [`connect`] around an arbitrary dial function.
pub async fn connect_with<T, F, Fut>(config: &ConnectConfig, mut dial: F) -> Result<T, BridgeError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<T>>,
{
    let attempts = config.max_attempts.max(1);
    let mut last_error = io::Error::new(io::ErrorKind::NotConnected, "no connection attempt made");

    for attempt in 1..=attempts {
        tracing::info!(
            "Connecting to {} (attempt {}/{})",
            config.target(),
            attempt,
            attempts
        );

        match tokio::time::timeout(config.timeout(), dial()).await {
            Ok(Ok(conn)) => {
                tracing::info!("Connected to {}", config.target());
                return Ok(conn);
            }
            Ok(Err(e)) => {
                tracing::warn!("Connection attempt {} failed: {}", attempt, e);
                last_error = e;
            }
            Err(_) => {
                tracing::warn!(
                    "Connection attempt {} timed out after {:?}",
                    attempt,
                    config.timeout()
                );
                last_error = io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("connection timed out after {:?}", config.timeout()),
                );
            }
        }

        if attempt < attempts {
            tokio::time::sleep(config.retry_delay()).await;
        }
    }

    Err(BridgeError::ConnectFailed {
        host: config.host.clone(),
        port: config.port,
        attempts,
        source: last_error,
    })
}
