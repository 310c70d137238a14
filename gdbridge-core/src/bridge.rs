//! Bridge orchestration: connect, forward both ways, tear down once.

use crate::config::Config;
use crate::connector::{self, Connection};
use crate::error::BridgeError;
use crate::forwarder::{Direction, ForwardStats, Forwarder};
use crate::shutdown::{Shutdown, ShutdownReason};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Outcome of a bridge run.
#[derive(Debug, Clone)]
pub struct BridgeReport {
    /// What triggered shutdown.
    pub reason: ShutdownReason,
    /// Host-to-server forwarder result, `None` if it did not finish within
    /// the grace period (or never started).
    pub host_to_server: Option<ForwardStats>,
    /// Server-to-host forwarder result, `None` if it did not finish within
    /// the grace period (or never started).
    pub server_to_host: Option<ForwardStats>,
}

impl BridgeReport {
    fn not_started(reason: ShutdownReason) -> Self {
        Self {
            reason,
            host_to_server: None,
            server_to_host: None,
        }
    }

    /// Returns whether both forwarders finished within the grace period.
    pub fn is_clean(&self) -> bool {
        self.host_to_server.is_some() && self.server_to_host.is_some()
    }
}

/// The stdio <-> TCP bridge.
pub struct Bridge {
    config: Config,
    shutdown: Shutdown,
}

impl Bridge {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            shutdown: Shutdown::new(),
        }
    }

    /// Returns a handle for external shutdown producers (signal handlers).
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Connects to the server and forwards frames until either side closes
    /// or shutdown is requested.
    ///
    /// The only error returned is a setup failure; everything that goes
    /// wrong while forwarding ends the run normally with a report.
    pub async fn run<R, W>(self, host_input: R, host_output: W) -> Result<BridgeReport, BridgeError>
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let connection = tokio::select! {
            result = connector::connect(&self.config.connect) => result?,
            reason = self.shutdown.wait() => {
                tracing::info!("Shutdown requested before connecting ({})", reason);
                return Ok(BridgeReport::not_started(reason));
            }
        };

        Ok(self.serve(connection, host_input, host_output).await)
    }

    /// Forwards frames over an already established connection.
    pub async fn serve<R, W>(self, connection: Connection, host_input: R, host_output: W) -> BridgeReport
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let settings = &self.config.bridge;
        tracing::info!("Bridging stdio <-> {}", connection.peer_addr());

        let (server_read, server_write, closer) = connection.into_split();

        let upstream = Forwarder::new(
            Direction::HostToServer,
            host_input,
            server_write,
            self.shutdown.clone(),
        )
        .with_max_frame_size(settings.max_frame_size)
        .with_message_logging(settings.log_messages);

        let downstream = Forwarder::new(
            Direction::ServerToHost,
            server_read,
            host_output,
            self.shutdown.clone(),
        )
        .with_max_frame_size(settings.max_frame_size)
        .with_message_logging(settings.log_messages);

        let upstream_task = tokio::spawn(upstream.run());
        let downstream_task = tokio::spawn(downstream.run());

        let reason = self.shutdown.wait().await;
        tracing::info!("Shutting down bridge ({})", reason);

        // Unblocks whichever forwarder is still reading from the server.
        closer.close();

        let deadline = Instant::now() + settings.shutdown_grace();
        let host_to_server = join_until(upstream_task, deadline).await;
        let server_to_host = join_until(downstream_task, deadline).await;

        let report = BridgeReport {
            reason,
            host_to_server,
            server_to_host,
        };
        if !report.is_clean() {
            tracing::warn!(
                "Forwarders did not stop within {:?}, exiting anyway",
                settings.shutdown_grace()
            );
        }
        report
    }
}

/// Waits for a forwarder until `deadline`, aborting it if it is still running.
async fn join_until(mut task: JoinHandle<ForwardStats>, deadline: Instant) -> Option<ForwardStats> {
    match tokio::time::timeout_at(deadline, &mut task).await {
        Ok(Ok(stats)) => Some(stats),
        Ok(Err(e)) => {
            tracing::error!("Forwarder task failed: {}", e);
            None
        }
        Err(_) => {
            task.abort();
            None
        }
    }
}
