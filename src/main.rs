//! gdbridge - stdio <-> TCP bridge for the Godot GDScript language server
//!
//! Speaks LSP framing on stdin/stdout towards the editor client and forwards
//! every message unmodified to the language server's TCP port. Diagnostics go
//! to stderr only; stdout carries nothing but forwarded frames.

mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use gdbridge_core::{Bridge, BridgeError, Config, Shutdown, ShutdownReason};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// How long runtime shutdown waits for blocking I/O threads.
///
/// A pending stdin read cannot be cancelled, so the runtime is not allowed
/// to wait for it.
const RUNTIME_SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(100);

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging (stderr only, stdout is the data channel)
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::from(e.exit_code());
        }
    };

    if cli.command == Some(Commands::PrintConfig) {
        return match serde_yaml::to_string(&config) {
            Ok(yaml) => {
                print!("{}", yaml);
                ExitCode::SUCCESS
            }
            Err(e) => {
                tracing::error!("Failed to render config: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Failed to start async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let code = runtime.block_on(run(config));
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_TIMEOUT);
    code
}

fn load_config(cli: &Cli) -> Result<Config, BridgeError> {
    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);
    config.validate()?;
    Ok(config)
}

async fn run(config: Config) -> ExitCode {
    tracing::info!("gdbridge starting");
    tracing::info!("  Target: {}", config.connect.target());
    tracing::info!(
        "  Connect: {} attempt(s), {}ms timeout, {}ms retry delay",
        config.connect.max_attempts,
        config.connect.timeout_ms,
        config.connect.retry_delay_ms
    );

    let port = config.connect.port;
    let bridge = Bridge::new(config);
    spawn_interrupt_handler(bridge.shutdown_handle());

    match bridge.run(tokio::io::stdin(), tokio::io::stdout()).await {
        Ok(report) => {
            for stats in [report.host_to_server, report.server_to_host]
                .into_iter()
                .flatten()
            {
                tracing::info!(
                    "  {}: {} frames, {} bytes",
                    stats.direction,
                    stats.frames,
                    stats.bytes
                );
            }
            tracing::info!("gdbridge stopped ({})", report.reason);
            ExitCode::SUCCESS
        }
        Err(e @ BridgeError::ConnectFailed { .. }) => {
            tracing::error!("{}", e);
            tracing::error!(
                "Is the Godot editor running with its language server enabled (port {})?",
                port
            );
            ExitCode::from(e.exit_code())
        }
        Err(e) => {
            tracing::error!("Bridge failed: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

/// Maps Ctrl-C (and SIGTERM on Unix) onto the bridge's shutdown signal.
fn spawn_interrupt_handler(shutdown: Shutdown) {
    tokio::spawn(async move {
        wait_for_interrupt().await;
        tracing::info!("Received shutdown signal, stopping bridge...");
        shutdown.trigger(ShutdownReason::Interrupted);
    });
}

#[cfg(unix)]
async fn wait_for_interrupt() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(terminate) => terminate,
        Err(e) => {
            tracing::warn!("Failed to install SIGTERM handler: {}", e);
            wait_for_ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = wait_for_ctrl_c() => {}
        _ = terminate.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_interrupt() {
    wait_for_ctrl_c().await;
}

async fn wait_for_ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
