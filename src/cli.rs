//! Command-line arguments.

use clap::{Parser, Subcommand};
use gdbridge_core::Config;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "gdbridge")]
#[command(about = "Bridge an stdio LSP client to the Godot editor's GDScript language server")]
#[command(version)]
pub struct Cli {
    /// Language server host [default: 127.0.0.1]
    #[arg(long)]
    pub host: Option<String>,

    /// Language server port [default: 6005]
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Timeout for each connection attempt, in milliseconds
    #[arg(long)]
    pub connect_timeout_ms: Option<u64>,

    /// Number of connection attempts before giving up
    #[arg(short = 'n', long)]
    pub attempts: Option<u32>,

    /// Delay between connection attempts, in milliseconds
    #[arg(long)]
    pub retry_delay_ms: Option<u64>,

    /// How long shutdown waits for in-flight forwarding, in milliseconds
    #[arg(long)]
    pub grace_ms: Option<u64>,

    /// Largest accepted message body, in bytes
    #[arg(long)]
    pub max_frame_size: Option<usize>,

    /// YAML config file (overrides GDBRIDGE_CONFIG)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Don't log a summary of every forwarded message
    #[arg(long)]
    pub no_log_messages: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Print the effective configuration as YAML and exit
    PrintConfig,
}

impl Cli {
    /// Applies command-line overrides on top of a loaded configuration.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(ref host) = self.host {
            config.connect.host = host.clone();
        }
        if let Some(port) = self.port {
            config.connect.port = port;
        }
        if let Some(ms) = self.connect_timeout_ms {
            config.connect.timeout_ms = ms;
        }
        if let Some(n) = self.attempts {
            config.connect.max_attempts = n;
        }
        if let Some(ms) = self.retry_delay_ms {
            config.connect.retry_delay_ms = ms;
        }
        if let Some(ms) = self.grace_ms {
            config.bridge.shutdown_grace_ms = ms;
        }
        if let Some(size) = self.max_frame_size {
            config.bridge.max_frame_size = size;
        }
        if self.no_log_messages {
            config.bridge.log_messages = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_args_keeps_config() {
        let cli = Cli::try_parse_from(["gdbridge"]).unwrap();
        let mut config = Config::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config, Config::default());
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from([
            "gdbridge",
            "--host",
            "192.168.1.20",
            "-p",
            "6008",
            "-n",
            "10",
            "--retry-delay-ms",
            "250",
            "--grace-ms",
            "500",
            "--no-log-messages",
        ])
        .unwrap();

        let mut config = Config::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.connect.target(), "192.168.1.20:6008");
        assert_eq!(config.connect.max_attempts, 10);
        assert_eq!(config.connect.retry_delay_ms, 250);
        assert_eq!(config.bridge.shutdown_grace_ms, 500);
        assert!(!config.bridge.log_messages);
    }

    #[test]
    fn test_print_config_subcommand() {
        let cli = Cli::try_parse_from(["gdbridge", "-v", "print-config"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.command, Some(Commands::PrintConfig));
    }

    #[test]
    fn test_invalid_port_rejected() {
        assert!(Cli::try_parse_from(["gdbridge", "--port", "70000"]).is_err());
    }
}
