//! Bridge configuration.
//!
//! Configuration is loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. YAML config file (if specified via GDBRIDGE_CONFIG or --config)
//! 3. Environment variables
//! 4. Command-line flags (applied by the binary)

use gdbridge_protocol::DEFAULT_MAX_FRAME_SIZE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default language server host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default port of the Godot editor's GDScript language server.
pub const DEFAULT_PORT: u16 = 6005;

/// Bridge configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Downstream connection configuration.
    pub connect: ConnectConfig,
    /// Forwarding and teardown configuration.
    pub bridge: BridgeConfig,
}

impl Config {
    /// Loads configuration from `path` (or GDBRIDGE_CONFIG when `path` is
    /// `None`), then applies environment variable overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os("GDBRIDGE_CONFIG").map(PathBuf::from));

        let mut config = match file {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;
        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
        Ok(config)
    }

    /// Applies environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from an arbitrary variable lookup.
    pub fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        self.connect.apply_overrides(&var);
        self.bridge.apply_overrides(&var);
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.connect.validate()?;
        self.bridge.validate()
    }
}

/// Downstream connection configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectConfig {
    /// Language server host.
    pub host: String,
    /// Language server port.
    pub port: u16,
    /// Timeout for a single connection attempt in milliseconds.
    pub timeout_ms: u64,
    /// Number of connection attempts before giving up.
    pub max_attempts: u32,
    /// Delay between connection attempts in milliseconds.
    pub retry_delay_ms: u64,
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            timeout_ms: 5000,
            max_attempts: 3,
            retry_delay_ms: 1000,
        }
    }
}

impl ConnectConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = duration_ms(timeout);
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay_ms = duration_ms(delay);
        self
    }

    fn apply_overrides(&mut self, var: &impl Fn(&str) -> Option<String>) {
        if let Some(host) = var("GODOT_LSP_HOST") {
            if !host.is_empty() {
                self.host = host;
            }
        }
        override_parsed(var, "GODOT_LSP_PORT", &mut self.port);
        override_parsed(var, "GDBRIDGE_CONNECT_TIMEOUT_MS", &mut self.timeout_ms);
        override_parsed(var, "GDBRIDGE_CONNECT_ATTEMPTS", &mut self.max_attempts);
        override_parsed(var, "GDBRIDGE_RETRY_DELAY_MS", &mut self.retry_delay_ms);
    }

    /// Returns the per-attempt timeout as Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Returns the retry delay as Duration.
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Returns `host:port` for display.
    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "connect.host must not be empty".to_string(),
            ));
        }
        if self.port == 0 {
            return Err(ConfigError::ValidationError(
                "connect.port must not be 0".to_string(),
            ));
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "connect.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "connect.timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Forwarding and teardown configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// How long teardown waits for both forwarders, in milliseconds.
    pub shutdown_grace_ms: u64,
    /// Largest accepted frame payload in bytes.
    pub max_frame_size: usize,
    /// Log a one-line summary of every forwarded message at debug level.
    pub log_messages: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            shutdown_grace_ms: 2000,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            log_messages: true,
        }
    }
}

impl BridgeConfig {
    fn apply_overrides(&mut self, var: &impl Fn(&str) -> Option<String>) {
        override_parsed(var, "GDBRIDGE_SHUTDOWN_GRACE_MS", &mut self.shutdown_grace_ms);
        override_parsed(var, "GDBRIDGE_MAX_FRAME_SIZE", &mut self.max_frame_size);
        if let Some(enabled) = var("GDBRIDGE_LOG_MESSAGES") {
            self.log_messages = enabled == "1" || enabled.to_lowercase() == "true";
        }
    }

    /// Returns the shutdown grace period as Duration.
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_frame_size == 0 {
            return Err(ConfigError::ValidationError(
                "bridge.max_frame_size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn override_parsed<T: std::str::FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    key: &str,
    target: &mut T,
) {
    if let Some(raw) = var(key) {
        match raw.trim().parse() {
            Ok(value) => *target = value,
            Err(_) => tracing::warn!("Ignoring invalid {}={:?}", key, raw),
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {}", .0.display(), .1)]
    IoError(PathBuf, std::io::Error),

    #[error("failed to parse config file '{}': {}", .0.display(), .1)]
    ParseError(PathBuf, String),

    #[error("configuration validation failed: {0}")]
    ValidationError(String),
}
