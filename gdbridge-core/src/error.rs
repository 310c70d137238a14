//! Bridge error types.

use crate::config::ConfigError;
use thiserror::Error;

/// Bridge errors.
///
/// Failures inside a running forwarder never surface here: they become
/// shutdown triggers. Only setup failures are returned to the caller.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("failed to connect to {host}:{port} after {attempts} attempt(s): {source}")]
    ConnectFailed {
        host: String,
        port: u16,
        attempts: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl BridgeError {
    /// Returns the process exit status for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            BridgeError::Config(_) => 2,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_failed_message() {
        let err = BridgeError::ConnectFailed {
            host: "127.0.0.1".into(),
            port: 6005,
            attempts: 3,
            source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
        };
        assert_eq!(
            err.to_string(),
            "failed to connect to 127.0.0.1:6005 after 3 attempt(s): refused"
        );
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_config_exit_code() {
        let err = BridgeError::from(ConfigError::ValidationError("bad".into()));
        assert_eq!(err.exit_code(), 2);
    }
}
