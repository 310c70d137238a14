//! # gdbridge-core
//!
//! The stdio <-> TCP bridge engine.
//!
//! This crate provides:
//! - TCP connection establishment with bounded retries
//! - Per-direction frame forwarders
//! - A shared, set-once shutdown signal
//! - The orchestrator that wires them together and tears down cleanly
//! - Layered configuration (defaults, YAML file, environment)

pub mod bridge;
pub mod config;
pub mod connector;
pub mod error;
pub mod forwarder;
pub mod shutdown;

pub use bridge::{Bridge, BridgeReport};
pub use config::{BridgeConfig, Config, ConfigError, ConnectConfig};
pub use connector::{Connection, ConnectionCloser};
pub use error::BridgeError;
pub use forwarder::{Direction, ForwardStats, Forwarder, StopCause};
pub use shutdown::{Shutdown, ShutdownReason};
