//! # gdbridge-protocol
//!
//! Wire framing shared by both sides of the bridge.
//!
//! This crate provides:
//! - `Content-Length` header framing, identical over pipes and sockets
//! - Async frame reader/writer over any tokio byte stream
//! - Best-effort JSON-RPC message summaries for diagnostics

pub mod codec;
pub mod error;
pub mod frame;
pub mod summary;

pub use codec::{FrameReader, FrameWriter};
pub use error::ProtocolError;
pub use frame::{Frame, CONTENT_LENGTH, MAX_HEADER_SIZE};
pub use summary::MessageSummary;

/// Default maximum frame payload size (64 MiB).
pub const DEFAULT_MAX_FRAME_SIZE: usize = 64 * 1024 * 1024;
