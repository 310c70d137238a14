//! One-directional frame forwarding.

use crate::shutdown::{Shutdown, ShutdownReason};
use gdbridge_protocol::{FrameReader, FrameWriter, MessageSummary, ProtocolError};
use std::fmt;
use tokio::io::{AsyncRead, AsyncWrite};

/// Direction a forwarder carries frames in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Host stdin to the language server.
    HostToServer,
    /// Language server to host stdout.
    ServerToHost,
}

impl Direction {
    /// Short arrow used to prefix message summaries.
    pub fn arrow(&self) -> &'static str {
        match self {
            Direction::HostToServer => "-->",
            Direction::ServerToHost => "<--",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::HostToServer => write!(f, "host->server"),
            Direction::ServerToHost => write!(f, "server->host"),
        }
    }
}

/// Why a forwarder stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopCause {
    /// The shutdown signal was already set by someone else.
    Shutdown,
    /// The source reached end-of-stream, possibly mid-frame.
    SourceClosed,
    /// The source sent a frame that could not be parsed.
    MalformedFrame,
    /// Reading from the source failed.
    ReadFailed,
    /// Writing to the destination failed.
    WriteFailed,
}

impl fmt::Display for StopCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StopCause::Shutdown => "shutdown",
            StopCause::SourceClosed => "source closed",
            StopCause::MalformedFrame => "malformed frame",
            StopCause::ReadFailed => "read failed",
            StopCause::WriteFailed => "write failed",
        };
        f.write_str(s)
    }
}

/// Counters reported by a finished forwarder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForwardStats {
    pub direction: Direction,
    /// Frames fully written to the destination.
    pub frames: u64,
    /// Payload bytes fully written to the destination.
    pub bytes: u64,
    pub cause: StopCause,
}

/// Copies frames from a source stream to a destination stream, unmodified
/// and in order, until either side fails or shutdown is signalled.
pub struct Forwarder<R, W> {
    direction: Direction,
    reader: FrameReader<R>,
    writer: FrameWriter<W>,
    shutdown: Shutdown,
    log_messages: bool,
}

impl<R, W> Forwarder<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(direction: Direction, source: R, destination: W, shutdown: Shutdown) -> Self {
        Self {
            direction,
            reader: FrameReader::new(source),
            writer: FrameWriter::new(destination),
            shutdown,
            log_messages: true,
        }
    }

    pub fn with_max_frame_size(mut self, max: usize) -> Self {
        self.reader = self.reader.with_max_frame_size(max);
        self
    }

    pub fn with_message_logging(mut self, enabled: bool) -> Self {
        self.log_messages = enabled;
        self
    }

    /// Runs the forwarding loop to completion.
    ///
    /// Any failure ends the loop and sets the shutdown signal; nothing is
    /// retried. The in-flight frame is dropped in that case.
    pub async fn run(mut self) -> ForwardStats {
        let direction = self.direction;
        tracing::info!("{} forwarder started", direction);

        let mut frames = 0u64;
        let mut bytes = 0u64;

        let cause = loop {
            if self.shutdown.is_triggered() {
                break StopCause::Shutdown;
            }

            let read = tokio::select! {
                biased;
                _ = self.shutdown.wait() => break StopCause::Shutdown,
                read = self.reader.read_frame() => read,
            };

            let frame = match read {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    tracing::info!("{} source closed", direction);
                    break StopCause::SourceClosed;
                }
                Err(e) => break self.classify_read_error(e),
            };

            if self.log_messages {
                tracing::debug!(
                    "{} {}",
                    direction.arrow(),
                    MessageSummary::from_payload(&frame.payload)
                );
            }

            if let Err(e) = self.writer.write_frame(&frame).await {
                tracing::error!("{} write error: {}", direction, e);
                break StopCause::WriteFailed;
            }

            frames += 1;
            bytes += frame.content_length() as u64;
        };

        if cause != StopCause::Shutdown {
            self.shutdown
                .trigger(ShutdownReason::Forwarder { direction, cause });
        }

        tracing::info!(
            "{} forwarder stopped: {} ({} frames, {} bytes)",
            direction,
            cause,
            frames,
            bytes
        );

        ForwardStats {
            direction,
            frames,
            bytes,
            cause,
        }
    }

    fn classify_read_error(&self, error: ProtocolError) -> StopCause {
        if error.is_malformed() {
            tracing::error!("{} malformed frame: {}", self.direction, error);
            return StopCause::MalformedFrame;
        }

        match error {
            ProtocolError::UnexpectedEof { buffered } => {
                tracing::warn!(
                    "{} source closed mid-frame ({} bytes discarded)",
                    self.direction,
                    buffered
                );
                StopCause::SourceClosed
            }
            e => {
                tracing::error!("{} read error: {}", self.direction, e);
                StopCause::ReadFailed
            }
        }
    }
}
