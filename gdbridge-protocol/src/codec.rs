//! Async frame reader and writer over tokio byte streams.
//!
//! Both types are transport-agnostic: the bridge uses them over stdin/stdout
//! and over the halves of a `TcpStream` alike.

use crate::error::ProtocolError;
use crate::frame::Frame;
use crate::DEFAULT_MAX_FRAME_SIZE;
use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Default read buffer size (8 KiB).
pub const DEFAULT_READ_BUFFER_SIZE: usize = 8 * 1024;

/// Reads frames from a byte stream.
pub struct FrameReader<R> {
    reader: R,
    buffer: BytesMut,
    max_frame_size: usize,
    /// Set once the stream ended or produced a malformed frame.
    finished: bool,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: BytesMut::with_capacity(DEFAULT_READ_BUFFER_SIZE),
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            finished: false,
        }
    }

    /// Sets the largest payload this reader accepts.
    pub fn with_max_frame_size(mut self, max: usize) -> Self {
        self.max_frame_size = max;
        self
    }

    /// Reads the next frame.
    ///
    /// Returns `Ok(None)` when the stream ends cleanly between frames. A
    /// stream that ends mid-frame, a malformed header or an I/O error is
    /// returned as `Err`. After either outcome the reader is finished and
    /// every later call returns `Ok(None)`: there is no resynchronization.
    ///
    /// Cancel safe: bytes read before a cancelled call stay buffered.
    pub async fn read_frame(&mut self) -> Result<Option<Frame>, ProtocolError> {
        if self.finished {
            return Ok(None);
        }

        let result = self.next_frame().await;
        if !matches!(result, Ok(Some(_))) {
            self.finished = true;
        }
        result
    }

    async fn next_frame(&mut self) -> Result<Option<Frame>, ProtocolError> {
        loop {
            if let Some(frame) = Frame::decode_with_limit(&mut self.buffer, self.max_frame_size)? {
                return Ok(Some(frame));
            }

            self.buffer.reserve(DEFAULT_READ_BUFFER_SIZE);
            let n = self.reader.read_buf(&mut self.buffer).await?;
            if n == 0 {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                return Err(ProtocolError::UnexpectedEof {
                    buffered: self.buffer.len(),
                });
            }
        }
    }
}

/// Writes frames to a byte stream.
pub struct FrameWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes one frame and flushes it.
    ///
    /// The frame is fully handed to the underlying stream when this returns;
    /// nothing is left in a userspace buffer.
    pub async fn write_frame(&mut self, frame: &Frame) -> Result<(), ProtocolError> {
        let encoded = frame.encode();
        self.writer.write_all(&encoded).await?;
        self.writer.flush().await?;
        Ok(())
    }
}
