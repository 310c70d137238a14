//! `Content-Length` frame format.
//!
//! Frame layout (same on stdio and TCP):
//!
//! ```text
//! Content-Length: <N>\r\n
//! [Other-Header: value\r\n ...]
//! \r\n
//! <N bytes of payload>
//! ```
//!
//! Header keys are matched case-insensitively. Lines may end in `\r\n` or a
//! bare `\n`. Headers other than `Content-Length` are accepted and dropped;
//! the encoder only ever emits `Content-Length`.

use crate::error::ProtocolError;
use crate::DEFAULT_MAX_FRAME_SIZE;
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Name of the length header.
pub const CONTENT_LENGTH: &str = "Content-Length";

/// Maximum size of a header block, blank line included (8 KiB).
pub const MAX_HEADER_SIZE: usize = 8 * 1024;

/// A single framed message.
///
/// The payload is opaque: it is forwarded byte-for-byte and its length is
/// the frame's declared `Content-Length`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Message body (conventionally JSON-RPC).
    pub payload: Bytes,
}

impl Frame {
    /// Creates a new frame with the given payload.
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// Returns the declared body length.
    pub fn content_length(&self) -> usize {
        self.payload.len()
    }

    /// Returns the header block for this frame, blank line included.
    pub fn header(&self) -> String {
        format!("{}: {}\r\n\r\n", CONTENT_LENGTH, self.payload.len())
    }

    /// Encodes the frame into bytes.
    pub fn encode(&self) -> BytesMut {
        let header = self.header();
        let mut buf = BytesMut::with_capacity(header.len() + self.payload.len());
        buf.put_slice(header.as_bytes());
        buf.put_slice(&self.payload);
        buf
    }

    /// Decodes a frame from bytes using the default payload limit.
    ///
    /// Returns `Ok(Some(frame))` if a complete frame was decoded,
    /// `Ok(None)` if more data is needed, or `Err` on malformed input.
    pub fn decode(buf: &mut BytesMut) -> Result<Option<Self>, ProtocolError> {
        Self::decode_with_limit(buf, DEFAULT_MAX_FRAME_SIZE)
    }

    /// Decodes a frame from bytes, rejecting payloads over `max_payload`.
    ///
    /// Nothing is consumed from `buf` unless a complete frame is returned.
    pub fn decode_with_limit(
        buf: &mut BytesMut,
        max_payload: usize,
    ) -> Result<Option<Self>, ProtocolError> {
        let (header_len, content_length) = match parse_header(buf)? {
            Some(parsed) => parsed,
            None => return Ok(None),
        };

        if content_length > max_payload {
            return Err(ProtocolError::FrameTooLarge {
                size: content_length,
                max: max_payload,
            });
        }

        // The buffer grows with the bytes that actually arrive, never with
        // the declared length.
        let total_len = match header_len.checked_add(content_length) {
            Some(total_len) => total_len,
            None => {
                return Err(ProtocolError::FrameTooLarge {
                    size: content_length,
                    max: max_payload,
                })
            }
        };
        if buf.len() < total_len {
            return Ok(None);
        }

        buf.advance(header_len);
        let payload = buf.split_to(content_length).freeze();

        Ok(Some(Self { payload }))
    }
}

/// Scans the header block at the start of `buf`.
///
/// Returns the header block length (terminating blank line included) and the
/// declared body length, or `None` if the block is not complete yet.
fn parse_header(buf: &[u8]) -> Result<Option<(usize, usize)>, ProtocolError> {
    let window = &buf[..buf.len().min(MAX_HEADER_SIZE)];
    let mut content_length = None;
    let mut pos = 0;

    while let Some(offset) = window[pos..].iter().position(|&b| b == b'\n') {
        let raw = &window[pos..pos + offset];
        pos += offset + 1;

        let line = String::from_utf8_lossy(raw);
        let line = line.trim();
        if line.is_empty() {
            return match content_length {
                Some(n) => Ok(Some((pos, n))),
                None => Err(ProtocolError::MissingContentLength),
            };
        }

        match line.split_once(':') {
            Some((key, value)) if key.trim().eq_ignore_ascii_case(CONTENT_LENGTH) => {
                let value = value.trim();
                let n = value
                    .parse::<usize>()
                    .map_err(|_| ProtocolError::InvalidContentLength(value.to_string()))?;
                content_length = Some(n);
            }
            _ => tracing::trace!("ignoring header line {:?}", line),
        }
    }

    if buf.len() >= MAX_HEADER_SIZE {
        return Err(ProtocolError::HeaderTooLarge {
            max: MAX_HEADER_SIZE,
        });
    }

    Ok(None)
}
