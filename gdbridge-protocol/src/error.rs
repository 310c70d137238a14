//! Protocol error types.

use thiserror::Error;

/// Errors that can occur while decoding frames from a byte stream.
///
/// None of these are recoverable for the stream that produced them: there is
/// no resynchronization, so a forwarder treats every variant as the end of
/// its source.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("missing Content-Length header")]
    MissingContentLength,

    #[error("invalid Content-Length value: {0:?}")]
    InvalidContentLength(String),

    #[error("header block too large: more than {max} bytes without a blank line")]
    HeaderTooLarge { max: usize },

    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: usize, max: usize },

    #[error("stream closed mid-frame ({buffered} bytes buffered)")]
    UnexpectedEof { buffered: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProtocolError {
    /// Returns whether this error came from the transport rather than from
    /// the bytes it carried.
    pub fn is_transport(&self) -> bool {
        matches!(self, ProtocolError::Io(_) | ProtocolError::UnexpectedEof { .. })
    }

    /// Returns whether this error means the frame itself was unparseable.
    pub fn is_malformed(&self) -> bool {
        !self.is_transport()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(ProtocolError::MissingContentLength.is_malformed());
        assert!(ProtocolError::InvalidContentLength("abc".into()).is_malformed());
        assert!(ProtocolError::FrameTooLarge { size: 10, max: 5 }.is_malformed());
        assert!(ProtocolError::UnexpectedEof { buffered: 3 }.is_transport());

        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone");
        assert!(ProtocolError::from(io).is_transport());
    }

    #[test]
    fn test_error_display() {
        let err = ProtocolError::InvalidContentLength("abc".into());
        assert_eq!(err.to_string(), "invalid Content-Length value: \"abc\"");
    }
}
