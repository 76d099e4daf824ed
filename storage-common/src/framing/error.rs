//! Framing errors

use std::io;

use thiserror::Error;

/// Errors raised while reading or writing frames
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("invalid frame magic")]
    InvalidMagic,
    #[error("invalid type length field")]
    InvalidTypeLength,
    #[error("type length has too many digits")]
    TypeLengthTooManyDigits,
    #[error("type length out of range")]
    TypeLengthOutOfRange,
    #[error("unknown message type: {0}")]
    UnknownMessageType(String),
    #[error("missing field delimiter")]
    MissingDelimiter,
    #[error("invalid message id")]
    InvalidMessageId,
    #[error("invalid payload length field")]
    InvalidPayloadLength,
    #[error("payload length has too many digits")]
    PayloadLengthTooManyDigits,
    #[error("payload for {message_type} is {length} bytes, limit is {max}")]
    PayloadLengthExceedsTypeMax {
        message_type: String,
        length: u64,
        max: u64,
    },
    #[error("missing frame terminator")]
    MissingTerminator,
    #[error("invalid JSON payload: {0}")]
    InvalidJson(String),
    #[error("frame did not complete in time")]
    FrameTimeout,
    #[error("no data received before idle timeout")]
    IdleTimeout,
    #[error("connection closed")]
    ConnectionClosed,
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<io::Error> for FrameError {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            FrameError::ConnectionClosed
        } else {
            FrameError::Io(err.to_string())
        }
    }
}

impl From<FrameError> for io::Error {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::Io(msg) => io::Error::other(msg),
            FrameError::ConnectionClosed => {
                io::Error::new(io::ErrorKind::ConnectionReset, "connection closed")
            }
            other => io::Error::other(other.to_string()),
        }
    }
}
