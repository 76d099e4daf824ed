//! Client error type

use std::io;

use storage_common::ErrorKind;
use storage_common::framing::FrameError;
use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// The server sent something this client did not expect
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The server answered the request with `success: false`
    #[error("{kind}: {message}")]
    Server { kind: ErrorKind, message: String },

    #[error("handshake rejected: {0}")]
    HandshakeRejected(String),

    #[error("timed out waiting for the server")]
    Timeout,

    #[error("connection closed by server")]
    ConnectionClosed,
}

impl ClientError {
    /// Error kind reported by the server, if this is a server failure
    #[must_use]
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Server { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
