//! Client side of a session's byte stream

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, DuplexStream, ReadBuf};

use crate::constants::BYTE_STREAM_CAPACITY;

/// The stream a caller reads a download from or writes an upload into
///
/// Upload content ends when the stream is shut down or dropped. A download
/// stream reaches EOF after the last byte of the snapshot.
#[derive(Debug)]
pub struct ByteStream(DuplexStream);

impl ByteStream {
    /// Returns the client half and the half the session's pump owns
    pub(crate) fn pair() -> (Self, DuplexStream) {
        let (client, session) = tokio::io::duplex(BYTE_STREAM_CAPACITY);
        (Self(client), session)
    }
}

impl AsyncRead for ByteStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.0).poll_read(cx, buf)
    }
}

impl AsyncWrite for ByteStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.0).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.0).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.0).poll_shutdown(cx)
    }
}
