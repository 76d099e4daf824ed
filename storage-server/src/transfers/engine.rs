//! Byte pumps between a session's endpoint and its staging area
//!
//! Uploads are read into a private buffer that only becomes item content on
//! commit. Downloads stream a fixed content snapshot. Both copy in
//! [`TRANSFER_CHUNK_SIZE`] chunks and stop between chunks once the session's
//! cancel signal fires. A dropped cancel sender counts as a cancel.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::oneshot;

use crate::constants::TRANSFER_CHUNK_SIZE;
use crate::error::ProviderError;
use crate::store::Content;

/// Why a pump stopped early
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("transfer cancelled")]
    Cancelled,
    #[error("upload exceeds the {limit} byte limit")]
    TooLarge { limit: u64 },
    #[error("transfer I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<TransferError> for ProviderError {
    fn from(err: TransferError) -> Self {
        match err {
            TransferError::Cancelled => Self::InvalidState(err.to_string()),
            TransferError::TooLarge { .. } => Self::InvalidArgument(err.to_string()),
            TransferError::Io(e) => Self::Internal(e.to_string()),
        }
    }
}

/// Read `reader` to EOF into a staging buffer
///
/// Fails with [`TransferError::TooLarge`] as soon as more than `limit` bytes
/// arrive.
pub async fn pump_upload<R>(
    mut reader: R,
    mut cancel: oneshot::Receiver<()>,
    limit: u64,
) -> Result<Vec<u8>, TransferError>
where
    R: AsyncRead + Unpin,
{
    let mut staged = Vec::new();
    let mut buffer = vec![0u8; TRANSFER_CHUNK_SIZE];

    loop {
        let read = tokio::select! {
            biased;
            _ = &mut cancel => return Err(TransferError::Cancelled),
            read = reader.read(&mut buffer) => read?,
        };
        if read == 0 {
            return Ok(staged);
        }
        if (staged.len() + read) as u64 > limit {
            return Err(TransferError::TooLarge { limit });
        }
        staged.extend_from_slice(&buffer[..read]);
    }
}

/// Write `content` to `writer`, then close it
///
/// `delivered` is set once every byte has been handed to the writer, before
/// the writer is shut down.
pub async fn pump_download<W>(
    mut writer: W,
    content: Content,
    mut cancel: oneshot::Receiver<()>,
    delivered: Arc<AtomicBool>,
) -> Result<(), TransferError>
where
    W: AsyncWrite + Unpin,
{
    for chunk in content.chunks(TRANSFER_CHUNK_SIZE) {
        tokio::select! {
            biased;
            _ = &mut cancel => return Err(TransferError::Cancelled),
            written = writer.write_all(chunk) => written?,
        }
    }
    writer.flush().await?;
    delivered.store(true, Ordering::SeqCst);
    writer.shutdown().await?;
    Ok(())
}
