//! I/O utilities for sending and receiving protocol messages
//!
//! This module sits between the protocol message types (`ClientMessage`,
//! `ServerMessage`) and the wire format (framing).

use std::io;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::framing::{
    DEFAULT_FRAME_TIMEOUT, DEFAULT_IDLE_TIMEOUT, FrameError, FrameReader, FrameWriter, MessageId,
    RawFrame,
};
use crate::protocol::{ClientMessage, ServerMessage};

// =============================================================================
// Message Sending
// =============================================================================

/// Send a `ClientMessage` with a fresh message id, returning the id used
pub async fn send_client_message<W>(
    writer: &mut FrameWriter<W>,
    message: &ClientMessage,
) -> io::Result<MessageId>
where
    W: AsyncWriteExt + Unpin,
{
    let message_id = MessageId::new();
    let payload =
        serde_json::to_vec(message).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    let frame = RawFrame::new(message_id, client_message_type(message).to_string(), payload);
    writer.write_frame(&frame).await?;
    Ok(message_id)
}

/// Send a `ServerMessage` echoing the request's message id
pub async fn send_server_message_with_id<W>(
    writer: &mut FrameWriter<W>,
    message: &ServerMessage,
    message_id: MessageId,
) -> io::Result<()>
where
    W: AsyncWriteExt + Unpin,
{
    let payload =
        serde_json::to_vec(message).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    let frame = RawFrame::new(message_id, server_message_type(message).to_string(), payload);
    writer.write_frame(&frame).await.map_err(Into::into)
}

// =============================================================================
// Message Receiving
// =============================================================================

/// Received client message with its message ID
#[derive(Debug)]
pub struct ReceivedClientMessage {
    pub message_id: MessageId,
    pub message: ClientMessage,
}

/// Received server message with its message ID
#[derive(Debug)]
pub struct ReceivedServerMessage {
    pub message_id: MessageId,
    pub message: ServerMessage,
}

/// Read a `ClientMessage`, allowing the connection to idle between requests
///
/// Once the first byte of a frame arrives the frame must complete within
/// 60 seconds. Returns `Ok(None)` if the connection was cleanly closed.
pub async fn read_client_message_with_timeout<R>(
    reader: &mut FrameReader<R>,
) -> Result<Option<ReceivedClientMessage>, FrameError>
where
    R: AsyncReadExt + Unpin,
{
    let Some(frame) = reader
        .read_frame_with_timeout(DEFAULT_FRAME_TIMEOUT)
        .await?
    else {
        return Ok(None);
    };

    parse_client_frame(frame)
        .map(Some)
        .map_err(|e| FrameError::InvalidJson(e.to_string()))
}

/// Read a `ClientMessage` with a timeout on the idle wait as well
///
/// Used on the transfer port. `None` timeouts fall back to the defaults
/// (30 seconds idle, 60 seconds per frame).
pub async fn read_client_message_with_full_timeout<R>(
    reader: &mut FrameReader<R>,
    idle_timeout: Option<Duration>,
    frame_timeout: Option<Duration>,
) -> Result<Option<ReceivedClientMessage>, FrameError>
where
    R: AsyncReadExt + Unpin,
{
    let idle = idle_timeout.unwrap_or(DEFAULT_IDLE_TIMEOUT);
    let frame_time = frame_timeout.unwrap_or(DEFAULT_FRAME_TIMEOUT);

    let Some(frame) = reader
        .read_frame_with_full_timeout(idle, frame_time)
        .await?
    else {
        return Ok(None);
    };

    parse_client_frame(frame)
        .map(Some)
        .map_err(|e| FrameError::InvalidJson(e.to_string()))
}

/// Read a `ServerMessage`
///
/// Returns `Ok(None)` if the connection was cleanly closed.
pub async fn read_server_message<R>(
    reader: &mut FrameReader<R>,
) -> io::Result<Option<ReceivedServerMessage>>
where
    R: AsyncReadExt + Unpin,
{
    let Some(frame) = reader.read_frame().await? else {
        return Ok(None);
    };

    parse_server_frame(frame).map(Some)
}

fn parse_client_frame(frame: RawFrame) -> io::Result<ReceivedClientMessage> {
    let message: ClientMessage = serde_json::from_slice(&frame.payload)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("invalid JSON: {e}")))?;

    check_frame_type(&frame.message_type, client_message_type(&message))?;

    Ok(ReceivedClientMessage {
        message_id: frame.message_id,
        message,
    })
}

fn parse_server_frame(frame: RawFrame) -> io::Result<ReceivedServerMessage> {
    let message: ServerMessage = serde_json::from_slice(&frame.payload)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("invalid JSON: {e}")))?;

    check_frame_type(&frame.message_type, server_message_type(&message))?;

    Ok(ReceivedServerMessage {
        message_id: frame.message_id,
        message,
    })
}

/// The frame header and the JSON `type` tag must agree
fn check_frame_type(frame_type: &str, expected_type: &str) -> io::Result<()> {
    if frame_type != expected_type {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame type mismatch: frame says '{frame_type}' but JSON is '{expected_type}'"),
        ));
    }
    Ok(())
}

// =============================================================================
// Message Type Helpers
// =============================================================================

/// Get the type name for a client message (matches enum variant name)
#[must_use]
pub fn client_message_type(message: &ClientMessage) -> &'static str {
    match message {
        ClientMessage::Handshake { .. } => "Handshake",
        ClientMessage::Roots => "Roots",
        ClientMessage::List { .. } => "List",
        ClientMessage::Lookup { .. } => "Lookup",
        ClientMessage::Metadata { .. } => "Metadata",
        ClientMessage::CreateFolder { .. } => "CreateFolder",
        ClientMessage::CreateFile { .. } => "CreateFile",
        ClientMessage::Update { .. } => "Update",
        ClientMessage::CancelUpload { .. } => "CancelUpload",
        ClientMessage::FinishUpload { .. } => "FinishUpload",
        ClientMessage::Download { .. } => "Download",
        ClientMessage::FinishDownload { .. } => "FinishDownload",
        ClientMessage::Delete { .. } => "Delete",
        ClientMessage::Move { .. } => "Move",
        ClientMessage::Copy { .. } => "Copy",
        ClientMessage::TransferAttach { .. } => "TransferAttach",
    }
}

/// Get the type name for a server message (matches enum variant name)
#[must_use]
pub fn server_message_type(message: &ServerMessage) -> &'static str {
    match message {
        ServerMessage::Error { .. } => "Error",
        ServerMessage::HandshakeResponse { .. } => "HandshakeResponse",
        ServerMessage::RootsResponse { .. } => "RootsResponse",
        ServerMessage::ListResponse { .. } => "ListResponse",
        ServerMessage::LookupResponse { .. } => "LookupResponse",
        ServerMessage::MetadataResponse { .. } => "MetadataResponse",
        ServerMessage::CreateFolderResponse { .. } => "CreateFolderResponse",
        ServerMessage::CreateFileResponse { .. } => "CreateFileResponse",
        ServerMessage::UpdateResponse { .. } => "UpdateResponse",
        ServerMessage::CancelUploadResponse { .. } => "CancelUploadResponse",
        ServerMessage::FinishUploadResponse { .. } => "FinishUploadResponse",
        ServerMessage::DownloadResponse { .. } => "DownloadResponse",
        ServerMessage::FinishDownloadResponse { .. } => "FinishDownloadResponse",
        ServerMessage::DeleteResponse { .. } => "DeleteResponse",
        ServerMessage::MoveResponse { .. } => "MoveResponse",
        ServerMessage::CopyResponse { .. } => "CopyResponse",
        ServerMessage::TransferAttachResponse { .. } => "TransferAttachResponse",
    }
}
