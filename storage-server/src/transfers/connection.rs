//! Transfer port connection handling
//!
//! A transfer connection carries exactly one frame, `TransferAttach{token}`.
//! After a successful `TransferAttachResponse` the connection stops being
//! framed and becomes the raw byte stream of the claimed session: bytes the
//! client writes go to an upload, a download's bytes flow back, and each
//! direction is shut down when its source ends.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info};

use storage_common::framing::{FrameError, FrameReader, FrameWriter, MessageId};
use storage_common::io::{read_client_message_with_full_timeout, send_server_message_with_id};
use storage_common::protocol::{ClientMessage, ServerMessage};
use storage_common::validators::validate_token;
use storage_common::{ERROR_KIND_INVALID_ARGUMENT, ERROR_KIND_NOT_FOUND};

use super::EndpointBroker;
use crate::constants::TRANSFER_ATTACH_TIMEOUT;
use crate::handlers::{
    err_expected_transfer_attach, err_invalid_message_format, err_transfer_token_invalid,
    err_transfer_token_unknown,
};
use crate::sessions::ByteStream;

/// Handle one connection on the transfer port
pub async fn handle_transfer_connection<S>(
    socket: S,
    peer_addr: SocketAddr,
    broker: Arc<EndpointBroker>,
) -> io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    let (reader, writer) = tokio::io::split(socket);
    let mut frame_reader = FrameReader::new(BufReader::new(reader));
    let mut frame_writer = FrameWriter::new(writer);

    let received = match read_client_message_with_full_timeout(
        &mut frame_reader,
        Some(TRANSFER_ATTACH_TIMEOUT),
        None,
    )
    .await
    {
        Ok(Some(received)) => received,
        Ok(None) => return Ok(()),
        Err(e) => {
            if !matches!(e, FrameError::IdleTimeout | FrameError::InvalidMagic) {
                debug!(target: "storaged::transfer", "bad attach frame from {}: {}", peer_addr, e);
            }
            let error = ServerMessage::Error {
                message: err_invalid_message_format(),
                command: None,
            };
            let _ = send_server_message_with_id(&mut frame_writer, &error, MessageId::new()).await;
            return Ok(());
        }
    };
    let message_id = received.message_id;

    let ClientMessage::TransferAttach { token } = received.message else {
        let error = ServerMessage::Error {
            message: err_expected_transfer_attach(),
            command: None,
        };
        send_server_message_with_id(&mut frame_writer, &error, message_id).await?;
        return Ok(());
    };

    if validate_token(&token).is_err() {
        let response = attach_failure(err_transfer_token_invalid(), ERROR_KIND_INVALID_ARGUMENT);
        send_server_message_with_id(&mut frame_writer, &response, message_id).await?;
        return Ok(());
    }

    let Some((session_id, stream)) = broker.redeem(&token) else {
        debug!(target: "storaged::transfer", "unknown transfer token from {}", peer_addr);
        let response = attach_failure(err_transfer_token_unknown(), ERROR_KIND_NOT_FOUND);
        send_server_message_with_id(&mut frame_writer, &response, message_id).await?;
        return Ok(());
    };

    let response = ServerMessage::TransferAttachResponse {
        success: true,
        error: None,
        error_kind: None,
        session_id: Some(session_id.clone()),
    };
    send_server_message_with_id(&mut frame_writer, &response, message_id).await?;
    info!(target: "storaged::transfer", "{} attached to session '{}'", peer_addr, session_id);

    // The buffered reader may already hold the first upload bytes
    let (sent, received) = bridge(frame_reader.into_inner(), frame_writer.into_inner(), stream).await;
    debug!(
        target: "storaged::transfer",
        "session '{}' stream closed: {} bytes in, {} bytes out",
        session_id,
        received,
        sent
    );
    Ok(())
}

fn attach_failure(message: String, kind: &str) -> ServerMessage {
    ServerMessage::TransferAttachResponse {
        success: false,
        error: Some(message),
        error_kind: Some(kind.to_string()),
        session_id: None,
    }
}

/// Copy both directions between the network and a session stream
///
/// Returns `(bytes to the client, bytes from the client)`.
async fn bridge<R, W>(mut net_reader: R, mut net_writer: W, stream: ByteStream) -> (u64, u64)
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let (mut stream_reader, mut stream_writer) = tokio::io::split(stream);

    let inbound = async {
        let copied = tokio::io::copy(&mut net_reader, &mut stream_writer).await;
        let _ = stream_writer.shutdown().await;
        copied.unwrap_or_default()
    };
    let outbound = async {
        let copied = tokio::io::copy(&mut stream_reader, &mut net_writer).await;
        let _ = net_writer.shutdown().await;
        copied.unwrap_or_default()
    };

    let (received, sent) = tokio::join!(inbound, outbound);
    (sent, received)
}
