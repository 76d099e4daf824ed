//! Claiming a session's byte stream on the transfer port

use std::net::SocketAddr;

use tokio::io::BufReader;
use tokio::net::TcpStream;

use storage_common::framing::{FrameReader, FrameWriter};
use storage_common::io::{read_server_message, send_client_message};
use storage_common::protocol::{ClientMessage, ServerMessage, TransferEndpoint};

use crate::RESPONSE_TIMEOUT;
use crate::client::check_response;
use crate::error::{ClientError, ClientResult};

/// Raw byte stream of an upload or download
///
/// Buffered so bytes that arrived right behind the attach response are not
/// lost.
pub type TransferStream = BufReader<TcpStream>;

/// Redeem `endpoint` on the transfer port of the host at `server`
///
/// `server` is the control connection's peer address; only its IP is used.
/// On success the returned stream carries the session's content. Upload
/// streams must be shut down once the last byte is written.
pub async fn open_transfer(
    server: SocketAddr,
    endpoint: &TransferEndpoint,
) -> ClientResult<TransferStream> {
    let socket = TcpStream::connect(SocketAddr::new(server.ip(), endpoint.port)).await?;
    let _ = socket.set_nodelay(true);
    let mut reader = FrameReader::new(BufReader::new(socket));

    {
        let mut writer = FrameWriter::new(reader.get_mut().get_mut());
        let attach = ClientMessage::TransferAttach {
            token: endpoint.token.clone(),
        };
        send_client_message(&mut writer, &attach).await?;
    }

    let received = tokio::time::timeout(RESPONSE_TIMEOUT, read_server_message(&mut reader))
        .await
        .map_err(|_| ClientError::Timeout)??
        .ok_or(ClientError::ConnectionClosed)?;

    match received.message {
        ServerMessage::TransferAttachResponse {
            success,
            error,
            error_kind,
            ..
        } => check_response(success, error, error_kind)?,
        ServerMessage::Error { message, .. } => return Err(ClientError::Protocol(message)),
        other => {
            return Err(ClientError::Protocol(format!(
                "unexpected reply to TransferAttach: {other:?}"
            )));
        }
    }

    Ok(reader.into_inner())
}
