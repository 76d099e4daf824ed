//! Control connection handling

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use storage_common::framing::{FrameError, FrameReader, FrameWriter, MessageId};
use storage_common::io::{
    ReceivedClientMessage, client_message_type, read_client_message_with_full_timeout,
    read_client_message_with_timeout, send_server_message_with_id,
};
use storage_common::protocol::{ClientMessage, ServerMessage};

use crate::activity::ActivityTracker;
use crate::constants::CONTROL_READ_AHEAD;
use crate::handlers::{
    self, HandlerContext, err_handshake_required, err_invalid_message_format,
    err_message_not_supported,
};
use crate::provider::Provider;
use crate::sessions::ClientId;
use crate::transfers::EndpointBroker;

/// Parameters for handling a connection
pub struct ConnectionParams {
    pub peer_addr: SocketAddr,
    pub provider: Provider,
    pub broker: Arc<EndpointBroker>,
    pub transfer_port: u16,
    pub activity: Arc<ActivityTracker>,
}

/// What the read side of a control connection produced
enum Inbound {
    Message(ReceivedClientMessage),
    Malformed(FrameError),
    Closed,
}

/// Handle one control connection until it closes
///
/// Every session the connection opened and did not settle is cancelled
/// when it goes away, including one whose finish is still waiting.
pub async fn handle_connection<S>(socket: S, params: ConnectionParams) -> io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let ConnectionParams {
        peer_addr,
        provider,
        broker,
        transfer_port,
        activity,
    } = params;

    let _activity = activity.begin();
    let client_id = ClientId::next();
    info!(target: "storaged::conn", "client {} connected from {}", client_id, peer_addr);

    let (reader, writer) = tokio::io::split(socket);
    let (tx, mut rx) = mpsc::channel(CONTROL_READ_AHEAD);
    let read_task = tokio::spawn(read_inbound(FrameReader::new(BufReader::new(reader)), tx));
    let mut frame_writer = FrameWriter::new(writer);
    let mut handshake_complete = false;
    let mut queued: Option<Inbound> = None;
    let mut released = 0;

    loop {
        let inbound = match queued.take() {
            Some(inbound) => inbound,
            None => next_inbound(&mut rx).await,
        };

        let received = match inbound {
            Inbound::Message(received) => received,
            Inbound::Closed => break,
            Inbound::Malformed(e) => {
                let is_common_error = matches!(
                    e,
                    FrameError::InvalidMagic | FrameError::FrameTimeout | FrameError::IdleTimeout
                );
                if is_common_error {
                    debug!(target: "storaged::conn", "frame error from {}: {}", peer_addr, e);
                } else {
                    warn!(target: "storaged::conn", "frame error from {}: {}", peer_addr, e);
                }

                let error_msg = ServerMessage::Error {
                    message: err_invalid_message_format(),
                    command: None,
                };
                let _ = send_server_message_with_id(&mut frame_writer, &error_msg, MessageId::new())
                    .await;
                break;
            }
        };

        let handled = async {
            let mut ctx = HandlerContext {
                writer: &mut frame_writer,
                peer_addr,
                provider: &provider,
                broker: &broker,
                client_id,
                message_id: received.message_id,
                transfer_port,
            };
            handle_client_message(received.message, &mut handshake_complete, &mut ctx).await
        };
        tokio::pin!(handled);

        // Keep reading while the handler runs so a hang-up is seen even when
        // the handler is waiting on a transfer
        let result = loop {
            tokio::select! {
                result = &mut handled => break result,
                inbound = next_inbound(&mut rx), if queued.is_none() => {
                    if !matches!(inbound, Inbound::Message(_)) {
                        released += provider.sessions().release_client(client_id);
                    }
                    queued = Some(inbound);
                }
            }
        };

        if let Err(e) = result {
            debug!(target: "storaged::conn", "closing {}: {}", peer_addr, e);
            break;
        }
    }

    read_task.abort();
    released += provider.sessions().release_client(client_id);
    broker.discard_client(client_id);
    let _ = frame_writer.get_mut().shutdown().await;

    info!(
        target: "storaged::conn",
        "client {} from {} disconnected ({} open session(s) released)",
        client_id,
        peer_addr,
        released
    );
    Ok(())
}

/// Read frames until the peer closes or sends garbage
///
/// The first frame must arrive within the idle timeout.
async fn read_inbound<R>(mut reader: FrameReader<R>, tx: mpsc::Sender<Inbound>)
where
    R: AsyncRead + Unpin,
{
    let mut first = true;
    loop {
        let result = if first {
            read_client_message_with_full_timeout(&mut reader, None, None).await
        } else {
            read_client_message_with_timeout(&mut reader).await
        };
        first = false;

        let inbound = match result {
            Ok(Some(received)) => Inbound::Message(received),
            Ok(None) => Inbound::Closed,
            Err(e) => Inbound::Malformed(e),
        };
        let last = !matches!(inbound, Inbound::Message(_));
        if tx.send(inbound).await.is_err() || last {
            break;
        }
    }
}

async fn next_inbound(rx: &mut mpsc::Receiver<Inbound>) -> Inbound {
    rx.recv().await.unwrap_or(Inbound::Closed)
}

/// Dispatch one message to its handler
async fn handle_client_message<W>(
    msg: ClientMessage,
    handshake_complete: &mut bool,
    ctx: &mut HandlerContext<'_, W>,
) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    if !*handshake_complete && !matches!(msg, ClientMessage::Handshake { .. }) {
        return ctx
            .send_error_and_disconnect(&err_handshake_required(), Some(client_message_type(&msg)))
            .await;
    }

    match msg {
        ClientMessage::Handshake { version } => {
            handlers::handle_handshake(version, handshake_complete, ctx).await?;
        }
        ClientMessage::Roots => {
            handlers::handle_roots(ctx).await?;
        }
        ClientMessage::List {
            item_id,
            page_token,
        } => {
            handlers::handle_list(item_id, page_token, ctx).await?;
        }
        ClientMessage::Lookup { parent_id, name } => {
            handlers::handle_lookup(parent_id, name, ctx).await?;
        }
        ClientMessage::Metadata { item_id } => {
            handlers::handle_metadata(item_id, ctx).await?;
        }
        ClientMessage::CreateFolder { parent_id, name } => {
            handlers::handle_create_folder(parent_id, name, ctx).await?;
        }
        ClientMessage::CreateFile {
            parent_id,
            name,
            content_type,
            allow_overwrite,
            expected_etag,
        } => {
            let request = handlers::CreateFileRequest {
                parent_id,
                name,
                content_type,
                allow_overwrite,
                expected_etag,
            };
            handlers::handle_create_file(request, ctx).await?;
        }
        ClientMessage::Update { item_id, old_etag } => {
            handlers::handle_update(item_id, old_etag, ctx).await?;
        }
        ClientMessage::CancelUpload { upload_id } => {
            handlers::handle_cancel_upload(upload_id, ctx).await?;
        }
        ClientMessage::FinishUpload { upload_id } => {
            handlers::handle_finish_upload(upload_id, ctx).await?;
        }
        ClientMessage::Download {
            item_id,
            match_etag,
        } => {
            handlers::handle_download(item_id, match_etag, ctx).await?;
        }
        ClientMessage::FinishDownload { download_id } => {
            handlers::handle_finish_download(download_id, ctx).await?;
        }
        ClientMessage::Delete { item_id } => {
            handlers::handle_delete(item_id, ctx).await?;
        }
        ClientMessage::Move {
            item_id,
            new_parent_id,
            new_name,
        } => {
            handlers::handle_move(item_id, new_parent_id, new_name, ctx).await?;
        }
        ClientMessage::Copy {
            item_id,
            new_parent_id,
            new_name,
        } => {
            handlers::handle_copy(item_id, new_parent_id, new_name, ctx).await?;
        }
        ClientMessage::TransferAttach { .. } => {
            ctx.send_error(&err_message_not_supported(), Some("TransferAttach"))
                .await?;
        }
    }

    Ok(())
}
