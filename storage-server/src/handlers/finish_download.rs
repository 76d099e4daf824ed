//! FinishDownload message handler

use std::io;

use tokio::io::AsyncWrite;

use storage_common::protocol::ServerMessage;

use super::{HandlerContext, error_fields};

/// Handle a finish download request
pub async fn handle_finish_download<W>(
    download_id: String,
    ctx: &mut HandlerContext<'_, W>,
) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    ctx.broker.discard_session(&download_id, ctx.client_id);

    let response = match ctx.provider.finish_download(ctx.client_id, &download_id) {
        Ok(()) => ServerMessage::FinishDownloadResponse {
            success: true,
            error: None,
            error_kind: None,
        },
        Err(e) => {
            let (error, error_kind) = error_fields(&e);
            ServerMessage::FinishDownloadResponse {
                success: false,
                error,
                error_kind,
            }
        }
    };
    ctx.send_message(&response).await
}
