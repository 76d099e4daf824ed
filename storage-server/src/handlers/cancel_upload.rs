//! CancelUpload message handler
//!
//! Cancelling is idempotent: unknown, settled and foreign upload ids all
//! succeed without effect.

use std::io;

use tokio::io::AsyncWrite;

use storage_common::protocol::ServerMessage;

use super::{HandlerContext, error_fields};

/// Handle a cancel upload request
pub async fn handle_cancel_upload<W>(upload_id: String, ctx: &mut HandlerContext<'_, W>) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let response = match ctx.provider.cancel_upload(ctx.client_id, &upload_id) {
        Ok(()) => {
            ctx.broker.discard_session(&upload_id, ctx.client_id);
            ServerMessage::CancelUploadResponse {
                success: true,
                error: None,
                error_kind: None,
            }
        }
        Err(e) => {
            let (error, error_kind) = error_fields(&e);
            ServerMessage::CancelUploadResponse {
                success: false,
                error,
                error_kind,
            }
        }
    };
    ctx.send_message(&response).await
}
