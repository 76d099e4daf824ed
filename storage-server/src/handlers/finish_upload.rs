//! FinishUpload message handler - commits an upload's staged bytes

use std::io;

use tokio::io::AsyncWrite;

use storage_common::protocol::ServerMessage;

use super::{HandlerContext, error_fields};

/// Handle a finish upload request
///
/// A stream nobody attached to is dropped first, which ends the content.
/// Otherwise this waits until the attached client shuts down its side.
pub async fn handle_finish_upload<W>(upload_id: String, ctx: &mut HandlerContext<'_, W>) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    ctx.broker.discard_session(&upload_id, ctx.client_id);

    let response = match ctx.provider.finish_upload(ctx.client_id, &upload_id).await {
        Ok(item) => ServerMessage::FinishUploadResponse {
            success: true,
            error: None,
            error_kind: None,
            item: Some(item),
        },
        Err(e) => {
            let (error, error_kind) = error_fields(&e);
            ServerMessage::FinishUploadResponse {
                success: false,
                error,
                error_kind,
                item: None,
            }
        }
    };
    ctx.send_message(&response).await
}
