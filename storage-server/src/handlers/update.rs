//! Update message handler - opens an upload session replacing a file's content

use std::io;

use tokio::io::AsyncWrite;

use storage_common::protocol::ServerMessage;

use super::{HandlerContext, error_fields};

/// Handle an update request
pub async fn handle_update<W>(
    item_id: String,
    old_etag: String,
    ctx: &mut HandlerContext<'_, W>,
) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let response = match ctx.provider.update(ctx.client_id, &item_id, &old_etag) {
        Ok(handle) => {
            let endpoint = ctx.publish_endpoint(&handle.upload_id, handle.stream);
            ServerMessage::UpdateResponse {
                success: true,
                error: None,
                error_kind: None,
                upload_id: Some(handle.upload_id),
                endpoint: Some(endpoint),
            }
        }
        Err(e) => {
            let (error, error_kind) = error_fields(&e);
            ServerMessage::UpdateResponse {
                success: false,
                error,
                error_kind,
                upload_id: None,
                endpoint: None,
            }
        }
    };
    ctx.send_message(&response).await
}
