//! Metadata message handler

use std::io;

use tokio::io::AsyncWrite;

use storage_common::protocol::ServerMessage;

use super::{HandlerContext, error_fields};

/// Handle a metadata request
pub async fn handle_metadata<W>(item_id: String, ctx: &mut HandlerContext<'_, W>) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let response = match ctx.provider.metadata(&item_id) {
        Ok(item) => ServerMessage::MetadataResponse {
            success: true,
            error: None,
            error_kind: None,
            item: Some(item),
        },
        Err(e) => {
            let (error, error_kind) = error_fields(&e);
            ServerMessage::MetadataResponse {
                success: false,
                error,
                error_kind,
                item: None,
            }
        }
    };
    ctx.send_message(&response).await
}
