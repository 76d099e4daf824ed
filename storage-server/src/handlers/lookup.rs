//! Lookup message handler - children of a folder with an exact name

use std::io;

use tokio::io::AsyncWrite;

use storage_common::protocol::ServerMessage;

use super::{HandlerContext, error_fields};

/// Handle a lookup request
pub async fn handle_lookup<W>(
    parent_id: String,
    name: String,
    ctx: &mut HandlerContext<'_, W>,
) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let response = match ctx.provider.lookup(&parent_id, &name) {
        Ok(items) => ServerMessage::LookupResponse {
            success: true,
            error: None,
            error_kind: None,
            items: Some(items),
        },
        Err(e) => {
            let (error, error_kind) = error_fields(&e);
            ServerMessage::LookupResponse {
                success: false,
                error,
                error_kind,
                items: None,
            }
        }
    };
    ctx.send_message(&response).await
}
