//! Delete message handler - removes an item and everything beneath it

use std::io;

use tokio::io::AsyncWrite;
use tracing::debug;

use storage_common::protocol::ServerMessage;

use super::{HandlerContext, error_fields};

/// Handle a delete request
pub async fn handle_delete<W>(item_id: String, ctx: &mut HandlerContext<'_, W>) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let response = match ctx.provider.delete(&item_id) {
        Ok(()) => {
            debug!(target: "storaged::conn", "{} deleted '{}'", ctx.peer_addr, item_id);
            ServerMessage::DeleteResponse {
                success: true,
                error: None,
                error_kind: None,
            }
        }
        Err(e) => {
            let (error, error_kind) = error_fields(&e);
            ServerMessage::DeleteResponse {
                success: false,
                error,
                error_kind,
            }
        }
    };
    ctx.send_message(&response).await
}
