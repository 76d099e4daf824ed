//! Roots message handler

use std::io;

use tokio::io::AsyncWrite;

use storage_common::protocol::ServerMessage;

use super::{HandlerContext, error_fields};

/// Handle a roots request
pub async fn handle_roots<W>(ctx: &mut HandlerContext<'_, W>) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let response = match ctx.provider.roots() {
        Ok(items) => ServerMessage::RootsResponse {
            success: true,
            error: None,
            error_kind: None,
            items: Some(items),
        },
        Err(e) => {
            let (error, error_kind) = error_fields(&e);
            ServerMessage::RootsResponse {
                success: false,
                error,
                error_kind,
                items: None,
            }
        }
    };
    ctx.send_message(&response).await
}
