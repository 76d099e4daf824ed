//! List message handler - one page of a folder's children

use std::io;

use tokio::io::AsyncWrite;

use storage_common::protocol::ServerMessage;

use super::{HandlerContext, error_fields};

/// Handle a list request
pub async fn handle_list<W>(
    item_id: String,
    page_token: String,
    ctx: &mut HandlerContext<'_, W>,
) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let response = match ctx.provider.list(&item_id, &page_token) {
        Ok((items, next_page_token)) => ServerMessage::ListResponse {
            success: true,
            error: None,
            error_kind: None,
            items: Some(items),
            next_page_token: Some(next_page_token),
        },
        Err(e) => {
            let (error, error_kind) = error_fields(&e);
            ServerMessage::ListResponse {
                success: false,
                error,
                error_kind,
                items: None,
                next_page_token: None,
            }
        }
    };
    ctx.send_message(&response).await
}
