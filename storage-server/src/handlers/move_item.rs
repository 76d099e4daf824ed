//! Move message handler - moves and/or renames an item

use std::io;

use tokio::io::AsyncWrite;

use storage_common::protocol::ServerMessage;

use super::{HandlerContext, error_fields};

/// Handle a move request
pub async fn handle_move<W>(
    item_id: String,
    new_parent_id: String,
    new_name: String,
    ctx: &mut HandlerContext<'_, W>,
) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let response = match ctx.provider.move_item(&item_id, &new_parent_id, &new_name) {
        Ok(item) => ServerMessage::MoveResponse {
            success: true,
            error: None,
            error_kind: None,
            item: Some(item),
        },
        Err(e) => {
            let (error, error_kind) = error_fields(&e);
            ServerMessage::MoveResponse {
                success: false,
                error,
                error_kind,
                item: None,
            }
        }
    };
    ctx.send_message(&response).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::{create_test_context, read_server_message, upload_file};
    use storage_common::ERROR_KIND_CONFLICT;

    #[tokio::test]
    async fn test_move_then_lookup() {
        let mut test_ctx = create_test_context().await;
        let root_id = test_ctx.root_id.clone();
        let docs = test_ctx.provider.create_folder(&root_id, "Docs").unwrap();
        let file = upload_file(&test_ctx, &root_id, "a.txt", b"x").await;

        handle_move(
            file.item_id.clone(),
            docs.item_id.clone(),
            "renamed".to_string(),
            &mut test_ctx.handler_context(),
        )
        .await
        .unwrap();

        match read_server_message(&mut test_ctx.client).await {
            ServerMessage::MoveResponse { success, item, .. } => {
                assert!(success);
                let item = item.unwrap();
                assert_eq!(item.parent_id, docs.item_id);
                assert_eq!(item.name, "renamed");
            }
            other => panic!("Expected MoveResponse, got {other:?}"),
        }

        let found = test_ctx.provider.lookup(&docs.item_id, "renamed").unwrap();
        assert_eq!(found[0].item_id, file.item_id);
        assert!(test_ctx.provider.lookup(&root_id, "a.txt").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_move_onto_taken_name() {
        let mut test_ctx = create_test_context().await;
        let root_id = test_ctx.root_id.clone();
        upload_file(&test_ctx, &root_id, "a.txt", b"a").await;
        let b = upload_file(&test_ctx, &root_id, "b.txt", b"b").await;

        handle_move(
            b.item_id,
            root_id,
            "a.txt".to_string(),
            &mut test_ctx.handler_context(),
        )
        .await
        .unwrap();

        match read_server_message(&mut test_ctx.client).await {
            ServerMessage::MoveResponse { error_kind, .. } => {
                assert_eq!(error_kind.as_deref(), Some(ERROR_KIND_CONFLICT));
            }
            other => panic!("Expected MoveResponse, got {other:?}"),
        }
    }
}
