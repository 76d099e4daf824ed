//! Copy message handler

use std::io;

use tokio::io::AsyncWrite;

use storage_common::protocol::ServerMessage;

use super::{HandlerContext, error_fields};

/// Handle a copy request
pub async fn handle_copy<W>(
    item_id: String,
    new_parent_id: String,
    new_name: String,
    ctx: &mut HandlerContext<'_, W>,
) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let response = match ctx.provider.copy(&item_id, &new_parent_id, &new_name) {
        Ok(item) => ServerMessage::CopyResponse {
            success: true,
            error: None,
            error_kind: None,
            item: Some(item),
        },
        Err(e) => {
            let (error, error_kind) = error_fields(&e);
            ServerMessage::CopyResponse {
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
    use storage_common::ERROR_KIND_NOT_FOUND;

    #[tokio::test]
    async fn test_copy_file() {
        let mut test_ctx = create_test_context().await;
        let root_id = test_ctx.root_id.clone();
        let file = upload_file(&test_ctx, &root_id, "a.txt", b"abc").await;

        handle_copy(
            file.item_id.clone(),
            root_id.clone(),
            "b.txt".to_string(),
            &mut test_ctx.handler_context(),
        )
        .await
        .unwrap();

        match read_server_message(&mut test_ctx.client).await {
            ServerMessage::CopyResponse { success, item, .. } => {
                assert!(success);
                let item = item.unwrap();
                assert_ne!(item.item_id, file.item_id);
                assert_eq!(item.name, "b.txt");
                assert_eq!(item.size, Some(3));
            }
            other => panic!("Expected CopyResponse, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_copy_into_missing_folder() {
        let mut test_ctx = create_test_context().await;
        let root_id = test_ctx.root_id.clone();
        let file = upload_file(&test_ctx, &root_id, "a.txt", b"abc").await;

        handle_copy(
            file.item_id,
            "missing".to_string(),
            "b.txt".to_string(),
            &mut test_ctx.handler_context(),
        )
        .await
        .unwrap();

        match read_server_message(&mut test_ctx.client).await {
            ServerMessage::CopyResponse { error_kind, .. } => {
                assert_eq!(error_kind.as_deref(), Some(ERROR_KIND_NOT_FOUND));
            }
            other => panic!("Expected CopyResponse, got {other:?}"),
        }
    }
}
