//! CreateFolder message handler

use std::io;

use tokio::io::AsyncWrite;

use storage_common::protocol::ServerMessage;

use super::{HandlerContext, error_fields};

/// Handle a create folder request
pub async fn handle_create_folder<W>(
    parent_id: String,
    name: String,
    ctx: &mut HandlerContext<'_, W>,
) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let response = match ctx.provider.create_folder(&parent_id, &name) {
        Ok(item) => ServerMessage::CreateFolderResponse {
            success: true,
            error: None,
            error_kind: None,
            item: Some(item),
        },
        Err(e) => {
            let (error, error_kind) = error_fields(&e);
            ServerMessage::CreateFolderResponse {
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
    use crate::handlers::testing::{create_test_context, read_server_message};
    use storage_common::{ERROR_KIND_CONFLICT, ERROR_KIND_INVALID_ARGUMENT, ItemType};

    #[tokio::test]
    async fn test_create_folder_success() {
        let mut test_ctx = create_test_context().await;

        handle_create_folder(
            test_ctx.root_id.clone(),
            "Docs".to_string(),
            &mut test_ctx.handler_context(),
        )
        .await
        .unwrap();

        match read_server_message(&mut test_ctx.client).await {
            ServerMessage::CreateFolderResponse { success, item, .. } => {
                assert!(success);
                let item = item.unwrap();
                assert_eq!(item.name, "Docs");
                assert_eq!(item.item_type, ItemType::Folder);
                assert_eq!(item.parent_id, test_ctx.root_id);
            }
            other => panic!("Expected CreateFolderResponse, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_folder_conflict() {
        let mut test_ctx = create_test_context().await;
        test_ctx
            .provider
            .create_folder(&test_ctx.root_id, "Docs")
            .unwrap();

        handle_create_folder(
            test_ctx.root_id.clone(),
            "Docs".to_string(),
            &mut test_ctx.handler_context(),
        )
        .await
        .unwrap();

        match read_server_message(&mut test_ctx.client).await {
            ServerMessage::CreateFolderResponse {
                success,
                error_kind,
                ..
            } => {
                assert!(!success);
                assert_eq!(error_kind.as_deref(), Some(ERROR_KIND_CONFLICT));
            }
            other => panic!("Expected CreateFolderResponse, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_folder_rejects_separator() {
        let mut test_ctx = create_test_context().await;

        handle_create_folder(
            test_ctx.root_id.clone(),
            "a/b".to_string(),
            &mut test_ctx.handler_context(),
        )
        .await
        .unwrap();

        match read_server_message(&mut test_ctx.client).await {
            ServerMessage::CreateFolderResponse { error_kind, .. } => {
                assert_eq!(error_kind.as_deref(), Some(ERROR_KIND_INVALID_ARGUMENT));
            }
            other => panic!("Expected CreateFolderResponse, got {other:?}"),
        }
    }
}
