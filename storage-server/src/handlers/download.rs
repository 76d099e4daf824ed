//! Download message handler - opens a download session

use std::io;

use tokio::io::AsyncWrite;

use storage_common::protocol::ServerMessage;

use super::{HandlerContext, error_fields};

/// Handle a download request
pub async fn handle_download<W>(
    item_id: String,
    match_etag: String,
    ctx: &mut HandlerContext<'_, W>,
) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let response = match ctx.provider.download(ctx.client_id, &item_id, &match_etag) {
        Ok(handle) => {
            let endpoint = ctx.publish_endpoint(&handle.download_id, handle.stream);
            ServerMessage::DownloadResponse {
                success: true,
                error: None,
                error_kind: None,
                download_id: Some(handle.download_id),
                endpoint: Some(endpoint),
            }
        }
        Err(e) => {
            let (error, error_kind) = error_fields(&e);
            ServerMessage::DownloadResponse {
                success: false,
                error,
                error_kind,
                download_id: None,
                endpoint: None,
            }
        }
    };
    ctx.send_message(&response).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::{create_test_context, read_server_message, upload_file};
    use storage_common::{ERROR_KIND_CONFLICT, ERROR_KIND_INVALID_ARGUMENT};
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_download_streams_content() {
        let mut test_ctx = create_test_context().await;
        let root_id = test_ctx.root_id.clone();
        let file = upload_file(&test_ctx, &root_id, "a.txt", b"payload").await;

        handle_download(file.item_id, file.etag, &mut test_ctx.handler_context())
            .await
            .unwrap();

        let endpoint = match read_server_message(&mut test_ctx.client).await {
            ServerMessage::DownloadResponse {
                success, endpoint, ..
            } => {
                assert!(success);
                endpoint.unwrap()
            }
            other => panic!("Expected DownloadResponse, got {other:?}"),
        };

        let (_, mut stream) = test_ctx.broker.redeem(&endpoint.token).unwrap();
        let mut received = Vec::new();
        stream.read_to_end(&mut received).await.unwrap();
        assert_eq!(received, b"payload");
    }

    #[tokio::test]
    async fn test_download_etag_mismatch() {
        let mut test_ctx = create_test_context().await;
        let root_id = test_ctx.root_id.clone();
        let file = upload_file(&test_ctx, &root_id, "a.txt", b"payload").await;

        handle_download(
            file.item_id,
            "ffffffffffffffff".to_string(),
            &mut test_ctx.handler_context(),
        )
        .await
        .unwrap();

        match read_server_message(&mut test_ctx.client).await {
            ServerMessage::DownloadResponse { error_kind, .. } => {
                assert_eq!(error_kind.as_deref(), Some(ERROR_KIND_CONFLICT));
            }
            other => panic!("Expected DownloadResponse, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_download_folder_rejected() {
        let mut test_ctx = create_test_context().await;

        handle_download(
            test_ctx.root_id.clone(),
            String::new(),
            &mut test_ctx.handler_context(),
        )
        .await
        .unwrap();

        match read_server_message(&mut test_ctx.client).await {
            ServerMessage::DownloadResponse { error_kind, .. } => {
                assert_eq!(error_kind.as_deref(), Some(ERROR_KIND_INVALID_ARGUMENT));
            }
            other => panic!("Expected DownloadResponse, got {other:?}"),
        }
    }
}
