//! CreateFile message handler - opens an upload session for a new file

use std::io;

use tokio::io::AsyncWrite;

use storage_common::protocol::ServerMessage;

use super::{HandlerContext, error_fields};

/// Fields of a CreateFile request
#[derive(Debug, Clone)]
pub struct CreateFileRequest {
    pub parent_id: String,
    pub name: String,
    pub content_type: String,
    pub allow_overwrite: bool,
    pub expected_etag: String,
}

/// Handle a create file request
///
/// The response carries the upload id and the transfer endpoint the client
/// writes the content to.
pub async fn handle_create_file<W>(
    request: CreateFileRequest,
    ctx: &mut HandlerContext<'_, W>,
) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let result = ctx.provider.create_file(
        ctx.client_id,
        &request.parent_id,
        &request.name,
        &request.content_type,
        request.allow_overwrite,
        &request.expected_etag,
    );

    let response = match result {
        Ok(handle) => {
            let endpoint = ctx.publish_endpoint(&handle.upload_id, handle.stream);
            ServerMessage::CreateFileResponse {
                success: true,
                error: None,
                error_kind: None,
                upload_id: Some(handle.upload_id),
                endpoint: Some(endpoint),
            }
        }
        Err(e) => {
            let (error, error_kind) = error_fields(&e);
            ServerMessage::CreateFileResponse {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::{create_test_context, read_server_message, upload_file};
    use storage_common::{DEFAULT_TRANSFER_PORT, ERROR_KIND_CONFLICT, ERROR_KIND_NOT_FOUND};
    use tokio::io::AsyncWriteExt;

    fn request(parent_id: &str, name: &str) -> CreateFileRequest {
        CreateFileRequest {
            parent_id: parent_id.to_string(),
            name: name.to_string(),
            content_type: "text/plain".to_string(),
            allow_overwrite: false,
            expected_etag: String::new(),
        }
    }

    #[tokio::test]
    async fn test_create_file_publishes_endpoint() {
        let mut test_ctx = create_test_context().await;
        let root_id = test_ctx.root_id.clone();

        handle_create_file(request(&root_id, "a.txt"), &mut test_ctx.handler_context())
            .await
            .unwrap();

        let (upload_id, endpoint) = match read_server_message(&mut test_ctx.client).await {
            ServerMessage::CreateFileResponse {
                success,
                upload_id,
                endpoint,
                ..
            } => {
                assert!(success);
                (upload_id.unwrap(), endpoint.unwrap())
            }
            other => panic!("Expected CreateFileResponse, got {other:?}"),
        };
        assert_eq!(endpoint.port, DEFAULT_TRANSFER_PORT);

        let (session_id, mut stream) = test_ctx.broker.redeem(&endpoint.token).unwrap();
        assert_eq!(session_id, upload_id);
        stream.write_all(b"hi").await.unwrap();
        stream.shutdown().await.unwrap();

        let item = test_ctx
            .provider
            .finish_upload(test_ctx.client_id, &upload_id)
            .await
            .unwrap();
        assert_eq!(item.name, "a.txt");
        assert_eq!(item.size, Some(2));
    }

    #[tokio::test]
    async fn test_create_file_existing_name_conflicts() {
        let mut test_ctx = create_test_context().await;
        let root_id = test_ctx.root_id.clone();
        upload_file(&test_ctx, &root_id, "a.txt", b"x").await;

        handle_create_file(request(&root_id, "a.txt"), &mut test_ctx.handler_context())
            .await
            .unwrap();

        match read_server_message(&mut test_ctx.client).await {
            ServerMessage::CreateFileResponse {
                success,
                error_kind,
                endpoint,
                ..
            } => {
                assert!(!success);
                assert_eq!(error_kind.as_deref(), Some(ERROR_KIND_CONFLICT));
                assert!(endpoint.is_none());
            }
            other => panic!("Expected CreateFileResponse, got {other:?}"),
        }
        assert!(test_ctx.broker.is_empty());
    }

    #[tokio::test]
    async fn test_create_file_missing_parent() {
        let mut test_ctx = create_test_context().await;

        handle_create_file(request("missing", "a.txt"), &mut test_ctx.handler_context())
            .await
            .unwrap();

        match read_server_message(&mut test_ctx.client).await {
            ServerMessage::CreateFileResponse { error_kind, .. } => {
                assert_eq!(error_kind.as_deref(), Some(ERROR_KIND_NOT_FOUND));
            }
            other => panic!("Expected CreateFileResponse, got {other:?}"),
        }
    }
}
