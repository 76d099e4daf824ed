//! Control connection to a storage provider

use std::net::SocketAddr;

use tokio::io::BufReader;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};

use storage_common::framing::{FrameReader, FrameWriter};
use storage_common::io::{read_server_message, send_client_message};
use storage_common::protocol::{ClientMessage, ServerMessage, TransferEndpoint};
use storage_common::{ErrorKind, Item, PROTOCOL_VERSION};

use crate::RESPONSE_TIMEOUT;
use crate::error::{ClientError, ClientResult};
use crate::transfer::{TransferStream, open_transfer};

/// An open upload session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTicket {
    pub upload_id: String,
    pub endpoint: TransferEndpoint,
}

/// An open download session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTicket {
    pub download_id: String,
    pub endpoint: TransferEndpoint,
}

/// Handshaken control connection
///
/// Requests are strictly sequential: each method sends one frame and waits
/// for the reply carrying the same message id.
pub struct StorageClient {
    reader: FrameReader<BufReader<OwnedReadHalf>>,
    writer: FrameWriter<OwnedWriteHalf>,
    peer_addr: SocketAddr,
    server_version: String,
}

impl StorageClient {
    /// Connect and perform the version handshake
    pub async fn connect<A: ToSocketAddrs>(addr: A) -> ClientResult<Self> {
        let socket = TcpStream::connect(addr).await?;
        let _ = socket.set_nodelay(true);
        let peer_addr = socket.peer_addr()?;
        let (read_half, write_half) = socket.into_split();

        let mut client = Self {
            reader: FrameReader::new(BufReader::new(read_half)),
            writer: FrameWriter::new(write_half),
            peer_addr,
            server_version: String::new(),
        };

        let handshake = ClientMessage::Handshake {
            version: PROTOCOL_VERSION.to_string(),
        };
        match client.request(&handshake).await? {
            ServerMessage::HandshakeResponse {
                success: true,
                version,
                ..
            } => {
                client.server_version = version.unwrap_or_default();
                Ok(client)
            }
            ServerMessage::HandshakeResponse { error, .. } => {
                Err(ClientError::HandshakeRejected(error.unwrap_or_default()))
            }
            other => Err(unexpected("Handshake", &other)),
        }
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Protocol version the server announced
    pub fn server_version(&self) -> &str {
        &self.server_version
    }

    pub async fn roots(&mut self) -> ClientResult<Vec<Item>> {
        match self.request(&ClientMessage::Roots).await? {
            ServerMessage::RootsResponse {
                success,
                error,
                error_kind,
                items,
            } => {
                check_response(success, error, error_kind)?;
                items.ok_or_else(|| missing("items"))
            }
            other => Err(unexpected("Roots", &other)),
        }
    }

    /// One page of children; the returned token is empty on the last page
    pub async fn list(&mut self, item_id: &str, page_token: &str) -> ClientResult<(Vec<Item>, String)> {
        let msg = ClientMessage::List {
            item_id: item_id.to_string(),
            page_token: page_token.to_string(),
        };
        match self.request(&msg).await? {
            ServerMessage::ListResponse {
                success,
                error,
                error_kind,
                items,
                next_page_token,
            } => {
                check_response(success, error, error_kind)?;
                Ok((
                    items.ok_or_else(|| missing("items"))?,
                    next_page_token.unwrap_or_default(),
                ))
            }
            other => Err(unexpected("List", &other)),
        }
    }

    /// Follow page tokens until the listing is exhausted
    pub async fn list_all(&mut self, item_id: &str) -> ClientResult<Vec<Item>> {
        let mut all = Vec::new();
        let mut token = String::new();
        loop {
            let (items, next) = self.list(item_id, &token).await?;
            all.extend(items);
            if next.is_empty() {
                return Ok(all);
            }
            token = next;
        }
    }

    pub async fn lookup(&mut self, parent_id: &str, name: &str) -> ClientResult<Vec<Item>> {
        let msg = ClientMessage::Lookup {
            parent_id: parent_id.to_string(),
            name: name.to_string(),
        };
        match self.request(&msg).await? {
            ServerMessage::LookupResponse {
                success,
                error,
                error_kind,
                items,
            } => {
                check_response(success, error, error_kind)?;
                items.ok_or_else(|| missing("items"))
            }
            other => Err(unexpected("Lookup", &other)),
        }
    }

    pub async fn metadata(&mut self, item_id: &str) -> ClientResult<Item> {
        let msg = ClientMessage::Metadata {
            item_id: item_id.to_string(),
        };
        match self.request(&msg).await? {
            ServerMessage::MetadataResponse {
                success,
                error,
                error_kind,
                item,
            } => {
                check_response(success, error, error_kind)?;
                item.ok_or_else(|| missing("item"))
            }
            other => Err(unexpected("Metadata", &other)),
        }
    }

    pub async fn create_folder(&mut self, parent_id: &str, name: &str) -> ClientResult<Item> {
        let msg = ClientMessage::CreateFolder {
            parent_id: parent_id.to_string(),
            name: name.to_string(),
        };
        match self.request(&msg).await? {
            ServerMessage::CreateFolderResponse {
                success,
                error,
                error_kind,
                item,
            } => {
                check_response(success, error, error_kind)?;
                item.ok_or_else(|| missing("item"))
            }
            other => Err(unexpected("CreateFolder", &other)),
        }
    }

    /// Open an upload that creates (or with `allow_overwrite`, replaces) `name`
    ///
    /// An empty `content_type` lets the server infer it from the bytes.
    pub async fn create_file(
        &mut self,
        parent_id: &str,
        name: &str,
        content_type: &str,
        allow_overwrite: bool,
        expected_etag: &str,
    ) -> ClientResult<UploadTicket> {
        let msg = ClientMessage::CreateFile {
            parent_id: parent_id.to_string(),
            name: name.to_string(),
            content_type: content_type.to_string(),
            allow_overwrite,
            expected_etag: expected_etag.to_string(),
        };
        match self.request(&msg).await? {
            ServerMessage::CreateFileResponse {
                success,
                error,
                error_kind,
                upload_id,
                endpoint,
            } => {
                check_response(success, error, error_kind)?;
                upload_ticket(upload_id, endpoint)
            }
            other => Err(unexpected("CreateFile", &other)),
        }
    }

    /// Open an upload replacing the content of `item_id`
    pub async fn update(&mut self, item_id: &str, old_etag: &str) -> ClientResult<UploadTicket> {
        let msg = ClientMessage::Update {
            item_id: item_id.to_string(),
            old_etag: old_etag.to_string(),
        };
        match self.request(&msg).await? {
            ServerMessage::UpdateResponse {
                success,
                error,
                error_kind,
                upload_id,
                endpoint,
            } => {
                check_response(success, error, error_kind)?;
                upload_ticket(upload_id, endpoint)
            }
            other => Err(unexpected("Update", &other)),
        }
    }

    pub async fn cancel_upload(&mut self, upload_id: &str) -> ClientResult<()> {
        let msg = ClientMessage::CancelUpload {
            upload_id: upload_id.to_string(),
        };
        match self.request(&msg).await? {
            ServerMessage::CancelUploadResponse {
                success,
                error,
                error_kind,
            } => check_response(success, error, error_kind),
            other => Err(unexpected("CancelUpload", &other)),
        }
    }

    /// Commit an upload once its stream has been shut down
    pub async fn finish_upload(&mut self, upload_id: &str) -> ClientResult<Item> {
        let msg = ClientMessage::FinishUpload {
            upload_id: upload_id.to_string(),
        };
        match self.request(&msg).await? {
            ServerMessage::FinishUploadResponse {
                success,
                error,
                error_kind,
                item,
            } => {
                check_response(success, error, error_kind)?;
                item.ok_or_else(|| missing("item"))
            }
            other => Err(unexpected("FinishUpload", &other)),
        }
    }

    /// Open a download; a non-empty `match_etag` must equal the current etag
    pub async fn download(&mut self, item_id: &str, match_etag: &str) -> ClientResult<DownloadTicket> {
        let msg = ClientMessage::Download {
            item_id: item_id.to_string(),
            match_etag: match_etag.to_string(),
        };
        match self.request(&msg).await? {
            ServerMessage::DownloadResponse {
                success,
                error,
                error_kind,
                download_id,
                endpoint,
            } => {
                check_response(success, error, error_kind)?;
                Ok(DownloadTicket {
                    download_id: download_id.ok_or_else(|| missing("download_id"))?,
                    endpoint: endpoint.ok_or_else(|| missing("endpoint"))?,
                })
            }
            other => Err(unexpected("Download", &other)),
        }
    }

    pub async fn finish_download(&mut self, download_id: &str) -> ClientResult<()> {
        let msg = ClientMessage::FinishDownload {
            download_id: download_id.to_string(),
        };
        match self.request(&msg).await? {
            ServerMessage::FinishDownloadResponse {
                success,
                error,
                error_kind,
            } => check_response(success, error, error_kind),
            other => Err(unexpected("FinishDownload", &other)),
        }
    }

    pub async fn delete(&mut self, item_id: &str) -> ClientResult<()> {
        let msg = ClientMessage::Delete {
            item_id: item_id.to_string(),
        };
        match self.request(&msg).await? {
            ServerMessage::DeleteResponse {
                success,
                error,
                error_kind,
            } => check_response(success, error, error_kind),
            other => Err(unexpected("Delete", &other)),
        }
    }

    pub async fn move_item(
        &mut self,
        item_id: &str,
        new_parent_id: &str,
        new_name: &str,
    ) -> ClientResult<Item> {
        let msg = ClientMessage::Move {
            item_id: item_id.to_string(),
            new_parent_id: new_parent_id.to_string(),
            new_name: new_name.to_string(),
        };
        match self.request(&msg).await? {
            ServerMessage::MoveResponse {
                success,
                error,
                error_kind,
                item,
            } => {
                check_response(success, error, error_kind)?;
                item.ok_or_else(|| missing("item"))
            }
            other => Err(unexpected("Move", &other)),
        }
    }

    pub async fn copy(&mut self, item_id: &str, new_parent_id: &str, new_name: &str) -> ClientResult<Item> {
        let msg = ClientMessage::Copy {
            item_id: item_id.to_string(),
            new_parent_id: new_parent_id.to_string(),
            new_name: new_name.to_string(),
        };
        match self.request(&msg).await? {
            ServerMessage::CopyResponse {
                success,
                error,
                error_kind,
                item,
            } => {
                check_response(success, error, error_kind)?;
                item.ok_or_else(|| missing("item"))
            }
            other => Err(unexpected("Copy", &other)),
        }
    }

    /// Claim the byte stream behind `endpoint` on this server's transfer port
    pub async fn open_transfer(&self, endpoint: &TransferEndpoint) -> ClientResult<TransferStream> {
        open_transfer(self.peer_addr, endpoint).await
    }

    /// Send one request and wait for its reply
    async fn request(&mut self, message: &ClientMessage) -> ClientResult<ServerMessage> {
        let message_id = send_client_message(&mut self.writer, message).await?;

        let received = tokio::time::timeout(RESPONSE_TIMEOUT, read_server_message(&mut self.reader))
            .await
            .map_err(|_| ClientError::Timeout)??
            .ok_or(ClientError::ConnectionClosed)?;

        if let ServerMessage::Error { message, .. } = received.message {
            return Err(ClientError::Protocol(message));
        }
        if received.message_id != message_id {
            return Err(ClientError::Protocol(format!(
                "reply id {} does not match request id {}",
                received.message_id, message_id
            )));
        }
        Ok(received.message)
    }
}

/// Turn the common `success`/`error`/`error_kind` triple into a result
pub(crate) fn check_response(
    success: bool,
    error: Option<String>,
    error_kind: Option<String>,
) -> ClientResult<()> {
    if success {
        return Ok(());
    }
    let kind = error_kind
        .as_deref()
        .and_then(ErrorKind::parse)
        .unwrap_or(ErrorKind::Internal);
    Err(ClientError::Server {
        kind,
        message: error.unwrap_or_default(),
    })
}

fn upload_ticket(
    upload_id: Option<String>,
    endpoint: Option<TransferEndpoint>,
) -> ClientResult<UploadTicket> {
    Ok(UploadTicket {
        upload_id: upload_id.ok_or_else(|| missing("upload_id"))?,
        endpoint: endpoint.ok_or_else(|| missing("endpoint"))?,
    })
}

fn missing(field: &str) -> ClientError {
    ClientError::Protocol(format!("successful response without {field}"))
}

fn unexpected(request: &str, reply: &ServerMessage) -> ClientError {
    ClientError::Protocol(format!("unexpected reply to {request}: {reply:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::net::TcpListener;

    use storage_common::io::{read_client_message_with_timeout, send_server_message_with_id};

    /// Serve a handshake, then answer the next request with `reply`
    async fn fake_server(reply: ServerMessage) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let (read_half, write_half) = socket.into_split();
            let mut reader = FrameReader::new(BufReader::new(read_half));
            let mut writer = FrameWriter::new(write_half);

            let hello = read_client_message_with_timeout(&mut reader)
                .await
                .unwrap()
                .unwrap();
            assert!(matches!(hello.message, ClientMessage::Handshake { .. }));
            let accept = ServerMessage::HandshakeResponse {
                success: true,
                version: Some(PROTOCOL_VERSION.to_string()),
                error: None,
            };
            send_server_message_with_id(&mut writer, &accept, hello.message_id)
                .await
                .unwrap();

            if let Ok(Some(request)) = read_client_message_with_timeout(&mut reader).await {
                send_server_message_with_id(&mut writer, &reply, request.message_id)
                    .await
                    .unwrap();
            }
        });
        addr
    }

    #[tokio::test]
    async fn test_connect_records_server_version() {
        let addr = fake_server(ServerMessage::RootsResponse {
            success: true,
            error: None,
            error_kind: None,
            items: Some(vec![]),
        })
        .await;
        let mut client = StorageClient::connect(addr).await.unwrap();
        assert_eq!(client.server_version(), PROTOCOL_VERSION);
        assert!(client.roots().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_server_failure_maps_kind() {
        let addr = fake_server(ServerMessage::MetadataResponse {
            success: false,
            error: Some("item 'x' not found".to_string()),
            error_kind: Some("not_found".to_string()),
            item: None,
        })
        .await;
        let mut client = StorageClient::connect(addr).await.unwrap();
        let err = client.metadata("x").await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::NotFound));
        assert!(err.to_string().contains("item 'x' not found"));
    }

    #[tokio::test]
    async fn test_wrong_reply_type_is_protocol_error() {
        let addr = fake_server(ServerMessage::DeleteResponse {
            success: true,
            error: None,
            error_kind: None,
        })
        .await;
        let mut client = StorageClient::connect(addr).await.unwrap();
        let err = client.metadata("x").await.unwrap_err();
        assert!(matches!(err, ClientError::Protocol(_)));
    }

    #[tokio::test]
    async fn test_success_without_payload_is_protocol_error() {
        let addr = fake_server(ServerMessage::CreateFileResponse {
            success: true,
            error: None,
            error_kind: None,
            upload_id: None,
            endpoint: None,
        })
        .await;
        let mut client = StorageClient::connect(addr).await.unwrap();
        let err = client
            .create_file("root", "a.txt", "", false, "")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Protocol(_)));
    }

    #[tokio::test]
    async fn test_rejected_handshake() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let (read_half, write_half) = socket.into_split();
            let mut reader = FrameReader::new(BufReader::new(read_half));
            let mut writer = FrameWriter::new(write_half);
            let hello = read_client_message_with_timeout(&mut reader)
                .await
                .unwrap()
                .unwrap();
            let reject = ServerMessage::HandshakeResponse {
                success: false,
                version: None,
                error: Some("incompatible".to_string()),
            };
            send_server_message_with_id(&mut writer, &reject, hello.message_id)
                .await
                .unwrap();
        });

        let err = StorageClient::connect(addr).await.err().unwrap();
        assert!(matches!(err, ClientError::HandshakeRejected(ref m) if m == "incompatible"));
    }

    #[test]
    fn test_check_response_unknown_kind_is_internal() {
        let err = check_response(false, Some("boom".to_string()), Some("exploded".to_string()))
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Internal));
        assert!(check_response(true, None, None).is_ok());
    }
}
