//! Shared test utilities for handler tests

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use storage_common::Item;
use storage_common::framing::{FrameReader, FrameWriter, MessageId};
use storage_common::io::read_server_message as io_read_server_message;
use storage_common::protocol::ServerMessage;

use super::HandlerContext;
use crate::activity::ActivityTracker;
use crate::provider::Provider;
use crate::sessions::{ClientId, SessionManager};
use crate::store::{EntityStore, StoreOptions};
use crate::transfers::EndpointBroker;

/// Type alias for the write half used in tests
type TestWriteHalf = tokio::net::tcp::OwnedWriteHalf;
/// Type alias for the read half used in tests
type TestReadHalf = tokio::net::tcp::OwnedReadHalf;

/// Test context that owns all resources needed for handler testing
pub struct TestContext {
    /// Client side of the control connection, for reading responses
    pub client: FrameReader<BufReader<TestReadHalf>>,
    pub frame_writer: FrameWriter<TestWriteHalf>,
    pub provider: Provider,
    pub broker: EndpointBroker,
    pub client_id: ClientId,
    pub peer_addr: SocketAddr,
    pub message_id: MessageId,
    /// Id of the single root, "Home"
    pub root_id: String,
}

impl TestContext {
    /// Create a HandlerContext from this TestContext
    pub fn handler_context(&mut self) -> HandlerContext<'_, TestWriteHalf> {
        HandlerContext {
            writer: &mut self.frame_writer,
            peer_addr: self.peer_addr,
            provider: &self.provider,
            broker: &self.broker,
            client_id: self.client_id,
            message_id: self.message_id,
            transfer_port: storage_common::DEFAULT_TRANSFER_PORT,
        }
    }
}

/// Helper to create test context using real TCP sockets
pub async fn create_test_context() -> TestContext {
    let store = Arc::new(EntityStore::new(StoreOptions::default()));
    let root_id = store.add_root("Home").item_id;
    let sessions = Arc::new(SessionManager::new(store, u64::MAX, ActivityTracker::new()));
    let provider = Provider::new(sessions);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let client_handle = tokio::spawn(async move { TcpStream::connect(addr).await.unwrap() });

    let (server_stream, peer_addr) = listener.accept().await.unwrap();
    let (_read_half, write_half) = server_stream.into_split();
    let frame_writer = FrameWriter::new(write_half);

    let client = client_handle.await.unwrap();
    let (client_read_half, _client_write_half) = client.into_split();
    let client = FrameReader::new(BufReader::new(client_read_half));

    let message_id = MessageId::from_bytes(b"000000000000").expect("valid hex test message ID");

    TestContext {
        client,
        frame_writer,
        provider,
        broker: EndpointBroker::new(),
        client_id: ClientId::next(),
        peer_addr,
        message_id,
        root_id,
    }
}

/// Read the next server message from the client side
pub async fn read_server_message(client: &mut FrameReader<BufReader<TestReadHalf>>) -> ServerMessage {
    io_read_server_message(client)
        .await
        .expect("read failed")
        .expect("connection closed")
        .message
}

/// Create a file with `bytes` as content through the provider
pub async fn upload_file(test_ctx: &TestContext, parent_id: &str, name: &str, bytes: &[u8]) -> Item {
    let mut handle = test_ctx
        .provider
        .create_file(test_ctx.client_id, parent_id, name, "text/plain", false, "")
        .unwrap();
    handle.stream.write_all(bytes).await.unwrap();
    handle.stream.shutdown().await.unwrap();
    test_ctx
        .provider
        .finish_upload(test_ctx.client_id, &handle.upload_id)
        .await
        .unwrap()
}
