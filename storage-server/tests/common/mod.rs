//! Shared helpers for integration tests

#![allow(dead_code)]

use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::task::JoinHandle;

use storage_common::Item;
use storage_server::activity::ActivityTracker;
use storage_server::build_provider;
use storage_server::provider::Provider;
use storage_server::server::Server;
use storage_server::sessions::ClientId;
use storage_server::store::StoreOptions;

/// Provider over a fresh store with a single "Home" root
pub fn test_provider(options: StoreOptions) -> (Provider, String) {
    let provider = build_provider(
        &["Home".to_string()],
        options,
        u64::MAX,
        ActivityTracker::new(),
    );
    let root_id = provider.roots().unwrap()[0].item_id.clone();
    (provider, root_id)
}

/// Write `content` through a fresh upload and commit it
pub async fn upload(
    provider: &Provider,
    client: ClientId,
    parent_id: &str,
    name: &str,
    content: &[u8],
) -> Item {
    let mut handle = provider
        .create_file(client, parent_id, name, "", false, "")
        .unwrap();
    handle.stream.write_all(content).await.unwrap();
    handle.stream.shutdown().await.unwrap();
    drop(handle.stream);
    provider
        .finish_upload(client, &handle.upload_id)
        .await
        .unwrap()
}

/// Read a file's full content through a download session
pub async fn download(provider: &Provider, client: ClientId, item_id: &str) -> Vec<u8> {
    let mut handle = provider.download(client, item_id, "").unwrap();
    let mut content = Vec::new();
    handle.stream.read_to_end(&mut content).await.unwrap();
    provider
        .finish_download(client, &handle.download_id)
        .unwrap();
    content
}

/// A server listening on ephemeral loopback ports
pub struct TestServer {
    pub control_addr: SocketAddr,
    pub provider: Provider,
    pub root_id: String,
    task: JoinHandle<std::io::Result<()>>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub async fn start_server(options: StoreOptions) -> TestServer {
    let (provider, root_id) = test_provider(options);
    let loopback: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let server = Server::bind(loopback, loopback, provider.clone(), ActivityTracker::new())
        .await
        .unwrap();
    let control_addr = server.control_addr().unwrap();
    let task = tokio::spawn(server.run());
    TestServer {
        control_addr,
        provider,
        root_id,
        task,
    }
}

pub fn sessions_settled(provider: &Provider) -> bool {
    provider.sessions().open_sessions() == 0
}
