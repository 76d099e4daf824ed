//! In-process scenarios against the provider facade
//!
//! These drive uploads and downloads through the session byte streams
//! directly, without the control or transfer ports.

mod common;

use std::collections::HashSet;

use tokio::io::{AsyncReadExt, AsyncWriteExt};

use common::{download, sessions_settled, test_provider, upload};
use storage_common::ErrorKind;
use storage_server::sessions::ClientId;
use storage_server::store::StoreOptions;

#[tokio::test]
async fn test_update_then_stale_update_conflicts() {
    let (provider, root) = test_provider(StoreOptions::default());
    let client = ClientId::next();

    let mut handle = provider
        .create_file(client, &root, "a.txt", "text/plain", false, "")
        .unwrap();
    handle.stream.write_all(b"hi").await.unwrap();
    handle.stream.shutdown().await.unwrap();
    let created = provider
        .finish_upload(client, &handle.upload_id)
        .await
        .unwrap();
    let e1 = provider.metadata(&created.item_id).unwrap().etag;
    assert_eq!(created.content_type.as_deref(), Some("text/plain"));

    let mut handle = provider.update(client, &created.item_id, &e1).unwrap();
    handle.stream.write_all(b"bye").await.unwrap();
    handle.stream.shutdown().await.unwrap();
    provider
        .finish_upload(client, &handle.upload_id)
        .await
        .unwrap();

    let e2 = provider.metadata(&created.item_id).unwrap().etag;
    assert_ne!(e1, e2);
    assert_eq!(download(&provider, client, &created.item_id).await, b"bye");

    let err = provider.update(client, &created.item_id, &e1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(sessions_settled(&provider));
}

#[tokio::test]
async fn test_move_then_lookup() {
    let (provider, root) = test_provider(StoreOptions::default());
    let client = ClientId::next();

    let docs = provider.create_folder(&root, "Docs").unwrap();
    let file = upload(&provider, client, &root, "notes.txt", b"n").await;

    let moved = provider
        .move_item(&file.item_id, &docs.item_id, "renamed")
        .unwrap();
    assert_eq!(moved.item_id, file.item_id);
    assert_eq!(moved.parent_id, docs.item_id);

    let found = provider.lookup(&docs.item_id, "renamed").unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].item_id, file.item_id);
    assert!(provider.lookup(&root, "notes.txt").unwrap().is_empty());
}

#[tokio::test]
async fn test_paged_listing_is_complete() {
    let options = StoreOptions {
        page_size: 3,
        ..StoreOptions::default()
    };
    let (provider, root) = test_provider(options);

    let mut expected = HashSet::new();
    for i in 0..10 {
        let folder = provider.create_folder(&root, &format!("f{i:02}")).unwrap();
        expected.insert(folder.item_id);
    }

    let mut seen = Vec::new();
    let mut token = String::new();
    let mut pages = 0;
    loop {
        let (items, next) = provider.list(&root, &token).unwrap();
        assert!(items.len() <= 3);
        seen.extend(items.into_iter().map(|item| item.item_id));
        pages += 1;
        if next.is_empty() {
            break;
        }
        token = next;
    }

    assert_eq!(pages, 4);
    assert_eq!(seen.len(), 10);
    assert_eq!(seen.into_iter().collect::<HashSet<_>>(), expected);
}

#[tokio::test]
async fn test_upload_download_large_content() {
    let (provider, root) = test_provider(StoreOptions::default());
    let client = ClientId::next();

    let content: Vec<u8> = (0..1_000_000u32).map(|i| (i % 251) as u8).collect();
    let item = upload(&provider, client, &root, "big.bin", &content).await;
    assert_eq!(item.size, Some(content.len() as u64));

    assert_eq!(download(&provider, client, &item.item_id).await, content);
}

#[tokio::test]
async fn test_cancel_twice_leaves_store_untouched() {
    let (provider, root) = test_provider(StoreOptions::default());
    let client = ClientId::next();

    let mut handle = provider
        .create_file(client, &root, "draft.txt", "", false, "")
        .unwrap();
    handle.stream.write_all(b"partial").await.unwrap();

    provider.cancel_upload(client, &handle.upload_id).unwrap();
    provider.cancel_upload(client, &handle.upload_id).unwrap();

    assert!(provider.lookup(&root, "draft.txt").unwrap().is_empty());
    let err = provider
        .finish_upload(client, &handle.upload_id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
    assert!(sessions_settled(&provider));
}

#[tokio::test]
async fn test_concurrent_finish_and_cancel_settle_once() {
    let (provider, root) = test_provider(StoreOptions::default());
    let client = ClientId::next();

    let mut handle = provider
        .create_file(client, &root, "race.txt", "", false, "")
        .unwrap();
    handle.stream.write_all(b"racing").await.unwrap();
    handle.stream.shutdown().await.unwrap();

    let finisher = {
        let provider = provider.clone();
        let upload_id = handle.upload_id.clone();
        tokio::spawn(async move { provider.finish_upload(client, &upload_id).await })
    };
    provider.cancel_upload(client, &handle.upload_id).unwrap();

    match finisher.await.unwrap() {
        Ok(item) => {
            assert_eq!(provider.lookup(&root, "race.txt").unwrap().len(), 1);
            assert_eq!(download(&provider, client, &item.item_id).await, b"racing");
        }
        Err(e) => {
            assert_eq!(e.kind(), ErrorKind::InvalidState);
            assert!(provider.lookup(&root, "race.txt").unwrap().is_empty());
        }
    }
    assert!(sessions_settled(&provider));
}

#[tokio::test]
async fn test_download_snapshot_survives_update() {
    let (provider, root) = test_provider(StoreOptions::default());
    let client = ClientId::next();
    let item = upload(&provider, client, &root, "v.txt", b"version one").await;

    let mut reading = provider.download(client, &item.item_id, &item.etag).unwrap();

    let mut writing = provider.update(client, &item.item_id, &item.etag).unwrap();
    writing.stream.write_all(b"version two").await.unwrap();
    writing.stream.shutdown().await.unwrap();
    provider
        .finish_upload(client, &writing.upload_id)
        .await
        .unwrap();

    let mut content = Vec::new();
    reading.stream.read_to_end(&mut content).await.unwrap();
    assert_eq!(content, b"version one");
    provider
        .finish_download(client, &reading.download_id)
        .unwrap();

    assert_eq!(download(&provider, client, &item.item_id).await, b"version two");
}

#[tokio::test]
async fn test_overwrite_requires_permission() {
    let (provider, root) = test_provider(StoreOptions::default());
    let client = ClientId::next();
    let first = upload(&provider, client, &root, "same.txt", b"1").await;

    let err = provider
        .create_file(client, &root, "same.txt", "", false, "")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let mut handle = provider
        .create_file(client, &root, "same.txt", "", true, &first.etag)
        .unwrap();
    handle.stream.write_all(b"2").await.unwrap();
    handle.stream.shutdown().await.unwrap();
    let replaced = provider
        .finish_upload(client, &handle.upload_id)
        .await
        .unwrap();

    assert_eq!(replaced.item_id, first.item_id);
    assert_ne!(replaced.etag, first.etag);
    assert_eq!(provider.lookup(&root, "same.txt").unwrap().len(), 1);
}

#[tokio::test]
async fn test_released_client_sessions_are_cancelled() {
    let (provider, root) = test_provider(StoreOptions::default());
    let client = ClientId::next();
    let item = upload(&provider, client, &root, "f.txt", b"x").await;

    let up = provider
        .create_file(client, &root, "g.txt", "", false, "")
        .unwrap();
    let _down = provider.download(client, &item.item_id, "").unwrap();
    assert_eq!(provider.sessions().open_sessions(), 2);

    assert_eq!(provider.sessions().release_client(client), 2);
    assert!(sessions_settled(&provider));

    let err = provider
        .finish_upload(client, &up.upload_id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

#[tokio::test]
async fn test_shutdown_refuses_new_sessions() {
    let (provider, root) = test_provider(StoreOptions::default());
    let client = ClientId::next();

    provider.sessions().shutdown();
    let err = provider
        .create_file(client, &root, "late.txt", "", false, "")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    // Metadata operations still work
    assert!(provider.create_folder(&root, "Still").is_ok());
}
