//! Upload and download sessions
//!
//! A session pairs an id with a [`ByteStream`] endpoint and a pump task
//! that moves bytes between the endpoint and the store. The session tables
//! are guarded by one mutex each and every session keeps its own state
//! behind another, so racing `finish`/`cancel` calls on one id serialize:
//! one of them wins, the other observes the settled state. No byte copying
//! happens under either lock.

mod download;
mod endpoint;
mod upload;

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use storage_common::Item;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::activity::ActivityTracker;
use crate::error::{ProviderError, ProviderResult};
use crate::store::{Content, EntityStore, UploadTarget};
use crate::transfers::{pump_download, pump_upload};

pub use download::DownloadState;
pub use endpoint::ByteStream;
pub use upload::UploadState;

use download::DownloadSession;
use upload::UploadSession;

static NEXT_CLIENT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of whoever opened a session
///
/// Sessions can only be settled by the client that opened them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(u64);

impl ClientId {
    /// Allocate a process-unique client id
    pub fn next() -> Self {
        Self(NEXT_CLIENT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub struct SessionManager {
    store: Arc<EntityStore>,
    uploads: Mutex<HashMap<String, Arc<UploadSession>>>,
    downloads: Mutex<HashMap<String, Arc<DownloadSession>>>,
    max_upload_size: u64,
    shutting_down: AtomicBool,
    activity: Arc<ActivityTracker>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SessionManager {
    pub fn new(store: Arc<EntityStore>, max_upload_size: u64, activity: Arc<ActivityTracker>) -> Self {
        Self {
            store,
            uploads: Mutex::new(HashMap::new()),
            downloads: Mutex::new(HashMap::new()),
            max_upload_size,
            shutting_down: AtomicBool::new(false),
            activity,
        }
    }

    pub fn store(&self) -> &Arc<EntityStore> {
        &self.store
    }

    fn refuse_if_shutting_down(&self) -> ProviderResult<()> {
        if self.is_shutting_down() {
            return Err(ProviderError::InvalidState(
                "server is shutting down".to_string(),
            ));
        }
        Ok(())
    }

    /// Open an upload session for `target`
    ///
    /// The target's preconditions are checked now and again at finish.
    pub fn begin_upload(
        &self,
        client: ClientId,
        target: UploadTarget,
    ) -> ProviderResult<(String, ByteStream)> {
        self.refuse_if_shutting_down()?;
        self.store.check_upload(&target)?;

        let id = Uuid::new_v4().to_string();
        let (stream, session_half) = ByteStream::pair();
        let (cancel_tx, cancel_rx) = oneshot::channel();

        let mut uploads = lock(&self.uploads);
        // Re-checked under the table lock so shutdown's drain sees every insert
        self.refuse_if_shutting_down()?;
        let pump = tokio::spawn(pump_upload(session_half, cancel_rx, self.max_upload_size));
        let session = UploadSession::new(
            id.clone(),
            client,
            target,
            cancel_tx,
            pump,
            self.activity.begin(),
        );
        uploads.insert(id.clone(), Arc::new(session));
        drop(uploads);

        info!(target: "storaged::sessions", "upload '{}' opened by client {}", id, client);
        Ok((id, stream))
    }

    /// Discard an upload; unknown and settled ids succeed as no-ops
    pub fn cancel_upload(&self, client: ClientId, upload_id: &str) -> ProviderResult<()> {
        let Ok(session) = self.owned_upload(client, upload_id) else {
            debug!(target: "storaged::sessions", "cancel of unknown upload '{}' ignored", upload_id);
            return Ok(());
        };
        if session.cancel() {
            self.remove_upload(upload_id);
            info!(target: "storaged::sessions", "upload '{}' cancelled", upload_id);
        }
        Ok(())
    }

    /// Wait for the upload's bytes to end and commit them
    ///
    /// The upload's stream must be shut down or dropped by the writer for
    /// this to complete. Cancelling the session (directly, by releasing its
    /// client, or by shutdown) ends the wait with `InvalidState`.
    pub async fn finish_upload(&self, client: ClientId, upload_id: &str) -> ProviderResult<Item> {
        let session = self.owned_upload(client, upload_id)?;
        let pump = session.begin_commit()?;

        let staged = match pump.await {
            Ok(Ok(staged)) => Ok(staged),
            Ok(Err(err)) => Err(ProviderError::from(err)),
            Err(join) => Err(ProviderError::Internal(format!(
                "upload pump failed: {join}"
            ))),
        };
        let result = session.complete(staged, |bytes| {
            self.store.commit(&session.target, Content::from(bytes))
        });

        match &result {
            Ok(item) => info!(
                target: "storaged::sessions",
                "upload '{}' committed as '{}' ({} bytes)",
                upload_id,
                item.item_id,
                item.size.unwrap_or_default()
            ),
            Err(err) => warn!(target: "storaged::sessions", "upload '{}' failed: {}", upload_id, err),
        }
        self.remove_upload(upload_id);
        result
    }

    /// Open a download of a snapshot of `item_id`'s current content
    pub fn begin_download(
        &self,
        client: ClientId,
        item_id: &str,
        match_etag: &str,
    ) -> ProviderResult<(String, ByteStream)> {
        self.refuse_if_shutting_down()?;
        let (item, content) = self.store.snapshot(item_id, match_etag)?;

        let id = Uuid::new_v4().to_string();
        let (stream, session_half) = ByteStream::pair();
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let delivered = Arc::new(AtomicBool::new(false));

        let mut downloads = lock(&self.downloads);
        self.refuse_if_shutting_down()?;
        let pump = tokio::spawn(pump_download(
            session_half,
            content,
            cancel_rx,
            Arc::clone(&delivered),
        ));
        let session = DownloadSession::new(
            id.clone(),
            client,
            item.item_id,
            delivered,
            cancel_tx,
            pump,
            self.activity.begin(),
        );
        downloads.insert(id.clone(), Arc::new(session));
        drop(downloads);

        info!(target: "storaged::sessions", "download '{}' of '{}' opened by client {}", id, item_id, client);
        Ok((id, stream))
    }

    /// Settle a download; fails if its bytes were not fully delivered
    pub fn finish_download(&self, client: ClientId, download_id: &str) -> ProviderResult<()> {
        let session = self.owned_download(client, download_id)?;
        let result = session.finish();
        self.remove_download(download_id);
        match &result {
            Ok(()) => info!(
                target: "storaged::sessions",
                "download '{}' of '{}' finished",
                download_id,
                session.item_id
            ),
            Err(err) => warn!(target: "storaged::sessions", "download '{}' failed: {}", download_id, err),
        }
        result
    }

    /// Cancel every session `client` still has open
    ///
    /// Returns how many sessions were cancelled.
    pub fn release_client(&self, client: ClientId) -> usize {
        let uploads: Vec<_> = {
            let mut table = lock(&self.uploads);
            let ids: Vec<String> = table
                .values()
                .filter(|s| s.owner == client)
                .map(|s| s.id.clone())
                .collect();
            ids.iter().filter_map(|id| table.remove(id)).collect()
        };
        let downloads: Vec<_> = {
            let mut table = lock(&self.downloads);
            let ids: Vec<String> = table
                .values()
                .filter(|s| s.owner == client)
                .map(|s| s.id.clone())
                .collect();
            ids.iter().filter_map(|id| table.remove(id)).collect()
        };

        let released = uploads.iter().filter(|s| s.cancel()).count()
            + downloads.iter().filter(|s| s.cancel()).count();
        if released > 0 {
            info!(target: "storaged::sessions", "released {} session(s) of client {}", released, client);
        }
        released
    }

    /// Refuse new sessions and cancel every open one
    pub fn shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
        let uploads: Vec<_> = lock(&self.uploads).drain().map(|(_, s)| s).collect();
        let downloads: Vec<_> = lock(&self.downloads).drain().map(|(_, s)| s).collect();

        let cancelled = uploads.iter().filter(|s| s.cancel()).count()
            + downloads.iter().filter(|s| s.cancel()).count();
        info!(target: "storaged::sessions", "session manager shut down, {} session(s) reclaimed", cancelled);
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    /// Current state of an upload still in the table
    pub fn upload_state(&self, upload_id: &str) -> Option<UploadState> {
        lock(&self.uploads).get(upload_id).map(|s| s.state())
    }

    /// Current state of a download still in the table
    pub fn download_state(&self, download_id: &str) -> Option<DownloadState> {
        lock(&self.downloads).get(download_id).map(|s| s.state())
    }

    pub fn open_sessions(&self) -> usize {
        lock(&self.uploads).len() + lock(&self.downloads).len()
    }

    fn owned_upload(&self, client: ClientId, upload_id: &str) -> ProviderResult<Arc<UploadSession>> {
        lock(&self.uploads)
            .get(upload_id)
            .filter(|s| s.owner == client)
            .cloned()
            .ok_or_else(|| ProviderError::unknown_session(upload_id))
    }

    fn owned_download(&self, client: ClientId, download_id: &str) -> ProviderResult<Arc<DownloadSession>> {
        lock(&self.downloads)
            .get(download_id)
            .filter(|s| s.owner == client)
            .cloned()
            .ok_or_else(|| ProviderError::unknown_session(download_id))
    }

    fn remove_upload(&self, upload_id: &str) {
        lock(&self.uploads).remove(upload_id);
    }

    fn remove_download(&self, download_id: &str) {
        lock(&self.downloads).remove(download_id);
    }
}
