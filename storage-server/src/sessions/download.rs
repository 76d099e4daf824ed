//! Download session state

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::ClientId;
use crate::activity::ActivityGuard;
use crate::error::{ProviderError, ProviderResult};
use crate::transfers::TransferError;

pub(crate) type DownloadPump = JoinHandle<Result<(), TransferError>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadState {
    Open,
    Finished,
    Cancelled,
}

impl fmt::Display for DownloadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Open => "open",
            Self::Finished => "finished",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

pub(crate) struct DownloadSession {
    pub id: String,
    pub owner: ClientId,
    pub item_id: String,
    delivered: Arc<AtomicBool>,
    inner: Mutex<DownloadInner>,
    _activity: ActivityGuard,
}

struct DownloadInner {
    state: DownloadState,
    cancel: Option<oneshot::Sender<()>>,
    pump: Option<DownloadPump>,
}

impl DownloadSession {
    pub fn new(
        id: String,
        owner: ClientId,
        item_id: String,
        delivered: Arc<AtomicBool>,
        cancel: oneshot::Sender<()>,
        pump: DownloadPump,
        activity: ActivityGuard,
    ) -> Self {
        Self {
            id,
            owner,
            item_id,
            delivered,
            inner: Mutex::new(DownloadInner {
                state: DownloadState::Open,
                cancel: Some(cancel),
                pump: Some(pump),
            }),
            _activity: activity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, DownloadInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> DownloadState {
        self.lock().state
    }

    /// Whether every byte of the snapshot reached the stream
    pub fn delivered(&self) -> bool {
        self.delivered.load(Ordering::SeqCst)
    }

    /// Settle the download
    ///
    /// Succeeds only if all bytes were delivered; otherwise the transfer is
    /// cancelled and `InvalidState` returned.
    pub fn finish(&self) -> ProviderResult<()> {
        let mut inner = self.lock();
        if inner.state != DownloadState::Open {
            return Err(ProviderError::InvalidState(format!(
                "download '{}' is {}",
                self.id, inner.state
            )));
        }
        if self.delivered() {
            inner.state = DownloadState::Finished;
            // The pump only has the shutdown left; let it run detached
            inner.pump = None;
            inner.cancel = None;
            return Ok(());
        }
        Self::stop(&mut inner);
        Err(ProviderError::InvalidState(format!(
            "download '{}' was not fully delivered",
            self.id
        )))
    }

    /// Move `Open -> Cancelled`, stopping the pump
    pub fn cancel(&self) -> bool {
        let mut inner = self.lock();
        if inner.state != DownloadState::Open {
            return false;
        }
        Self::stop(&mut inner);
        true
    }

    fn stop(inner: &mut DownloadInner) {
        inner.state = DownloadState::Cancelled;
        if let Some(tx) = inner.cancel.take() {
            let _ = tx.send(());
        }
        if let Some(pump) = inner.pump.take() {
            pump.abort();
        }
    }
}
