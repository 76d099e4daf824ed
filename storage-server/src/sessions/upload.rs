//! Upload session state

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use storage_common::Item;

use super::ClientId;
use crate::activity::ActivityGuard;
use crate::error::{ProviderError, ProviderResult};
use crate::store::UploadTarget;
use crate::transfers::TransferError;

pub(crate) type UploadPump = JoinHandle<Result<Vec<u8>, TransferError>>;

/// Lifecycle of an upload
///
/// `Open -> Committing -> Committed | Failed`, or `Open | Committing -> Cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    Open,
    Committing,
    Committed,
    Cancelled,
    Failed,
}

impl fmt::Display for UploadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Open => "open",
            Self::Committing => "committing",
            Self::Committed => "committed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

pub(crate) struct UploadSession {
    pub id: String,
    pub owner: ClientId,
    pub target: UploadTarget,
    inner: Mutex<UploadInner>,
    _activity: ActivityGuard,
}

struct UploadInner {
    state: UploadState,
    /// Held until the session settles; dropping it cancels the pump
    cancel: Option<oneshot::Sender<()>>,
    pump: Option<UploadPump>,
}

impl UploadSession {
    pub fn new(
        id: String,
        owner: ClientId,
        target: UploadTarget,
        cancel: oneshot::Sender<()>,
        pump: UploadPump,
        activity: ActivityGuard,
    ) -> Self {
        Self {
            id,
            owner,
            target,
            inner: Mutex::new(UploadInner {
                state: UploadState::Open,
                cancel: Some(cancel),
                pump: Some(pump),
            }),
            _activity: activity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, UploadInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> UploadState {
        self.lock().state
    }

    /// Move `Open -> Committing` and hand over the pump to wait on
    pub fn begin_commit(&self) -> ProviderResult<UploadPump> {
        let mut inner = self.lock();
        if inner.state != UploadState::Open {
            return Err(ProviderError::InvalidState(format!(
                "upload '{}' is {}",
                self.id, inner.state
            )));
        }
        let pump = inner.pump.take().ok_or_else(|| {
            ProviderError::Internal(format!("upload '{}' has no pump", self.id))
        })?;
        inner.state = UploadState::Committing;
        Ok(pump)
    }

    /// Commit the staged bytes unless the session was cancelled meanwhile
    ///
    /// Runs `commit` under the session lock, so a cancel either lands before
    /// it (and nothing is written) or finds the session already settled.
    pub fn complete<F>(
        &self,
        staged: ProviderResult<Vec<u8>>,
        commit: F,
    ) -> ProviderResult<Item>
    where
        F: FnOnce(Vec<u8>) -> ProviderResult<Item>,
    {
        let mut inner = self.lock();
        if inner.state != UploadState::Committing {
            return Err(ProviderError::InvalidState(format!(
                "upload '{}' is {}",
                self.id, inner.state
            )));
        }
        let result = staged.and_then(commit);
        inner.state = if result.is_ok() {
            UploadState::Committed
        } else {
            UploadState::Failed
        };
        inner.cancel = None;
        result
    }

    /// Move `Open | Committing -> Cancelled`, stopping the pump
    ///
    /// A commit waiting on the pump sees the cancellation and writes
    /// nothing. Returns false when the session had already settled.
    pub fn cancel(&self) -> bool {
        let mut inner = self.lock();
        if !matches!(inner.state, UploadState::Open | UploadState::Committing) {
            return false;
        }
        inner.state = UploadState::Cancelled;
        if let Some(tx) = inner.cancel.take() {
            let _ = tx.send(());
        }
        if let Some(pump) = inner.pump.take() {
            pump.abort();
        }
        true
    }
}
