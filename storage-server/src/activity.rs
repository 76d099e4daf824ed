//! Activity tracking for idle shutdown
//!
//! Control connections and open sessions each hold an [`ActivityGuard`].
//! The daemon is idle once no guard has been alive for the configured
//! timeout.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::Notify;

#[derive(Debug, Default)]
pub struct ActivityTracker {
    active: AtomicUsize,
    changed: Notify,
}

impl ActivityTracker {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Mark the start of some activity; it ends when the guard drops
    pub fn begin(self: &Arc<Self>) -> ActivityGuard {
        self.active.fetch_add(1, Ordering::SeqCst);
        self.changed.notify_waiters();
        ActivityGuard {
            tracker: Arc::clone(self),
        }
    }

    /// Number of live guards
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Resolve once nothing has been active for a continuous `timeout`
    pub async fn idle_for(&self, timeout: Duration) {
        loop {
            let notified = self.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.active() == 0 {
                if tokio::time::timeout(timeout, notified).await.is_err() {
                    return;
                }
            } else {
                notified.await;
            }
        }
    }
}

/// Releases its activity slot on drop
#[derive(Debug)]
pub struct ActivityGuard {
    tracker: Arc<ActivityTracker>,
}

impl Drop for ActivityGuard {
    fn drop(&mut self) {
        self.tracker.active.fetch_sub(1, Ordering::SeqCst);
        self.tracker.changed.notify_waiters();
    }
}
