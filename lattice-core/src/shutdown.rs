//! Cooperative shutdown coordination.
//!
//! A process-wide monotonic flag (false -> true, never back) plus a broadcast
//! wake. The signal listener is the only writer; the ingest loop polls
//! [`Shutdown::is_requested`] between iterations and background collaborators
//! that need to drain before exit block on [`Shutdown::wait`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Inner {
    requested: AtomicBool,
    notify: Notify,
}

/// Process-wide shutdown handle. Cheap to clone; all clones share one flag.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    inner: Arc<Inner>,
}

impl Shutdown {
    /// Create a new handle with shutdown not yet requested.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flag and wake every waiter.
    ///
    /// Idempotent: only the first call transitions the flag; repeated calls
    /// are no-ops.
    pub fn request(&self) {
        if !self.inner.requested.swap(true, Ordering::SeqCst) {
            self.inner.notify.notify_waiters();
        }
    }

    /// Non-blocking read of the flag.
    pub fn is_requested(&self) -> bool {
        self.inner.requested.load(Ordering::SeqCst)
    }

    /// Suspend until shutdown is requested or the timeout elapses.
    ///
    /// Returns `true` if shutdown was requested, `false` on timeout.
    pub async fn wait(&self, timeout: Duration) -> bool {
        let notified = self.inner.notify.notified();
        tokio::pin!(notified);
        // Register interest before reading the flag so a request landing
        // between the check and the await cannot be missed.
        notified.as_mut().enable();

        if self.is_requested() {
            return true;
        }

        match tokio::time::timeout(timeout, notified).await {
            Ok(()) => true,
            Err(_) => self.is_requested(),
        }
    }
}
