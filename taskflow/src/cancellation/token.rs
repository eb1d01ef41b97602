//! Cancellation token for cooperative cancellation.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;
use tracing::debug;

/// A broadcast, level-triggered stop signal.
///
/// Any number of tasks may wait on [`cancelled`](Self::cancelled) while a
/// single owner calls [`cancel`](Self::cancel). Cancellation is idempotent
/// and permanent: only the first reason is kept and the token never resets.
/// Share it behind an [`std::sync::Arc`].
#[derive(Default)]
pub struct CancellationToken {
    /// Whether cancellation has been requested.
    cancelled: AtomicBool,
    /// The reason for cancellation (first one wins).
    reason: RwLock<Option<String>>,
    /// Wakes every pending `cancelled()` future.
    notify: Notify,
}

impl CancellationToken {
    /// Creates a new cancellation token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation with a reason.
    ///
    /// Returns true only for the call that actually flipped the token.
    pub fn cancel(&self, reason: impl Into<String>) -> bool {
        // The reason is stored before the flag flips, both under the lock,
        // so `is_cancelled() == true` always comes with a reason.
        let mut slot = self.reason.write();
        if self.cancelled.load(Ordering::SeqCst) {
            return false;
        }
        let reason = reason.into();
        debug!(reason = %reason, "Cancellation requested");
        *slot = Some(reason);
        self.cancelled.store(true, Ordering::SeqCst);
        drop(slot);

        self.notify.notify_waiters();
        true
    }

    /// Returns whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Returns the cancellation reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        self.reason.read().clone()
    }

    /// Completes once the token is cancelled.
    ///
    /// Resolves immediately if it already is. Cancel-safe, so it can sit in
    /// a `tokio::select!` next to a data wait.
    pub async fn cancelled(&self) {
        // The `Notified` future must exist before the flag is checked,
        // otherwise a cancel between the check and the await is missed.
        let notified = self.notify.notified();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .field("reason", &self.reason())
            .finish()
    }
}
