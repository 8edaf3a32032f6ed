//! Cooperative cancellation for retry loops.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

/// A clonable flag that stops a retry loop before its next attempt or in the
/// middle of a backoff wait.
///
/// Cancellation is one-way: once cancelled, a token stays cancelled.
///
/// # Example
///
/// ```rust
/// use floodgate::CancellationToken;
/// use std::time::Duration;
///
/// let token = CancellationToken::new();
/// let handle = token.clone();
///
/// std::thread::spawn(move || handle.cancel());
///
/// // Returns as soon as the other thread cancels
/// assert!(token.wait_timeout(Duration::from_secs(30)));
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    cancelled: Mutex<bool>,
    condvar: Condvar,
    #[cfg(feature = "async")]
    notify: tokio::sync::Notify,
}

impl CancellationToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the token and wake every waiter.
    pub fn cancel(&self) {
        let mut cancelled = self.inner.cancelled.lock();
        if *cancelled {
            return;
        }
        *cancelled = true;
        self.inner.condvar.notify_all();
        drop(cancelled);

        #[cfg(feature = "async")]
        self.inner.notify.notify_waiters();
    }

    /// Returns true once [`cancel`](CancellationToken::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        *self.inner.cancelled.lock()
    }

    /// Block for up to `timeout`, returning early if the token is cancelled.
    ///
    /// Returns whether the token is cancelled when the wait ends.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let mut cancelled = self.inner.cancelled.lock();
        if !*cancelled && !timeout.is_zero() {
            self.inner
                .condvar
                .wait_while_for(&mut cancelled, |cancelled| !*cancelled, timeout);
        }
        *cancelled
    }

    /// Resolve once the token is cancelled.
    #[cfg(feature = "async")]
    pub async fn cancelled(&self) {
        loop {
            // Registered before the check so a concurrent cancel is not missed.
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}
