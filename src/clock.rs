//! Time source and sleep primitive used between retries and by breakers.
//!
//! Components never call `Instant::now()` or `std::thread::sleep` directly;
//! they go through a shared [`Clock`]. Production code uses [`SystemClock`],
//! tests substitute a [`ManualClock`] whose time only moves when told to.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::cancel::CancellationToken;

/// A monotonic clock paired with a blocking sleep.
pub trait Clock: Send + Sync + fmt::Debug {
    /// The current instant.
    fn now(&self) -> Instant;

    /// Block the calling thread for `duration`.
    fn sleep(&self, duration: Duration);

    /// Sleep for `duration` unless `token` is cancelled first.
    ///
    /// Returns `true` if the token was cancelled before or during the wait.
    /// The default implementation checks the token on both sides of a plain
    /// [`sleep`](Clock::sleep).
    fn sleep_cancellable(&self, duration: Duration, token: &CancellationToken) -> bool {
        if token.is_cancelled() {
            return true;
        }
        self.sleep(duration);
        token.is_cancelled()
    }
}

/// The real clock: `Instant::now` and a thread sleep.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }

    fn sleep_cancellable(&self, duration: Duration, token: &CancellationToken) -> bool {
        token.wait_timeout(duration)
    }
}

/// A virtual clock for deterministic tests.
///
/// Time starts at the instant the clock was created and advances only through
/// [`advance`](ManualClock::advance) or [`sleep`](Clock::sleep). Every
/// requested sleep is recorded. Clones share the same timeline.
///
/// # Example
///
/// ```rust
/// use floodgate::{Clock, ManualClock};
/// use std::time::Duration;
///
/// let clock = ManualClock::new();
/// let start = clock.now();
///
/// clock.sleep(Duration::from_millis(250));
/// clock.advance(Duration::from_millis(750));
///
/// assert_eq!(clock.now() - start, Duration::from_secs(1));
/// assert_eq!(clock.sleeps(), vec![Duration::from_millis(250)]);
/// ```
#[derive(Debug, Clone)]
pub struct ManualClock {
    inner: Arc<ManualInner>,
}

#[derive(Debug)]
struct ManualInner {
    origin: Instant,
    elapsed: Mutex<Duration>,
    sleeps: Mutex<Vec<Duration>>,
}

impl ManualClock {
    /// Create a clock frozen at the current instant.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ManualInner {
                origin: Instant::now(),
                elapsed: Mutex::new(Duration::ZERO),
                sleeps: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Move time forward without recording a sleep.
    pub fn advance(&self, duration: Duration) {
        let mut elapsed = self.inner.elapsed.lock();
        *elapsed = elapsed.saturating_add(duration);
    }

    /// Total virtual time elapsed since creation.
    pub fn elapsed(&self) -> Duration {
        *self.inner.elapsed.lock()
    }

    /// Every sleep requested so far, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.inner.sleeps.lock().clone()
    }

    /// Sum of all recorded sleeps.
    pub fn total_slept(&self) -> Duration {
        self.inner
            .sleeps
            .lock()
            .iter()
            .fold(Duration::ZERO, |acc, d| acc.saturating_add(*d))
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.inner.origin + self.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        self.inner.sleeps.lock().push(duration);
        self.advance(duration);
    }
}
