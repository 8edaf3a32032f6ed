//! The record kept for every failed try.

use std::time::{Duration, Instant};

/// One failed try made by a [`RetryableOperation`](crate::RetryableOperation).
///
/// Records are appended in call order. The `delay` starts at zero and is set
/// once the strategy decides to retry; a record whose try was the last one
/// keeps a zero delay.
#[derive(Debug, Clone, PartialEq)]
pub struct RecoveryAttempt<E> {
    timestamp: Instant,
    error: E,
    attempt_number: u32,
    delay: Duration,
    retried: bool,
}

impl<E> RecoveryAttempt<E> {
    pub(crate) fn new(timestamp: Instant, error: E, attempt_number: u32) -> Self {
        Self {
            timestamp,
            error,
            attempt_number,
            delay: Duration::ZERO,
            retried: false,
        }
    }

    pub(crate) fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
        self.retried = true;
    }

    /// When the failure was observed.
    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }

    /// The error the try failed with.
    pub fn error(&self) -> &E {
        &self.error
    }

    /// Zero-based index of the try within its `execute` call.
    ///
    /// This is the value the strategy was consulted with, and equals the
    /// number of retries that preceded the try. The first try is `0`, while
    /// [`RecoveryStrategy::on_failure`](crate::RecoveryStrategy::on_failure)
    /// reports counts starting at `1`.
    pub fn attempt_number(&self) -> u32 {
        self.attempt_number
    }

    /// The wait scheduled after this failure, or zero if none was.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Returns true if a retry was scheduled after this failure.
    pub fn was_retried(&self) -> bool {
        self.retried
    }

    /// Extract the error, discarding metadata.
    pub fn into_error(self) -> E {
        self.error
    }
}
