//! Driving a strategy against a fallible closure.
//!
//! [`RetryableOperation`] owns a shared strategy and an attempt log. Each
//! `execute` call runs the closure until it succeeds or the strategy gives
//! up, waiting between tries through the operation's [`Clock`].
//!
//! # Quick Start
//!
//! ```rust
//! use floodgate::{LinearBackoffStrategy, ManualClock, RetryableOperation};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let clock = ManualClock::new();
//! let mut operation = RetryableOperation::new(
//!     LinearBackoffStrategy::new(2)
//!         .with_delay(Duration::from_millis(100))
//!         .with_delay_increment(Duration::from_millis(100)),
//! )
//! .with_clock(Arc::new(clock.clone()));
//!
//! let result: Result<(), _> = operation.execute(|| Err("unavailable"));
//!
//! // exhaustion hands back the last error as is
//! assert_eq!(result, Err("unavailable"));
//! assert_eq!(operation.attempts().len(), 3);
//! assert_eq!(clock.total_slept(), Duration::from_millis(300));
//! ```
//!
//! # Attempt log
//!
//! Every failed try appends a [`RecoveryAttempt`]. The log is cumulative
//! across `execute` calls on the same instance; use
//! [`clear_attempts`](RetryableOperation::clear_attempts) or
//! [`take_attempts`](RetryableOperation::take_attempts) between calls to
//! start fresh.

mod error;

#[cfg(feature = "async")]
mod async_ops;

pub use error::RetryError;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::attempt::RecoveryAttempt;
use crate::cancel::CancellationToken;
use crate::clock::{Clock, SystemClock};
use crate::strategy::RecoveryStrategy;

/// Runs a closure under a retry strategy and records every failure.
pub struct RetryableOperation<E> {
    strategy: Arc<dyn RecoveryStrategy<E>>,
    clock: Arc<dyn Clock>,
    attempts: Vec<RecoveryAttempt<E>>,
}

/// What to do after a failed try.
enum Step<E> {
    Retry { delay: Duration, error: E },
    GiveUp(E),
}

impl<E> RetryableOperation<E> {
    /// Create an operation driven by `strategy`, sleeping on the system clock.
    pub fn new<S>(strategy: S) -> Self
    where
        S: RecoveryStrategy<E> + 'static,
    {
        Self::shared(Arc::new(strategy))
    }

    /// Create an operation from a strategy shared with other operations.
    pub fn shared(strategy: Arc<dyn RecoveryStrategy<E>>) -> Self {
        Self {
            strategy,
            clock: Arc::new(SystemClock),
            attempts: Vec::new(),
        }
    }

    /// Use `clock` for timestamps and waits.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The strategy driving this operation.
    pub fn strategy(&self) -> &dyn RecoveryStrategy<E> {
        self.strategy.as_ref()
    }

    /// Every failed try recorded so far, oldest first.
    pub fn attempts(&self) -> &[RecoveryAttempt<E>] {
        &self.attempts
    }

    /// The most recent failed try.
    pub fn last_attempt(&self) -> Option<&RecoveryAttempt<E>> {
        self.attempts.last()
    }

    /// Forget all recorded attempts.
    pub fn clear_attempts(&mut self) {
        self.attempts.clear();
    }

    /// Remove and return all recorded attempts.
    pub fn take_attempts(&mut self) -> Vec<RecoveryAttempt<E>> {
        std::mem::take(&mut self.attempts)
    }

    fn succeeded(&self, attempt: u32) {
        self.strategy.on_success(attempt);
        if attempt > 0 {
            info!(
                strategy = self.strategy.name(),
                retries = attempt,
                "operation succeeded after {} retries",
                attempt
            );
        }
    }
}

impl<E> RetryableOperation<E>
where
    E: Clone + fmt::Debug,
{
    /// Run `operation` until it succeeds or the strategy gives up.
    ///
    /// On exhaustion the error of the last try is returned unmodified.
    pub fn execute<T, F>(&mut self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
    {
        let mut attempt: u32 = 0;
        loop {
            match operation() {
                Ok(value) => {
                    self.succeeded(attempt);
                    return Ok(value);
                }
                Err(error) => match self.handle_failure(error, attempt) {
                    Step::GiveUp(error) => return Err(error),
                    Step::Retry { delay, .. } => {
                        self.clock.sleep(delay);
                        attempt = attempt.saturating_add(1);
                    }
                },
            }
        }
    }

    /// Like [`execute`](Self::execute), but stops when `token` is cancelled.
    ///
    /// The token is checked before every try and during every wait. A
    /// cancelled run returns [`RetryError::Cancelled`]; a run the strategy
    /// gave up on returns [`RetryError::Failed`] with the last error.
    pub fn execute_with_cancel<T, F>(
        &mut self,
        token: &CancellationToken,
        mut operation: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Result<T, E>,
    {
        let mut attempt: u32 = 0;
        let mut last_error = None;
        loop {
            if token.is_cancelled() {
                return Err(self.cancelled(attempt, last_error));
            }
            match operation() {
                Ok(value) => {
                    self.succeeded(attempt);
                    return Ok(value);
                }
                Err(error) => match self.handle_failure(error, attempt) {
                    Step::GiveUp(error) => return Err(RetryError::Failed(error)),
                    Step::Retry { delay, error } => {
                        let tries = attempt.saturating_add(1);
                        if self.clock.sleep_cancellable(delay, token) {
                            return Err(self.cancelled(tries, Some(error)));
                        }
                        last_error = Some(error);
                        attempt = tries;
                    }
                },
            }
        }
    }

    /// Record a failed try and consult the strategy.
    fn handle_failure(&mut self, error: E, attempt: u32) -> Step<E> {
        let mut record = RecoveryAttempt::new(self.clock.now(), error.clone(), attempt);
        let name = self.strategy.name();

        if !self.strategy.should_retry(&error, attempt) {
            self.attempts.push(record);
            let tries = attempt.saturating_add(1);
            self.strategy.on_failure(&error, tries);
            warn!(
                strategy = name,
                attempts = tries,
                error = ?error,
                "giving up after {} attempts",
                tries
            );
            return Step::GiveUp(error);
        }

        let delay = self.strategy.get_delay(attempt, &error);
        record.set_delay(delay);
        self.attempts.push(record);
        debug!(
            strategy = name,
            attempt,
            delay = ?delay,
            error = ?error,
            "attempt {} failed, retrying in {:?}",
            attempt,
            delay
        );
        Step::Retry { delay, error }
    }

    fn cancelled(&self, attempts: u32, last_error: Option<E>) -> RetryError<E> {
        info!(
            strategy = self.strategy.name(),
            attempts, "retry cancelled after {} attempts", attempts
        );
        RetryError::Cancelled {
            attempts,
            last_error,
        }
    }
}

impl<E> fmt::Debug for RetryableOperation<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryableOperation")
            .field("strategy", &self.strategy.name())
            .field("clock", &self.clock)
            .field("attempts", &self.attempts.len())
            .finish()
    }
}

#[cfg(test)]
mod tests;
