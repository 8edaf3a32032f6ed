//! Retry strategies: when to try again and how long to wait first.
//!
//! A strategy is pure configuration. It holds no per-call state, so one
//! instance can be shared (behind an `Arc`) by any number of concurrent
//! [`RetryableOperation`](crate::RetryableOperation)s.
//!
//! # Attempt numbering
//!
//! Every method receives `attempt`, the zero-based index of the failed try
//! within one `execute` call. The first failure is attempt `0`, so `attempt`
//! is also the number of retries already performed. With `max_retries = 3`,
//! attempts `0`, `1` and `2` are retried and attempt `3` gives up, for four
//! tries in total.
//!
//! # Strategies
//!
//! - **Exponential**: `min(base_delay * exponential_base^attempt, max_delay)`, optionally ±25% jitter
//! - **Linear**: `delay + attempt * delay_increment`
//! - **Conditional**: fixed delay, retried or not depending on the error's kind
//!
//! ```rust
//! use floodgate::{ExponentialBackoffStrategy, RecoveryStrategy};
//! use std::time::Duration;
//!
//! let strategy = ExponentialBackoffStrategy::new(3).with_jitter(false);
//! let err = "timeout";
//!
//! assert_eq!(strategy.get_delay(0, &err), Duration::from_secs(1));
//! assert_eq!(strategy.get_delay(2, &err), Duration::from_secs(4));
//! assert!(strategy.should_retry(&err, 2));
//! assert!(!strategy.should_retry(&err, 3));
//! ```

mod conditional;
mod exponential;
mod linear;

pub use conditional::ConditionalRetryStrategy;
pub use exponential::ExponentialBackoffStrategy;
pub use linear::LinearBackoffStrategy;

use std::sync::Arc;
use std::time::Duration;

/// A pluggable retry policy.
pub trait RecoveryStrategy<E>: Send + Sync {
    /// Identifies the strategy in logs.
    fn name(&self) -> &str;

    /// Whether the try that failed with `error` at `attempt` should be retried.
    fn should_retry(&self, error: &E, attempt: u32) -> bool;

    /// How long to wait before retrying after `attempt` failed with `error`.
    fn get_delay(&self, attempt: u32, error: &E) -> Duration;

    /// Called when a try succeeds after `attempt` retries.
    fn on_success(&self, _attempt: u32) {}

    /// Called once when the operation gives up after `attempts` tries.
    fn on_failure(&self, _error: &E, _attempts: u32) {}
}

impl<E, S> RecoveryStrategy<E> for Arc<S>
where
    S: RecoveryStrategy<E> + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    fn should_retry(&self, error: &E, attempt: u32) -> bool {
        (**self).should_retry(error, attempt)
    }

    fn get_delay(&self, attempt: u32, error: &E) -> Duration {
        (**self).get_delay(attempt, error)
    }

    fn on_success(&self, attempt: u32) {
        (**self).on_success(attempt)
    }

    fn on_failure(&self, error: &E, attempts: u32) {
        (**self).on_failure(error, attempts)
    }
}

/// Convert a computed number of seconds into a `Duration`, falling back to
/// `cap` when the value is negative, NaN, or too large to represent.
pub(crate) fn secs_to_duration(secs: f64, cap: Duration) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or(cap)
}
