//! Linear backoff.

use std::time::Duration;

use super::RecoveryStrategy;

/// Delay grows by a fixed increment with each failed try.
///
/// `delay = delay + attempt * delay_increment`
///
/// # Examples
///
/// ```rust
/// use floodgate::{LinearBackoffStrategy, RecoveryStrategy};
/// use std::time::Duration;
///
/// let strategy = LinearBackoffStrategy::new(5)
///     .with_delay(Duration::from_millis(100))
///     .with_delay_increment(Duration::from_millis(50));
///
/// let err = ();
/// assert_eq!(strategy.get_delay(0, &err), Duration::from_millis(100));
/// assert_eq!(strategy.get_delay(1, &err), Duration::from_millis(150));
/// assert_eq!(strategy.get_delay(4, &err), Duration::from_millis(300));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LinearBackoffStrategy {
    max_retries: u32,
    delay: Duration,
    delay_increment: Duration,
}

impl Default for LinearBackoffStrategy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_secs(1),
            delay_increment: Duration::from_secs(1),
        }
    }
}

impl LinearBackoffStrategy {
    /// Name reported in logs.
    pub const NAME: &'static str = "linear_backoff";

    /// Create a strategy allowing `max_retries` retries, with default delays.
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Set the maximum number of retries.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the delay before the first retry.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Set how much each further retry adds.
    pub fn with_delay_increment(mut self, delay_increment: Duration) -> Self {
        self.delay_increment = delay_increment;
        self
    }

    /// Get the maximum number of retries.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Get the delay before the first retry.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Get the per-retry increment.
    pub fn delay_increment(&self) -> Duration {
        self.delay_increment
    }
}

impl<E> RecoveryStrategy<E> for LinearBackoffStrategy {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn should_retry(&self, _error: &E, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    fn get_delay(&self, attempt: u32, _error: &E) -> Duration {
        self.delay
            .saturating_add(self.delay_increment.saturating_mul(attempt))
    }
}
