//! Exponential backoff with optional proportional jitter.

use std::time::Duration;

use super::{secs_to_duration, RecoveryStrategy};
use crate::error::ConfigError;

/// Share of the capped delay that jitter may add or remove.
#[cfg(feature = "jitter")]
const JITTER_FACTOR: f64 = 0.25;

/// Delay grows geometrically with each failed try, up to a cap.
///
/// `delay = min(base_delay * exponential_base^attempt, max_delay)`
///
/// With jitter enabled a uniform offset in `±25%` of the capped delay is added
/// afterwards, so a jittered delay can exceed `max_delay` by up to a quarter.
/// Jitter requires the `jitter` feature; without it the capped delay is used
/// as is.
///
/// # Examples
///
/// ```rust
/// use floodgate::ExponentialBackoffStrategy;
/// use std::time::Duration;
///
/// let strategy = ExponentialBackoffStrategy::new(10)
///     .with_base_delay(Duration::from_millis(100))
///     .with_max_delay(Duration::from_millis(500))
///     .with_jitter(false);
///
/// assert_eq!(strategy.delay_for_attempt(0), Duration::from_millis(100));
/// assert_eq!(strategy.delay_for_attempt(2), Duration::from_millis(400));
/// assert_eq!(strategy.delay_for_attempt(3), Duration::from_millis(500)); // capped
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ExponentialBackoffStrategy {
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
    exponential_base: f64,
    jitter: bool,
}

impl Default for ExponentialBackoffStrategy {
    /// Three retries starting at one second, doubling, capped at a minute, jittered.
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            exponential_base: 2.0,
            jitter: true,
        }
    }
}

impl ExponentialBackoffStrategy {
    /// Name reported in logs.
    pub const NAME: &'static str = "exponential_backoff";

    /// Create a strategy allowing `max_retries` retries, with default delays.
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Set the maximum number of retries (not counting the first try).
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the delay before the first retry.
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Set the cap applied before jitter.
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Set the growth factor between consecutive delays.
    pub fn with_exponential_base(mut self, exponential_base: f64) -> Self {
        self.exponential_base = exponential_base;
        self
    }

    /// Enable or disable ±25% jitter.
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Get the maximum number of retries.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Get the delay before the first retry.
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Get the delay cap.
    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Get the growth factor.
    pub fn exponential_base(&self) -> f64 {
        self.exponential_base
    }

    /// Returns true if jitter is enabled.
    pub fn jitter(&self) -> bool {
        self.jitter
    }

    /// The capped delay for `attempt`, before jitter.
    ///
    /// A base rejected by [`validate`](Self::validate) can produce a negative
    /// product; that clamps to zero.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = self.exponential_base.powf(f64::from(attempt));
        let secs = self.base_delay.as_secs_f64() * factor;
        // f64::min ignores NaN, so 0 * inf collapses to the cap.
        let capped = secs.min(self.max_delay.as_secs_f64()).max(0.0);
        secs_to_duration(capped, self.max_delay)
    }

    /// Check that the configuration describes a growing, capped delay.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.exponential_base.is_finite() || self.exponential_base < 1.0 {
            return Err(ConfigError::InvalidExponentialBase(self.exponential_base));
        }
        if self.max_delay < self.base_delay {
            return Err(ConfigError::MaxDelayBelowBase {
                base_secs: self.base_delay.as_secs_f64(),
                max_secs: self.max_delay.as_secs_f64(),
            });
        }
        Ok(())
    }
}

impl<E> RecoveryStrategy<E> for ExponentialBackoffStrategy {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn should_retry(&self, _error: &E, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    fn get_delay(&self, attempt: u32, _error: &E) -> Duration {
        let capped = self.delay_for_attempt(attempt);
        if self.jitter {
            apply_jitter(capped)
        } else {
            capped
        }
    }
}

/// Add a uniform offset in `±JITTER_FACTOR` of `delay`.
#[cfg(feature = "jitter")]
fn apply_jitter(delay: Duration) -> Duration {
    use rand::Rng;

    let secs = delay.as_secs_f64();
    let spread = secs * JITTER_FACTOR;
    let offset = rand::rng().random_range(-spread..=spread);
    secs_to_duration(secs + offset, delay)
}

#[cfg(not(feature = "jitter"))]
fn apply_jitter(delay: Duration) -> Duration {
    delay
}

#[cfg(test)]
mod exponential_tests {
    use super::*;

    fn delay(strategy: &ExponentialBackoffStrategy, attempt: u32) -> Duration {
        RecoveryStrategy::<()>::get_delay(strategy, attempt, &())
    }

    #[test]
    fn test_defaults() {
        let strategy = ExponentialBackoffStrategy::default();
        assert_eq!(strategy.max_retries(), 3);
        assert_eq!(strategy.base_delay(), Duration::from_secs(1));
        assert_eq!(strategy.max_delay(), Duration::from_secs(60));
        assert_eq!(strategy.exponential_base(), 2.0);
        assert!(strategy.jitter());
        assert!(strategy.validate().is_ok());
    }

    #[test]
    fn test_doubling_delays() {
        let strategy = ExponentialBackoffStrategy::new(5).with_jitter(false);
        assert_eq!(delay(&strategy, 0), Duration::from_secs(1));
        assert_eq!(delay(&strategy, 1), Duration::from_secs(2));
        assert_eq!(delay(&strategy, 2), Duration::from_secs(4));
        assert_eq!(delay(&strategy, 3), Duration::from_secs(8));
    }

    #[test]
    fn test_custom_base() {
        let strategy = ExponentialBackoffStrategy::new(5)
            .with_base_delay(Duration::from_millis(250))
            .with_exponential_base(3.0)
            .with_jitter(false);
        assert_eq!(delay(&strategy, 0), Duration::from_millis(250));
        assert_eq!(delay(&strategy, 2), Duration::from_millis(2250));
    }

    #[test]
    fn test_cap_applies() {
        let strategy = ExponentialBackoffStrategy::new(100)
            .with_max_delay(Duration::from_secs(10))
            .with_jitter(false);
        assert_eq!(delay(&strategy, 4), Duration::from_secs(10));
        assert_eq!(delay(&strategy, 90), Duration::from_secs(10));
    }

    #[test]
    fn test_huge_attempt_saturates_to_cap() {
        let strategy = ExponentialBackoffStrategy::new(u32::MAX).with_jitter(false);
        assert_eq!(delay(&strategy, u32::MAX), Duration::from_secs(60));
    }

    #[test]
    fn test_zero_base_delay_stays_zero() {
        let strategy = ExponentialBackoffStrategy::new(3)
            .with_base_delay(Duration::ZERO)
            .with_jitter(true);
        assert_eq!(delay(&strategy, 2), Duration::ZERO);
    }

    #[cfg(feature = "jitter")]
    #[test]
    fn test_jitter_stays_within_quarter_of_capped_delay() {
        let strategy = ExponentialBackoffStrategy::new(10)
            .with_max_delay(Duration::from_secs(4))
            .with_jitter(true);
        for attempt in 0..8 {
            let capped = strategy.delay_for_attempt(attempt).as_secs_f64();
            for _ in 0..50 {
                let d = delay(&strategy, attempt).as_secs_f64();
                assert!(d >= capped * 0.75 - 1e-9, "{} below range of {}", d, capped);
                assert!(d <= capped * 1.25 + 1e-9, "{} above range of {}", d, capped);
            }
        }
    }

    #[test]
    fn test_should_retry_bound() {
        let strategy = ExponentialBackoffStrategy::new(3);
        assert!(RecoveryStrategy::<()>::should_retry(&strategy, &(), 0));
        assert!(RecoveryStrategy::<()>::should_retry(&strategy, &(), 2));
        assert!(!RecoveryStrategy::<()>::should_retry(&strategy, &(), 3));
        assert!(!RecoveryStrategy::<()>::should_retry(&strategy, &(), 4));
    }

    #[test]
    fn test_zero_retries_never_retries() {
        let strategy = ExponentialBackoffStrategy::new(0);
        assert!(!RecoveryStrategy::<()>::should_retry(&strategy, &(), 0));
    }

    #[test]
    fn test_negative_base_clamps_to_zero() {
        let strategy = ExponentialBackoffStrategy::new(5)
            .with_exponential_base(-2.0)
            .with_jitter(true);
        assert!(strategy.validate().is_err());
        assert_eq!(strategy.delay_for_attempt(1), Duration::ZERO);
        assert_eq!(delay(&strategy, 1), Duration::ZERO);
        // even powers stay positive
        assert_eq!(strategy.delay_for_attempt(2), Duration::from_secs(4));
    }

    #[test]
    fn test_validate_rejects_shrinking_base() {
        let strategy = ExponentialBackoffStrategy::new(3).with_exponential_base(0.5);
        assert_eq!(
            strategy.validate(),
            Err(ConfigError::InvalidExponentialBase(0.5))
        );
        let strategy = ExponentialBackoffStrategy::new(3).with_exponential_base(f64::NAN);
        assert!(strategy.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_cap_below_base() {
        let strategy = ExponentialBackoffStrategy::new(3)
            .with_base_delay(Duration::from_secs(5))
            .with_max_delay(Duration::from_secs(1));
        assert!(matches!(
            strategy.validate(),
            Err(ConfigError::MaxDelayBelowBase { .. })
        ));
    }

    #[test]
    fn test_name() {
        let strategy = ExponentialBackoffStrategy::default();
        assert_eq!(
            RecoveryStrategy::<()>::name(&strategy),
            "exponential_backoff"
        );
    }
}
