//! Error-kind based retry.

use std::collections::HashSet;
use std::hash::Hash;
use std::time::Duration;

use super::RecoveryStrategy;
use crate::classify::{classify, Classify, RetryClass};

/// Retries with a fixed delay, deciding per error kind.
///
/// Decision order for a failed try:
///
/// 1. `attempt >= max_retries`: give up
/// 2. the error matches a non-retryable kind: give up, even if the kind is
///    also listed as retryable
/// 3. a retryable list is configured: retry only if the error matches it
/// 4. no lists: retry until the attempt cap
///
/// # Examples
///
/// ```rust
/// use floodgate::{Classify, ConditionalRetryStrategy, RecoveryStrategy};
/// use std::time::Duration;
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// enum Kind { Timeout, Auth }
///
/// #[derive(Debug)]
/// struct ApiError(Kind);
///
/// impl Classify for ApiError {
///     type Kind = Kind;
///     fn kind(&self) -> Kind { self.0 }
/// }
///
/// let strategy = ConditionalRetryStrategy::new(3)
///     .with_delay(Duration::from_millis(200))
///     .with_non_retryable([Kind::Auth]);
///
/// assert!(strategy.should_retry(&ApiError(Kind::Timeout), 0));
/// assert!(!strategy.should_retry(&ApiError(Kind::Auth), 0));
/// assert_eq!(strategy.get_delay(2, &ApiError(Kind::Timeout)), Duration::from_millis(200));
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(bound(
        serialize = "K: serde::Serialize + Eq + Hash",
        deserialize = "K: serde::Deserialize<'de> + Eq + Hash"
    ))
)]
pub struct ConditionalRetryStrategy<K> {
    max_retries: u32,
    delay: Duration,
    #[cfg_attr(feature = "serde", serde(default))]
    retryable: HashSet<K>,
    #[cfg_attr(feature = "serde", serde(default))]
    non_retryable: HashSet<K>,
}

impl<K: Eq + Hash> PartialEq for ConditionalRetryStrategy<K> {
    fn eq(&self, other: &Self) -> bool {
        self.max_retries == other.max_retries
            && self.delay == other.delay
            && self.retryable == other.retryable
            && self.non_retryable == other.non_retryable
    }
}

impl<K: Eq + Hash> Eq for ConditionalRetryStrategy<K> {}

impl<K> Default for ConditionalRetryStrategy<K> {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_secs(1),
            retryable: HashSet::new(),
            non_retryable: HashSet::new(),
        }
    }
}

impl<K> ConditionalRetryStrategy<K> {
    /// Name reported in logs.
    pub const NAME: &'static str = "conditional_retry";

    /// Create a strategy allowing `max_retries` retries with a one second delay
    /// and no kind lists.
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

    /// Set the fixed delay between tries.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Get the maximum number of retries.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Get the fixed delay.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Kinds that are retried. Empty means every kind not denied.
    pub fn retryable(&self) -> &HashSet<K> {
        &self.retryable
    }

    /// Kinds that are never retried.
    pub fn non_retryable(&self) -> &HashSet<K> {
        &self.non_retryable
    }
}

impl<K: Eq + Hash> ConditionalRetryStrategy<K> {
    /// Add kinds to the retryable list.
    pub fn with_retryable<I>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = K>,
    {
        self.retryable.extend(kinds);
        self
    }

    /// Add kinds to the non-retryable list.
    pub fn with_non_retryable<I>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = K>,
    {
        self.non_retryable.extend(kinds);
        self
    }

    /// Classify `error` against this strategy's lists, ignoring the attempt cap.
    pub fn classify<E>(&self, error: &E) -> RetryClass
    where
        E: Classify<Kind = K>,
    {
        classify(error, &self.retryable, &self.non_retryable)
    }
}

impl<E> RecoveryStrategy<E> for ConditionalRetryStrategy<E::Kind>
where
    E: Classify,
    E::Kind: Send + Sync,
{
    fn name(&self) -> &str {
        Self::NAME
    }

    fn should_retry(&self, error: &E, attempt: u32) -> bool {
        if attempt >= self.max_retries {
            return false;
        }
        match self.classify(error) {
            RetryClass::Allowed | RetryClass::Unlisted => true,
            RetryClass::Denied | RetryClass::Unmatched => false,
        }
    }

    fn get_delay(&self, _attempt: u32, _error: &E) -> Duration {
        self.delay
    }
}
