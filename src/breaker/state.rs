//! Breaker state, point-in-time views and counters.

use std::fmt;
use std::time::Instant;

/// The three states of a circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CircuitState {
    /// Calls pass through and failures are counted.
    #[default]
    Closed,
    /// Calls are rejected until the reset timeout has passed.
    Open,
    /// A single probe call decides whether to close or reopen.
    HalfOpen,
}

impl CircuitState {
    /// Returns true if calls currently pass through unconditionally.
    pub fn is_closed(self) -> bool {
        self == CircuitState::Closed
    }

    /// Returns true if the breaker is failing fast.
    pub fn is_open(self) -> bool {
        self == CircuitState::Open
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        };
        f.write_str(s)
    }
}

/// `{state, failure_count, last_failure_time}` read under one lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitSnapshot {
    /// State at the time of the read.
    pub state: CircuitState,
    /// Matching failures counted since the last success or reset.
    pub failure_count: u32,
    /// When the most recent matching failure was recorded.
    pub last_failure_time: Option<Instant>,
}

/// Lifetime counters of a breaker.
///
/// Counters are not cleared by [`reset`](crate::CircuitBreaker::reset).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CircuitBreakerStats {
    /// Calls that reached the breaker, rejected ones included.
    pub total_calls: u64,
    /// Calls whose operation succeeded.
    pub successes: u64,
    /// Calls that failed with an expected error.
    pub failures: u64,
    /// Calls that failed with an error the breaker does not track.
    pub ignored_errors: u64,
    /// Calls rejected without running the operation.
    pub rejected: u64,
    /// How many times the breaker has opened.
    pub times_opened: u64,
    /// State at the time the stats were read.
    pub state: CircuitState,
}

impl CircuitBreakerStats {
    /// Share of executed calls that failed with an expected error.
    ///
    /// Returns `0.0` before any call has run.
    pub fn failure_rate(&self) -> f64 {
        let executed = self.successes + self.failures + self.ignored_errors;
        if executed == 0 {
            0.0
        } else {
            self.failures as f64 / executed as f64
        }
    }
}
