//! Circuit breaker guarding one dependency.
//!
//! A breaker is constructed once per dependency and shared by every caller,
//! usually behind an `Arc`. State transitions happen under one internal lock;
//! the protected operation itself runs outside it, so concurrent calls are
//! not serialized.
//!
//! # State machine
//!
//! - **Closed**: calls pass. Each expected failure increments
//!   `failure_count`; reaching `failure_threshold` opens the circuit. A
//!   success resets the count.
//! - **Open**: calls are rejected with [`CircuitBreakerError::Open`] until
//!   `reset_timeout` has passed since the last failure. The next call after
//!   that becomes the half-open probe.
//! - **HalfOpen**: exactly one probe runs; other callers are rejected. A
//!   successful probe closes the circuit, a failed one reopens it.
//!
//! Errors the breaker's [`ErrorFilter`] does not select pass through as
//! [`CircuitBreakerError::Inner`] without touching the state.
//!
//! ```rust
//! use floodgate::{CircuitBreaker, CircuitState, ManualClock};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let clock = ManualClock::new();
//! let breaker = CircuitBreaker::new(2, Duration::from_millis(100))
//!     .with_clock(Arc::new(clock.clone()));
//!
//! for _ in 0..2 {
//!     let _ = breaker.call(|| Err::<(), _>("down"));
//! }
//! assert_eq!(breaker.state(), CircuitState::Open);
//! assert!(breaker.call(|| Ok::<_, &str>(())).unwrap_err().is_open());
//!
//! clock.advance(Duration::from_millis(100));
//! assert_eq!(breaker.call(|| Ok::<_, &str>(7)), Ok(7));
//! assert_eq!(breaker.state(), CircuitState::Closed);
//! assert_eq!(breaker.failure_count(), 0);
//! ```

mod config;
mod error;
mod state;

pub use config::CircuitBreakerConfig;
pub use error::CircuitBreakerError;
pub use state::{CircuitBreakerStats, CircuitSnapshot, CircuitState};

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::classify::ErrorFilter;
use crate::clock::{Clock, SystemClock};
use crate::error::ConfigError;

const DEFAULT_NAME: &str = "circuit_breaker";

/// A three-state breaker shared by all callers of one dependency.
pub struct CircuitBreaker<E> {
    name: String,
    failure_threshold: u32,
    reset_timeout: Duration,
    expected: ErrorFilter<E>,
    clock: Arc<dyn Clock>,
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    state: CircuitState,
    failure_count: u32,
    last_failure_time: Option<Instant>,
    probe_in_flight: bool,
    stats: Counters,
}

#[derive(Debug, Default)]
struct Counters {
    total_calls: u64,
    successes: u64,
    failures: u64,
    ignored_errors: u64,
    rejected: u64,
    times_opened: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Success,
    Failure,
    Ignored,
}

/// Admission to run the operation once.
///
/// A probe permit dropped without an outcome (panic, cancelled future)
/// frees the half-open slot.
struct Permit<'a, E> {
    breaker: &'a CircuitBreaker<E>,
    probe: bool,
    armed: bool,
}

impl<E> Permit<'_, E> {
    fn complete(mut self, outcome: Outcome) {
        self.armed = false;
        self.breaker.record(self.probe, outcome);
    }
}

impl<E> Drop for Permit<'_, E> {
    fn drop(&mut self) {
        if self.armed && self.probe {
            self.breaker.release_probe();
        }
    }
}

impl<E> CircuitBreaker<E> {
    /// Create a closed breaker that opens after `failure_threshold`
    /// consecutive failures and probes again after `reset_timeout`.
    ///
    /// Every error counts as a failure; narrow that with
    /// [`with_expected`](Self::with_expected).
    pub fn new(failure_threshold: u32, reset_timeout: Duration) -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            failure_threshold,
            reset_timeout,
            expected: ErrorFilter::any(),
            clock: Arc::new(SystemClock),
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Create a breaker from validated configuration.
    pub fn from_config(config: &CircuitBreakerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let breaker = Self::new(config.failure_threshold, config.reset_timeout);
        Ok(match &config.name {
            Some(name) => breaker.with_name(name.clone()),
            None => breaker,
        })
    }

    /// Set the name used in logs and rejection errors.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Only errors selected by `expected` count as failures.
    pub fn with_expected(mut self, expected: ErrorFilter<E>) -> Self {
        self.expected = expected;
        self
    }

    /// Use `clock` to measure the reset timeout.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The breaker's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Consecutive failures that open the circuit.
    pub fn failure_threshold(&self) -> u32 {
        self.failure_threshold
    }

    /// How long the circuit stays open before probing.
    pub fn reset_timeout(&self) -> Duration {
        self.reset_timeout
    }

    /// The filter selecting errors that count as failures.
    pub fn expected(&self) -> &ErrorFilter<E> {
        &self.expected
    }

    /// Current state.
    ///
    /// An open circuit reads `Open` until a call arrives after the timeout;
    /// reading the state never transitions it.
    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    /// Failures counted since the last success or reset.
    pub fn failure_count(&self) -> u32 {
        self.inner.lock().failure_count
    }

    /// When the most recent expected failure was recorded.
    pub fn last_failure_time(&self) -> Option<Instant> {
        self.inner.lock().last_failure_time
    }

    /// State, count and failure time read together.
    pub fn snapshot(&self) -> CircuitSnapshot {
        let inner = self.inner.lock();
        CircuitSnapshot {
            state: inner.state,
            failure_count: inner.failure_count,
            last_failure_time: inner.last_failure_time,
        }
    }

    /// Lifetime counters plus the current state.
    pub fn stats(&self) -> CircuitBreakerStats {
        let inner = self.inner.lock();
        let c = &inner.stats;
        CircuitBreakerStats {
            total_calls: c.total_calls,
            successes: c.successes,
            failures: c.failures,
            ignored_errors: c.ignored_errors,
            rejected: c.rejected,
            times_opened: c.times_opened,
            state: inner.state,
        }
    }

    /// Force the circuit closed and forget recorded failures.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        let previous = inner.state;
        inner.state = CircuitState::Closed;
        inner.failure_count = 0;
        inner.last_failure_time = None;
        inner.probe_in_flight = false;
        drop(inner);

        info!(breaker = %self.name, from = %previous, "circuit breaker reset");
    }

    /// Run `operation` if the circuit admits it.
    ///
    /// Returns [`CircuitBreakerError::Open`] without calling `operation` when
    /// the circuit is open or a half-open probe is already running.
    pub fn call<T, F>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let permit = self.acquire()?;
        let result = operation();
        self.finish(permit, result)
    }

    /// Async version of [`call`](Self::call).
    ///
    /// Dropping the returned future mid-probe frees the probe slot.
    #[cfg(feature = "async")]
    pub async fn call_async<T, F, Fut>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
    {
        let permit = self.acquire()?;
        let result = operation().await;
        self.finish(permit, result)
    }

    fn finish<T>(
        &self,
        permit: Permit<'_, E>,
        result: Result<T, E>,
    ) -> Result<T, CircuitBreakerError<E>> {
        match result {
            Ok(value) => {
                permit.complete(Outcome::Success);
                Ok(value)
            }
            Err(error) => {
                let outcome = if self.expected.matches(&error) {
                    Outcome::Failure
                } else {
                    Outcome::Ignored
                };
                permit.complete(outcome);
                Err(CircuitBreakerError::Inner(error))
            }
        }
    }

    /// Decide admission for one call, transitioning Open to HalfOpen when the
    /// timeout has passed.
    fn acquire(&self) -> Result<Permit<'_, E>, CircuitBreakerError<E>> {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        inner.stats.total_calls += 1;

        let state = inner.state;
        match state {
            CircuitState::Closed => Ok(self.permit(false)),
            CircuitState::Open => {
                let elapsed = inner
                    .last_failure_time
                    .map(|at| now.saturating_duration_since(at))
                    .unwrap_or(self.reset_timeout);
                if elapsed < self.reset_timeout {
                    inner.stats.rejected += 1;
                    drop(inner);
                    let retry_after = self.reset_timeout.saturating_sub(elapsed);
                    debug!(breaker = %self.name, retry_after = ?retry_after, "call rejected, circuit open");
                    return Err(self.rejection(Some(retry_after)));
                }
                inner.state = CircuitState::HalfOpen;
                inner.probe_in_flight = true;
                drop(inner);
                info!(breaker = %self.name, "circuit half-open, probing");
                Ok(self.permit(true))
            }
            CircuitState::HalfOpen => {
                if inner.probe_in_flight {
                    inner.stats.rejected += 1;
                    drop(inner);
                    debug!(breaker = %self.name, "call rejected, probe in flight");
                    return Err(self.rejection(None));
                }
                inner.probe_in_flight = true;
                Ok(self.permit(true))
            }
        }
    }

    fn permit(&self, probe: bool) -> Permit<'_, E> {
        Permit {
            breaker: self,
            probe,
            armed: true,
        }
    }

    fn rejection(&self, retry_after: Option<Duration>) -> CircuitBreakerError<E> {
        CircuitBreakerError::Open {
            name: self.name.clone(),
            retry_after,
        }
    }

    /// Apply the outcome of an admitted call.
    fn record(&self, probe: bool, outcome: Outcome) {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        if probe {
            inner.probe_in_flight = false;
        }

        match outcome {
            Outcome::Ignored => inner.stats.ignored_errors += 1,
            Outcome::Success => {
                inner.stats.successes += 1;
                let state = inner.state;
                match state {
                    CircuitState::Closed => inner.failure_count = 0,
                    CircuitState::HalfOpen if probe => {
                        inner.state = CircuitState::Closed;
                        inner.failure_count = 0;
                        drop(inner);
                        info!(breaker = %self.name, "circuit closed, dependency recovered");
                    }
                    // admitted while closed, finished after the circuit moved on
                    CircuitState::HalfOpen | CircuitState::Open => {}
                }
            }
            Outcome::Failure => {
                inner.stats.failures += 1;
                inner.failure_count = inner.failure_count.saturating_add(1);
                inner.last_failure_time = Some(now);

                let reopen = match inner.state {
                    CircuitState::Closed => inner.failure_count >= self.failure_threshold,
                    CircuitState::HalfOpen => probe,
                    CircuitState::Open => false,
                };
                if reopen {
                    let from = inner.state;
                    let failures = inner.failure_count;
                    inner.state = CircuitState::Open;
                    inner.stats.times_opened += 1;
                    drop(inner);
                    warn!(
                        breaker = %self.name,
                        from = %from,
                        failures,
                        reset_timeout = ?self.reset_timeout,
                        "circuit opened"
                    );
                }
            }
        }
    }

    fn release_probe(&self) {
        self.inner.lock().probe_in_flight = false;
        debug!(breaker = %self.name, "probe abandoned, slot released");
    }
}

impl<E> Default for CircuitBreaker<E> {
    /// Threshold 5, reset timeout 60s, every error expected.
    fn default() -> Self {
        Self::new(5, Duration::from_secs(60))
    }
}

impl<E> fmt::Debug for CircuitBreaker<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.snapshot();
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("failure_threshold", &self.failure_threshold)
            .field("reset_timeout", &self.reset_timeout)
            .field("expected", &self.expected)
            .field("state", &snapshot.state)
            .field("failure_count", &snapshot.failure_count)
            .finish()
    }
}
