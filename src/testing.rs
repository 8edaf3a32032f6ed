//! Testing utilities for code built on floodgate.
//!
//! Scripted flaky calls, breaker assertions, and (with the `proptest`
//! feature) `Arbitrary` strategy configurations.
//!
//! # Examples
//!
//! ## FlakyCall
//!
//! ```rust
//! use floodgate::testing::FlakyCall;
//!
//! let call = FlakyCall::new(2, "ok", "timeout");
//!
//! assert_eq!(call.call(), Err("timeout"));
//! assert_eq!(call.call(), Err("timeout"));
//! assert_eq!(call.call(), Ok("ok"));
//! assert_eq!(call.calls(), 3);
//! ```
//!
//! ## Assertion Macros
//!
//! ```rust
//! use floodgate::{assert_circuit_state, assert_rejected, CircuitBreaker};
//! use std::time::Duration;
//!
//! let breaker = CircuitBreaker::new(1, Duration::from_secs(60));
//! assert_circuit_state!(breaker, Closed);
//!
//! let _ = breaker.call(|| Err::<(), _>("boom"));
//! assert_circuit_state!(breaker, Open);
//! assert_rejected!(breaker.call(|| Ok::<_, &str>(())));
//! ```

use std::sync::atomic::{AtomicU32, Ordering};

/// A call that fails a fixed number of times, then succeeds forever.
///
/// Invocations are counted atomically, so one `FlakyCall` can be shared
/// between threads or captured by reference in several closures.
#[derive(Debug)]
pub struct FlakyCall<T, E> {
    failures: u32,
    calls: AtomicU32,
    success: Option<T>,
    error: E,
}

impl<T: Clone, E: Clone> FlakyCall<T, E> {
    /// Fail `failures` times with `error`, then return `success`.
    pub fn new(failures: u32, success: T, error: E) -> Self {
        Self {
            failures,
            calls: AtomicU32::new(0),
            success: Some(success),
            error,
        }
    }

    /// Always fail with `error`.
    pub fn always_failing(error: E) -> Self {
        Self {
            failures: u32::MAX,
            calls: AtomicU32::new(0),
            success: None,
            error,
        }
    }

    /// Invoke the call.
    pub fn call(&self) -> Result<T, E> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.success {
            Some(value) if n >= self.failures => Ok(value.clone()),
            _ => Err(self.error.clone()),
        }
    }

    /// How many times [`call`](Self::call) has run.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Assert that a breaker is in the given [`CircuitState`](crate::CircuitState).
///
/// The state is named by variant: `Closed`, `Open` or `HalfOpen`.
///
/// # Example
///
/// ```rust
/// use floodgate::{assert_circuit_state, CircuitBreaker};
/// use std::time::Duration;
///
/// let breaker = CircuitBreaker::<String>::new(3, Duration::from_secs(1));
/// assert_circuit_state!(breaker, Closed);
/// ```
#[macro_export]
macro_rules! assert_circuit_state {
    ($breaker:expr, $state:ident) => {
        match $breaker.state() {
            $crate::CircuitState::$state => {}
            other => panic!(
                "Expected circuit {:?}, got {:?}",
                $crate::CircuitState::$state,
                other
            ),
        }
    };
}

/// Assert that a protected call was rejected by an open breaker.
///
/// # Example
///
/// ```rust
/// use floodgate::{assert_rejected, CircuitBreakerError};
///
/// let result: Result<(), CircuitBreakerError<&str>> = Err(CircuitBreakerError::Open {
///     name: "db".to_string(),
///     retry_after: None,
/// });
/// assert_rejected!(result);
/// ```
#[macro_export]
macro_rules! assert_rejected {
    ($result:expr) => {
        match $result {
            Err($crate::CircuitBreakerError::Open { .. }) => {}
            Err($crate::CircuitBreakerError::Inner(e)) => {
                panic!("Expected rejection, got inner error: {:?}", e);
            }
            Ok(v) => {
                panic!("Expected rejection, got Ok: {:?}", v);
            }
        }
    };
}

#[cfg(feature = "proptest")]
mod arbitrary {
    use std::time::Duration;

    use proptest::prelude::*;

    use crate::strategy::{ExponentialBackoffStrategy, LinearBackoffStrategy};

    /// Configurations that pass `validate`: base in `[1, 4)`, millisecond
    /// delays, and a cap at or above the base delay.
    impl Arbitrary for ExponentialBackoffStrategy {
        type Parameters = ();
        type Strategy = BoxedStrategy<Self>;

        fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
            (0u32..10, 1u64..1_000, 0u64..60_000, 1.0f64..4.0, any::<bool>())
                .prop_map(|(retries, base_ms, extra_ms, base, jitter)| {
                    ExponentialBackoffStrategy::new(retries)
                        .with_base_delay(Duration::from_millis(base_ms))
                        .with_max_delay(Duration::from_millis(base_ms + extra_ms))
                        .with_exponential_base(base)
                        .with_jitter(jitter)
                })
                .boxed()
        }
    }

    impl Arbitrary for LinearBackoffStrategy {
        type Parameters = ();
        type Strategy = BoxedStrategy<Self>;

        fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
            (0u32..10, 0u64..10_000, 0u64..10_000)
                .prop_map(|(retries, delay_ms, increment_ms)| {
                    LinearBackoffStrategy::new(retries)
                        .with_delay(Duration::from_millis(delay_ms))
                        .with_delay_increment(Duration::from_millis(increment_ms))
                })
                .boxed()
        }
    }
}
