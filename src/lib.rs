//! # Floodgate
//!
//! > *"Hold the water back until the river calms"*
//!
//! In-process resilience for calls into unreliable dependencies.
//!
//! ## Building blocks
//!
//! - **Strategies** ([`ExponentialBackoffStrategy`], [`LinearBackoffStrategy`],
//!   [`ConditionalRetryStrategy`]) are plain configuration: they decide whether a
//!   failed try is retried and how long to wait first.
//! - **[`RetryableOperation`]** drives a strategy against a closure and keeps a
//!   log of every failed try.
//! - **[`CircuitBreaker`]** is shared by every caller of one dependency and fails
//!   fast once that dependency is known to be down.
//! - **[`FallbackHandler`]** tries an ordered chain of alternatives after the
//!   primary call fails.
//!
//! Everything runs on the calling thread. The only wait is the backoff delay,
//! taken through an injectable [`Clock`] (or a tokio timer with the `async`
//! feature).
//!
//! ## Quick Example
//!
//! ```rust
//! use floodgate::{ExponentialBackoffStrategy, ManualClock, RetryableOperation};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let clock = ManualClock::new();
//! let strategy = ExponentialBackoffStrategy::new(3)
//!     .with_base_delay(Duration::from_secs(1))
//!     .with_jitter(false);
//!
//! let mut operation = RetryableOperation::new(strategy).with_clock(Arc::new(clock.clone()));
//!
//! let mut calls = 0;
//! let result = operation.execute(|| {
//!     calls += 1;
//!     if calls <= 3 { Err("connection reset") } else { Ok(calls) }
//! });
//!
//! assert_eq!(result, Ok(4));
//! assert_eq!(
//!     clock.sleeps(),
//!     vec![Duration::from_secs(1), Duration::from_secs(2), Duration::from_secs(4)]
//! );
//! assert_eq!(operation.attempts().len(), 3);
//! ```
//!
//! ## Features
//!
//! - `jitter` (default): randomized exponential delays via `rand`
//! - `async`: tokio-based `execute_async` and `CircuitBreaker::call_async`
//! - `serde`: serializable configuration and statistics
//! - `proptest`: `Arbitrary` strategies for property tests

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod attempt;
pub mod breaker;
pub mod cancel;
pub mod classify;
pub mod clock;
pub mod error;
pub mod fallback;
pub mod retry;
pub mod strategy;
pub mod testing;

// Re-exports
pub use attempt::RecoveryAttempt;
pub use breaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, CircuitBreakerStats,
    CircuitSnapshot, CircuitState,
};
pub use cancel::CancellationToken;
pub use classify::{classify, Classify, ErrorFilter, RetryClass};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::ConfigError;
pub use fallback::{FallbackExhausted, FallbackHandler};
pub use retry::{RetryError, RetryableOperation};
pub use strategy::{
    ConditionalRetryStrategy, ExponentialBackoffStrategy, LinearBackoffStrategy,
    RecoveryStrategy,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::breaker::{CircuitBreaker, CircuitBreakerError, CircuitState};
    pub use crate::cancel::CancellationToken;
    pub use crate::classify::{Classify, ErrorFilter};
    pub use crate::clock::{Clock, ManualClock, SystemClock};
    pub use crate::fallback::{FallbackExhausted, FallbackHandler};
    pub use crate::retry::{RetryError, RetryableOperation};
    pub use crate::strategy::{
        ConditionalRetryStrategy, ExponentialBackoffStrategy, LinearBackoffStrategy,
        RecoveryStrategy,
    };
}
