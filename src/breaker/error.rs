//! Error returned by a protected call.

use std::time::Duration;

/// Either the breaker refused the call, or the operation itself failed.
///
/// # Examples
///
/// ```rust
/// use floodgate::{CircuitBreaker, CircuitBreakerError};
/// use std::time::Duration;
///
/// let breaker = CircuitBreaker::new(1, Duration::from_secs(30)).with_name("search");
///
/// let _ = breaker.call(|| Err::<(), _>("boom"));
///
/// match breaker.call(|| Ok::<_, &str>(1)) {
///     Err(CircuitBreakerError::Open { name, retry_after }) => {
///         assert_eq!(name, "search");
///         assert!(retry_after.is_some());
///     }
///     other => panic!("Expected rejection, got {:?}", other),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CircuitBreakerError<E> {
    /// The call was rejected without running the operation.
    Open {
        /// Name of the breaker that rejected the call.
        name: String,
        /// Time left before a probe is allowed. `None` when a half-open probe
        /// is already in flight.
        retry_after: Option<Duration>,
    },
    /// The operation ran and returned this error.
    Inner(E),
}

impl<E> CircuitBreakerError<E> {
    /// Returns true if the breaker rejected the call.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open { .. })
    }

    /// Returns true if the operation ran and failed.
    pub fn is_inner(&self) -> bool {
        matches!(self, Self::Inner(_))
    }

    /// Get a reference to the operation's error, if it ran.
    pub fn inner(&self) -> Option<&E> {
        match self {
            Self::Inner(e) => Some(e),
            Self::Open { .. } => None,
        }
    }

    /// Extract the operation's error, if it ran.
    pub fn into_inner(self) -> Option<E> {
        match self {
            Self::Inner(e) => Some(e),
            Self::Open { .. } => None,
        }
    }
}

impl<E: std::fmt::Display> std::fmt::Display for CircuitBreakerError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open {
                name,
                retry_after: Some(after),
            } => write!(f, "circuit breaker '{}' is open, retry after {:?}", name, after),
            Self::Open { name, .. } => {
                write!(f, "circuit breaker '{}' is open, probe in progress", name)
            }
            Self::Inner(e) => write!(f, "{}", e),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for CircuitBreakerError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Open { .. } => None,
            Self::Inner(e) => Some(e),
        }
    }
}
