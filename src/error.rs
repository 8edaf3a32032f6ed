//! Configuration errors.

use std::fmt;

/// A configuration value that cannot describe a working policy.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A circuit breaker needs at least one failure before it can open.
    ZeroFailureThreshold,
    /// The exponential base must be finite and at least 1.0.
    InvalidExponentialBase(f64),
    /// The delay cap is smaller than the first delay.
    MaxDelayBelowBase {
        /// Configured first delay, in seconds.
        base_secs: f64,
        /// Configured cap, in seconds.
        max_secs: f64,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroFailureThreshold => write!(f, "failure_threshold must be at least 1"),
            Self::InvalidExponentialBase(base) => {
                write!(f, "exponential_base must be finite and >= 1.0 (got {})", base)
            }
            Self::MaxDelayBelowBase {
                base_secs,
                max_secs,
            } => write!(
                f,
                "max_delay ({}s) is smaller than base_delay ({}s)",
                max_secs, base_secs
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
