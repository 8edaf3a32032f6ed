//! Plain-data breaker configuration.

use std::time::Duration;

use crate::error::ConfigError;

/// Settings for [`CircuitBreaker::from_config`](crate::CircuitBreaker::from_config).
///
/// With the `serde` feature this can be loaded from any serde format; missing
/// fields take their defaults.
///
/// ```rust
/// use floodgate::{CircuitBreaker, CircuitBreakerConfig};
/// use std::time::Duration;
///
/// let config = CircuitBreakerConfig {
///     name: Some("payments".to_string()),
///     failure_threshold: 3,
///     reset_timeout: Duration::from_secs(10),
/// };
///
/// let breaker = CircuitBreaker::<std::io::Error>::from_config(&config).unwrap();
/// assert_eq!(breaker.name(), "payments");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CircuitBreakerConfig {
    /// Name used in logs and in the breaker-open error.
    pub name: Option<String>,
    /// Consecutive expected failures that open the circuit.
    pub failure_threshold: u32,
    /// How long the circuit stays open before a probe is allowed.
    pub reset_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            name: None,
            failure_threshold: 5,
            reset_timeout: Duration::from_secs(60),
        }
    }
}

impl CircuitBreakerConfig {
    /// Check the configuration describes a breaker that can open.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.failure_threshold == 0 {
            return Err(ConfigError::ZeroFailureThreshold);
        }
        Ok(())
    }
}
