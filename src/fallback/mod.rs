//! Ordered degradation after a primary call fails.
//!
//! A [`FallbackHandler`] holds alternatives tried in registration order,
//! each with the same arguments the primary got. The first success wins. If
//! everything fails, [`FallbackExhausted`] carries every error in call order.
//! No degraded value is ever synthesized; a fallback that wants to serve a
//! default returns it as its own success.
//!
//! ```rust
//! use floodgate::FallbackHandler;
//!
//! let handler = FallbackHandler::new()
//!     .with_named_fallback("cache", |id: &u32| if *id == 1 { Ok("cached") } else { Err("miss") })
//!     .with_named_fallback("static", |_: &u32| Ok("placeholder"));
//!
//! let fetch = |_: &u32| Err("service down");
//!
//! assert_eq!(handler.execute_with_fallback(fetch, &1), Ok("cached"));
//! assert_eq!(handler.execute_with_fallback(fetch, &2), Ok("placeholder"));
//! ```

mod error;

pub use error::FallbackExhausted;

use std::fmt;

use tracing::{debug, error, info};

type Alternative<A, T, E> = Box<dyn Fn(&A) -> Result<T, E> + Send + Sync>;

/// An ordered chain of alternatives for a fallible call.
pub struct FallbackHandler<A: ?Sized, T, E> {
    fallbacks: Vec<(String, Alternative<A, T, E>)>,
}

impl<A: ?Sized, T, E> FallbackHandler<A, T, E> {
    /// Create a handler with no fallbacks.
    pub fn new() -> Self {
        Self {
            fallbacks: Vec::new(),
        }
    }

    /// Append a fallback, named by its position.
    pub fn add_fallback<F>(&mut self, fallback: F)
    where
        F: Fn(&A) -> Result<T, E> + Send + Sync + 'static,
    {
        let name = format!("fallback_{}", self.fallbacks.len() + 1);
        self.fallbacks.push((name, Box::new(fallback)));
    }

    /// Append a fallback with a name used in logs.
    pub fn add_named_fallback<F>(&mut self, name: impl Into<String>, fallback: F)
    where
        F: Fn(&A) -> Result<T, E> + Send + Sync + 'static,
    {
        self.fallbacks.push((name.into(), Box::new(fallback)));
    }

    /// Builder form of [`add_fallback`](Self::add_fallback).
    pub fn with_fallback<F>(mut self, fallback: F) -> Self
    where
        F: Fn(&A) -> Result<T, E> + Send + Sync + 'static,
    {
        self.add_fallback(fallback);
        self
    }

    /// Builder form of [`add_named_fallback`](Self::add_named_fallback).
    pub fn with_named_fallback<F>(mut self, name: impl Into<String>, fallback: F) -> Self
    where
        F: Fn(&A) -> Result<T, E> + Send + Sync + 'static,
    {
        self.add_named_fallback(name, fallback);
        self
    }

    /// Number of registered fallbacks.
    pub fn len(&self) -> usize {
        self.fallbacks.len()
    }

    /// Returns true if no fallbacks are registered.
    pub fn is_empty(&self) -> bool {
        self.fallbacks.is_empty()
    }

    /// Fallback names in the order they are tried.
    pub fn fallback_names(&self) -> impl Iterator<Item = &str> {
        self.fallbacks.iter().map(|(name, _)| name.as_str())
    }
}

impl<A: ?Sized, T, E: fmt::Debug> FallbackHandler<A, T, E> {
    /// Call `primary`, then each fallback in order, all with `args`.
    ///
    /// Returns the first success, or every captured error if all fail.
    pub fn execute_with_fallback<F>(&self, primary: F, args: &A) -> Result<T, FallbackExhausted<E>>
    where
        F: FnOnce(&A) -> Result<T, E>,
    {
        let error = match primary(args) {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };
        debug!(error = ?error, fallbacks = self.fallbacks.len(), "primary call failed");

        let mut errors = Vec::with_capacity(self.fallbacks.len() + 1);
        errors.push(error);

        for (index, (name, fallback)) in self.fallbacks.iter().enumerate() {
            debug!(fallback = %name, position = index + 1, "trying fallback");
            match fallback(args) {
                Ok(value) => {
                    info!(fallback = %name, "fallback succeeded");
                    return Ok(value);
                }
                Err(error) => {
                    debug!(fallback = %name, error = ?error, "fallback failed");
                    errors.push(error);
                }
            }
        }

        error!(
            attempts = errors.len(),
            "primary and all {} fallbacks failed",
            self.fallbacks.len()
        );
        Err(FallbackExhausted::new(errors))
    }
}

impl<A: ?Sized, T, E> Default for FallbackHandler<A, T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: ?Sized, T, E> fmt::Debug for FallbackHandler<A, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FallbackHandler")
            .field("fallbacks", &self.fallback_names().collect::<Vec<_>>())
            .finish()
    }
}
