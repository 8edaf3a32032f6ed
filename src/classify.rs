//! Error classification for retry and breaker decisions.
//!
//! Errors are routed by *kind*: a small, caller-defined enum that every error
//! value maps onto through [`Classify`]. Strategies and breakers only ever look
//! at kinds, never at concrete error types.
//!
//! # Example
//!
//! ```rust
//! use floodgate::{classify, Classify, RetryClass};
//! use std::collections::HashSet;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
//! enum Kind { Timeout, Auth }
//!
//! #[derive(Debug)]
//! struct ApiError(Kind);
//!
//! impl Classify for ApiError {
//!     type Kind = Kind;
//!     fn kind(&self) -> Kind { self.0 }
//! }
//!
//! let allow: HashSet<_> = [Kind::Timeout, Kind::Auth].into();
//! let deny: HashSet<_> = [Kind::Auth].into();
//!
//! // Deny wins even when the kind is also allowed
//! assert_eq!(classify(&ApiError(Kind::Auth), &allow, &deny), RetryClass::Denied);
//! assert_eq!(classify(&ApiError(Kind::Timeout), &allow, &deny), RetryClass::Allowed);
//! ```

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

/// Maps an error value onto a closed set of kinds.
pub trait Classify {
    /// The kind enum this error classifies into.
    type Kind: Copy + Eq + Hash + fmt::Debug;

    /// The most specific kind of this error.
    fn kind(&self) -> Self::Kind;

    /// Whether this error belongs to `kind`.
    ///
    /// Defaults to equality with [`kind`](Classify::kind). Override it to model
    /// kind hierarchies, e.g. a `Network` kind that also covers `Timeout`.
    fn is_kind(&self, kind: &Self::Kind) -> bool {
        self.kind() == *kind
    }
}

/// Result of checking an error against retry allow and deny lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    /// The error matches the deny list.
    Denied,
    /// The error matches the allow list (and not the deny list).
    Allowed,
    /// An allow list is configured and the error matches none of it.
    Unmatched,
    /// No allow list is configured and the error is not denied.
    Unlisted,
}

impl RetryClass {
    /// Whether this class permits another try.
    pub fn is_retryable(self) -> bool {
        matches!(self, RetryClass::Allowed | RetryClass::Unlisted)
    }
}

/// Classify `error` against the given allow and deny lists.
///
/// The deny list is consulted first, so a kind present in both lists is
/// [`RetryClass::Denied`].
pub fn classify<E: Classify>(
    error: &E,
    retryable: &HashSet<E::Kind>,
    non_retryable: &HashSet<E::Kind>,
) -> RetryClass {
    if non_retryable.iter().any(|kind| error.is_kind(kind)) {
        return RetryClass::Denied;
    }
    if retryable.is_empty() {
        return RetryClass::Unlisted;
    }
    if retryable.iter().any(|kind| error.is_kind(kind)) {
        RetryClass::Allowed
    } else {
        RetryClass::Unmatched
    }
}

/// A reusable matcher deciding which errors a component reacts to.
///
/// Used by [`CircuitBreaker`](crate::CircuitBreaker) to select the errors that
/// count as dependency failures. Cloning is cheap.
pub struct ErrorFilter<E> {
    matcher: Matcher<E>,
}

enum Matcher<E> {
    Any,
    Predicate(Arc<dyn Fn(&E) -> bool + Send + Sync>),
}

impl<E> ErrorFilter<E> {
    /// Match every error.
    pub fn any() -> Self {
        Self {
            matcher: Matcher::Any,
        }
    }

    /// Match errors for which `predicate` returns true.
    ///
    /// ```rust
    /// use floodgate::ErrorFilter;
    ///
    /// let filter = ErrorFilter::predicate(|e: &std::io::Error| {
    ///     e.kind() == std::io::ErrorKind::TimedOut
    /// });
    ///
    /// assert!(filter.matches(&std::io::ErrorKind::TimedOut.into()));
    /// assert!(!filter.matches(&std::io::ErrorKind::NotFound.into()));
    /// ```
    pub fn predicate<F>(predicate: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        Self {
            matcher: Matcher::Predicate(Arc::new(predicate)),
        }
    }

    /// Whether `error` is selected by this filter.
    pub fn matches(&self, error: &E) -> bool {
        match &self.matcher {
            Matcher::Any => true,
            Matcher::Predicate(predicate) => predicate(error),
        }
    }

    /// Returns true if this filter matches every error.
    pub fn is_any(&self) -> bool {
        matches!(self.matcher, Matcher::Any)
    }
}

impl<E> ErrorFilter<E>
where
    E: Classify + 'static,
    E::Kind: Send + Sync + 'static,
{
    /// Match errors belonging to any of `kinds`.
    pub fn kinds<I>(kinds: I) -> Self
    where
        I: IntoIterator<Item = E::Kind>,
    {
        let kinds: HashSet<E::Kind> = kinds.into_iter().collect();
        Self::predicate(move |error: &E| kinds.iter().any(|kind| error.is_kind(kind)))
    }
}

impl<E> Clone for ErrorFilter<E> {
    fn clone(&self) -> Self {
        let matcher = match &self.matcher {
            Matcher::Any => Matcher::Any,
            Matcher::Predicate(predicate) => Matcher::Predicate(Arc::clone(predicate)),
        };
        Self { matcher }
    }
}

impl<E> Default for ErrorFilter<E> {
    fn default() -> Self {
        Self::any()
    }
}

impl<E> fmt::Debug for ErrorFilter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.matcher {
            Matcher::Any => f.write_str("ErrorFilter::Any"),
            Matcher::Predicate(_) => f.write_str("ErrorFilter::Predicate(<function>)"),
        }
    }
}
