//! Error type for the cancellable retry entry points.

/// Outcome of a cancellable retry that did not produce a value.
///
/// Plain [`execute`](crate::RetryableOperation::execute) never wraps errors;
/// only the `*_with_cancel` entry points return this type, because they have
/// a second way to stop.
///
/// # Examples
///
/// ```rust
/// use floodgate::{CancellationToken, LinearBackoffStrategy, RetryError, RetryableOperation};
///
/// let token = CancellationToken::new();
/// token.cancel();
///
/// let mut operation = RetryableOperation::new(LinearBackoffStrategy::new(3));
/// let result = operation.execute_with_cancel(&token, || Ok::<_, String>(1));
///
/// match result {
///     Err(RetryError::Cancelled { attempts, last_error }) => {
///         assert_eq!(attempts, 0);
///         assert!(last_error.is_none());
///     }
///     _ => panic!("Expected cancellation"),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryError<E> {
    /// The token was cancelled before an attempt or during a wait.
    Cancelled {
        /// Tries made by this call before it stopped.
        attempts: u32,
        /// The error of the most recent try, if any was made.
        last_error: Option<E>,
    },
    /// The strategy gave up; this is the last try's error, unmodified.
    Failed(E),
}

impl<E> RetryError<E> {
    /// Returns true if the retry was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// The most recent underlying error, if any try was made.
    pub fn last_error(&self) -> Option<&E> {
        match self {
            Self::Cancelled { last_error, .. } => last_error.as_ref(),
            Self::Failed(e) => Some(e),
        }
    }

    /// Extract the most recent underlying error.
    pub fn into_inner(self) -> Option<E> {
        match self {
            Self::Cancelled { last_error, .. } => last_error,
            Self::Failed(e) => Some(e),
        }
    }
}

impl<E: std::fmt::Display> std::fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cancelled {
                attempts,
                last_error: Some(e),
            } => write!(f, "retry cancelled after {} attempts: {}", attempts, e),
            Self::Cancelled { attempts, .. } => {
                write!(f, "retry cancelled after {} attempts", attempts)
            }
            Self::Failed(e) => write!(f, "{}", e),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for RetryError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Cancelled { last_error, .. } => last_error
                .as_ref()
                .map(|e| e as &(dyn std::error::Error + 'static)),
            Self::Failed(e) => Some(e),
        }
    }
}
