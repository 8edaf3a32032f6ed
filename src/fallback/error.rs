//! Error returned when every alternative failed.

/// The primary call and every fallback failed.
///
/// Errors are kept in call order: the primary's first, then one per fallback
/// in registration order.
///
/// # Examples
///
/// ```rust
/// use floodgate::FallbackHandler;
///
/// let handler = FallbackHandler::new()
///     .with_fallback(|_: &u32| Err::<u32, _>("cache miss"))
///     .with_fallback(|_: &u32| Err::<u32, _>("replica down"));
///
/// let exhausted = handler
///     .execute_with_fallback(|_| Err("primary down"), &7)
///     .unwrap_err();
///
/// assert_eq!(exhausted.errors(), &["primary down", "cache miss", "replica down"]);
/// assert_eq!(exhausted.primary_error(), Some(&"primary down"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackExhausted<E> {
    errors: Vec<E>,
}

impl<E> FallbackExhausted<E> {
    /// Create from errors in call order.
    pub fn new(errors: Vec<E>) -> Self {
        Self { errors }
    }

    /// All captured errors, primary first.
    pub fn errors(&self) -> &[E] {
        &self.errors
    }

    /// The primary call's error.
    pub fn primary_error(&self) -> Option<&E> {
        self.errors.first()
    }

    /// The error of the last fallback tried.
    pub fn last_error(&self) -> Option<&E> {
        self.errors.last()
    }

    /// Number of captured errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns true if no errors were captured.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Extract the errors, primary first.
    pub fn into_errors(self) -> Vec<E> {
        self.errors
    }
}

impl<E: std::fmt::Display> std::fmt::Display for FallbackExhausted<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "all {} alternatives failed", self.errors.len())?;
        for (i, e) in self.errors.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{}{}", sep, e)?;
        }
        Ok(())
    }
}

impl<E: std::error::Error + 'static> std::error::Error for FallbackExhausted<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.errors
            .last()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}
