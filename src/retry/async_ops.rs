//! Async entry points, waiting on the tokio timer instead of the clock.

use std::fmt;
use std::future::Future;

use super::{RetryError, RetryableOperation, Step};
use crate::cancel::CancellationToken;

impl<E> RetryableOperation<E>
where
    E: Clone + fmt::Debug,
{
    /// Async version of [`execute`](Self::execute).
    ///
    /// Delays and retry decisions are the same; waits use `tokio::time::sleep`
    /// and timestamps still come from the operation's clock.
    ///
    /// ```rust
    /// use floodgate::{ExponentialBackoffStrategy, RetryableOperation};
    /// use std::time::Duration;
    ///
    /// # tokio_test::block_on(async {
    /// let mut operation = RetryableOperation::new(
    ///     ExponentialBackoffStrategy::new(3)
    ///         .with_base_delay(Duration::from_millis(1))
    ///         .with_jitter(false),
    /// );
    ///
    /// let mut calls = 0;
    /// let result = operation
    ///     .execute_async(|| {
    ///         calls += 1;
    ///         let n = calls;
    ///         async move { if n < 3 { Err("busy") } else { Ok(n) } }
    ///     })
    ///     .await;
    ///
    /// assert_eq!(result, Ok(3));
    /// # });
    /// ```
    pub async fn execute_async<T, F, Fut>(&mut self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt: u32 = 0;
        loop {
            match operation().await {
                Ok(value) => {
                    self.succeeded(attempt);
                    return Ok(value);
                }
                Err(error) => match self.handle_failure(error, attempt) {
                    Step::GiveUp(error) => return Err(error),
                    Step::Retry { delay, .. } => {
                        tokio::time::sleep(delay).await;
                        attempt = attempt.saturating_add(1);
                    }
                },
            }
        }
    }

    /// Async version of [`execute_with_cancel`](Self::execute_with_cancel).
    ///
    /// A cancel during a wait wakes the loop immediately.
    pub async fn execute_async_with_cancel<T, F, Fut>(
        &mut self,
        token: &CancellationToken,
        mut operation: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt: u32 = 0;
        let mut last_error = None;
        loop {
            if token.is_cancelled() {
                return Err(self.cancelled(attempt, last_error));
            }
            match operation().await {
                Ok(value) => {
                    self.succeeded(attempt);
                    return Ok(value);
                }
                Err(error) => match self.handle_failure(error, attempt) {
                    Step::GiveUp(error) => return Err(RetryError::Failed(error)),
                    Step::Retry { delay, error } => {
                        let tries = attempt.saturating_add(1);
                        tokio::select! {
                            biased;
                            _ = token.cancelled() => {
                                return Err(self.cancelled(tries, Some(error)));
                            }
                            _ = tokio::time::sleep(delay) => {}
                        }
                        last_error = Some(error);
                        attempt = tries;
                    }
                },
            }
        }
    }
}
