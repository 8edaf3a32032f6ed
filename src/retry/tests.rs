//! Tests for the retry loop.

use super::*;
use crate::clock::ManualClock;
use crate::strategy::{ExponentialBackoffStrategy, LinearBackoffStrategy};
use crate::testing::FlakyCall;
use std::sync::atomic::{AtomicU32, Ordering};

fn manual(operation: RetryableOperation<&'static str>) -> (RetryableOperation<&'static str>, ManualClock) {
    let clock = ManualClock::new();
    (operation.with_clock(Arc::new(clock.clone())), clock)
}

fn exponential(max_retries: u32) -> ExponentialBackoffStrategy {
    ExponentialBackoffStrategy::new(max_retries).with_jitter(false)
}

#[test]
fn test_success_on_first_try_records_nothing() {
    let (mut operation, clock) = manual(RetryableOperation::new(exponential(3)));
    assert_eq!(operation.execute(|| Ok(5)), Ok(5));
    assert!(operation.attempts().is_empty());
    assert!(clock.sleeps().is_empty());
}

#[test]
fn test_exponential_delays_before_success() {
    let (mut operation, clock) = manual(RetryableOperation::new(exponential(3)));
    let call = FlakyCall::new(3, "done", "reset");

    assert_eq!(operation.execute(|| call.call()), Ok("done"));
    assert_eq!(call.calls(), 4);
    assert_eq!(
        clock.sleeps(),
        vec![
            Duration::from_secs(1),
            Duration::from_secs(2),
            Duration::from_secs(4)
        ]
    );
}

#[test]
fn test_exhaustion_returns_last_error_unwrapped() {
    let (mut operation, _) = manual(RetryableOperation::new(exponential(2)));
    let calls = AtomicU32::new(0);
    let result: Result<(), _> = operation.execute(|| {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        Err(if n < 2 { "early" } else { "final" })
    });

    assert_eq!(result, Err("final"));
    assert_eq!(operation.attempts().len(), 3);
    assert_eq!(operation.last_attempt().map(|a| *a.error()), Some("final"));
}

#[test]
fn test_attempt_records_carry_index_and_delay() {
    let (mut operation, clock) = manual(RetryableOperation::new(
        LinearBackoffStrategy::new(2)
            .with_delay(Duration::from_millis(10))
            .with_delay_increment(Duration::from_millis(5)),
    ));
    let call: FlakyCall<(), _> = FlakyCall::always_failing("down");
    let _ = operation.execute(|| call.call());

    let attempts = operation.attempts();
    let numbers: Vec<_> = attempts.iter().map(|a| a.attempt_number()).collect();
    let delays: Vec<_> = attempts.iter().map(|a| a.delay()).collect();
    assert_eq!(numbers, vec![0, 1, 2]);
    assert_eq!(
        delays,
        vec![
            Duration::from_millis(10),
            Duration::from_millis(15),
            Duration::ZERO
        ]
    );
    assert!(attempts[0].was_retried());
    assert!(!attempts[2].was_retried());

    // timestamps follow the clock, which advanced by the waits
    assert_eq!(
        attempts[2].timestamp() - attempts[0].timestamp(),
        clock.total_slept()
    );
}

#[test]
fn test_zero_retries_tries_once() {
    let (mut operation, clock) = manual(RetryableOperation::new(exponential(0)));
    let call: FlakyCall<(), _> = FlakyCall::always_failing("nope");
    assert_eq!(operation.execute(|| call.call()), Err("nope"));
    assert_eq!(call.calls(), 1);
    assert!(clock.sleeps().is_empty());
}

#[test]
fn test_log_is_cumulative_across_calls() {
    let (mut operation, _) = manual(RetryableOperation::new(exponential(1)));
    let _: Result<(), _> = operation.execute(|| Err("a"));
    let _: Result<(), _> = operation.execute(|| Err("b"));
    assert_eq!(operation.attempts().len(), 4);

    // attempt numbers restart with each call
    let numbers: Vec<_> = operation.attempts().iter().map(|a| a.attempt_number()).collect();
    assert_eq!(numbers, vec![0, 1, 0, 1]);

    let taken = operation.take_attempts();
    assert_eq!(taken.len(), 4);
    assert!(operation.attempts().is_empty());

    let _: Result<(), _> = operation.execute(|| Err("c"));
    operation.clear_attempts();
    assert!(operation.last_attempt().is_none());
}

#[derive(Debug, Default)]
struct CountingStrategy {
    successes: parking_lot::Mutex<Vec<u32>>,
    failures: parking_lot::Mutex<Vec<u32>>,
}

impl RecoveryStrategy<&'static str> for CountingStrategy {
    fn name(&self) -> &str {
        "counting"
    }

    fn should_retry(&self, error: &&'static str, attempt: u32) -> bool {
        *error != "fatal" && attempt < 5
    }

    fn get_delay(&self, _attempt: u32, _error: &&'static str) -> Duration {
        Duration::from_millis(1)
    }

    fn on_success(&self, attempt: u32) {
        self.successes.lock().push(attempt);
    }

    fn on_failure(&self, _error: &&'static str, attempts: u32) {
        self.failures.lock().push(attempts);
    }
}

#[test]
fn test_hooks_receive_attempt_counts() {
    let strategy = Arc::new(CountingStrategy::default());
    let (mut operation, _) = manual(RetryableOperation::shared(strategy.clone()));

    let call = FlakyCall::new(2, (), "flaky");
    assert_eq!(operation.execute(|| call.call()), Ok(()));
    assert_eq!(*strategy.successes.lock(), vec![2]);

    let calls = AtomicU32::new(0);
    let result: Result<(), _> = operation.execute(|| {
        if calls.fetch_add(1, Ordering::SeqCst) == 0 {
            Err("flaky")
        } else {
            Err("fatal")
        }
    });
    assert_eq!(result, Err("fatal"));
    assert_eq!(*strategy.failures.lock(), vec![2]);
}

#[test]
fn test_shared_strategy_across_operations() {
    let strategy: Arc<dyn RecoveryStrategy<&'static str>> = Arc::new(exponential(1));
    let (mut first, _) = manual(RetryableOperation::shared(Arc::clone(&strategy)));
    let (mut second, _) = manual(RetryableOperation::shared(strategy));

    let _: Result<(), _> = first.execute(|| Err("x"));
    assert_eq!(first.attempts().len(), 2);
    assert!(second.attempts().is_empty());
    assert_eq!(second.execute(|| Ok(1)), Ok(1));
    assert_eq!(second.strategy().name(), "exponential_backoff");
}

#[test]
fn test_cancel_before_first_try() {
    let (mut operation, _) = manual(RetryableOperation::new(exponential(3)));
    let token = CancellationToken::new();
    token.cancel();

    let calls = AtomicU32::new(0);
    let result = operation.execute_with_cancel(&token, || {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    assert_eq!(
        result,
        Err(RetryError::Cancelled {
            attempts: 0,
            last_error: None
        })
    );
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_cancel_between_tries() {
    let (mut operation, clock) = manual(RetryableOperation::new(exponential(5)));
    let token = CancellationToken::new();
    let calls = AtomicU32::new(0);

    let result: Result<(), _> = operation.execute_with_cancel(&token, || {
        if calls.fetch_add(1, Ordering::SeqCst) == 1 {
            token.cancel();
        }
        Err("busy")
    });

    assert_eq!(
        result,
        Err(RetryError::Cancelled {
            attempts: 2,
            last_error: Some("busy")
        })
    );
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    // the second wait was abandoned
    assert_eq!(clock.sleeps(), vec![Duration::from_secs(1)]);
}

#[test]
fn test_cancellable_exhaustion_is_failed() {
    let (mut operation, _) = manual(RetryableOperation::new(exponential(1)));
    let token = CancellationToken::new();
    let result: Result<(), _> = operation.execute_with_cancel(&token, || Err("gone"));
    assert_eq!(result, Err(RetryError::Failed("gone")));
}

#[test]
fn test_cancel_wakes_real_sleep() {
    let mut operation =
        RetryableOperation::new(exponential(3).with_base_delay(Duration::from_secs(30)));
    let token = CancellationToken::new();
    let handle = token.clone();
    let canceller = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(20));
        handle.cancel();
    });

    let start = std::time::Instant::now();
    let result: Result<(), _> = operation.execute_with_cancel(&token, || Err("slow"));
    assert!(result.unwrap_err().is_cancelled());
    assert!(start.elapsed() < Duration::from_secs(10));
    canceller.join().unwrap();
}

#[test]
fn test_debug_output() {
    let operation: RetryableOperation<&str> = RetryableOperation::new(exponential(1));
    let debug = format!("{:?}", operation);
    assert!(debug.contains("exponential_backoff"));
    assert!(debug.contains("attempts: 0"));
}

#[tracing_test::traced_test]
#[test]
fn test_retries_are_logged() {
    let (mut operation, _) = manual(RetryableOperation::new(exponential(1)));
    let call = FlakyCall::new(1, (), "blip");
    let _ = operation.execute(|| call.call());
    assert!(logs_contain("retrying in"));
    assert!(logs_contain("succeeded after 1 retries"));

    let _: Result<(), _> = operation.execute(|| Err("hard"));
    assert!(logs_contain("giving up after 2 attempts"));
}

#[cfg(feature = "async")]
mod async_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_execute_async_uses_same_delays() {
        let mut operation = RetryableOperation::new(exponential(3));
        let call = FlakyCall::new(3, 9, "later");

        let call = &call;

        let start = tokio::time::Instant::now();
        let result = operation.execute_async(|| async move { call.call() }).await;

        assert_eq!(result, Ok(9));
        assert!(start.elapsed() >= Duration::from_secs(7));
        assert!(start.elapsed() < Duration::from_secs(8));
        let delays: Vec<_> = operation.attempts().iter().map(|a| a.delay()).collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4)
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_async_exhaustion() {
        let mut operation = RetryableOperation::new(exponential(2));
        let result: Result<(), _> = operation.execute_async(|| async { Err("no") }).await;
        assert_eq!(result, Err("no"));
        assert_eq!(operation.attempts().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_async_cancel_during_wait() {
        let mut operation =
            RetryableOperation::new(exponential(3).with_base_delay(Duration::from_secs(60)));
        let token = CancellationToken::new();
        let handle = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            handle.cancel();
        });

        let start = tokio::time::Instant::now();
        let result: Result<(), _> = operation
            .execute_async_with_cancel(&token, || async { Err("wait") })
            .await;

        assert_eq!(
            result,
            Err(RetryError::Cancelled {
                attempts: 1,
                last_error: Some("wait")
            })
        );
        assert!(start.elapsed() < Duration::from_secs(60));
    }
}
