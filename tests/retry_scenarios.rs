//! End-to-end retry scenarios against a virtual clock.

use floodgate::prelude::*;
use floodgate::testing::FlakyCall;
use floodgate::Classify;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ErrorKind {
    Timeout,
    RateLimited,
    Unauthorized,
}

#[derive(Debug, Clone, PartialEq)]
struct ServiceError {
    kind: ErrorKind,
    message: String,
}

impl ServiceError {
    fn new(kind: ErrorKind, message: &str) -> Self {
        Self {
            kind,
            message: message.to_string(),
        }
    }
}

impl Classify for ServiceError {
    type Kind = ErrorKind;

    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

fn with_manual_clock<E>(operation: RetryableOperation<E>) -> (RetryableOperation<E>, ManualClock) {
    let clock = ManualClock::new();
    (operation.with_clock(Arc::new(clock.clone())), clock)
}

#[test]
fn three_failures_then_success_waits_one_two_four_seconds() {
    let strategy = ExponentialBackoffStrategy::new(3)
        .with_base_delay(Duration::from_secs(1))
        .with_exponential_base(2.0)
        .with_jitter(false);
    let (mut operation, clock) = with_manual_clock(RetryableOperation::new(strategy));
    let call = FlakyCall::new(3, "payload", "connection reset");

    let result = operation.execute(|| call.call());

    assert_eq!(result, Ok("payload"));
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
fn exhaustion_records_every_try_and_returns_the_last_error() {
    let (mut operation, _) = with_manual_clock(RetryableOperation::new(
        LinearBackoffStrategy::new(4).with_delay(Duration::from_millis(50)),
    ));
    let mut n = 0;
    let result: Result<(), String> = operation.execute(|| {
        n += 1;
        Err(format!("failure #{}", n))
    });

    assert_eq!(n, 5);
    assert_eq!(operation.attempts().len(), 5);
    assert_eq!(result, Err("failure #5".to_string()));
    assert_eq!(
        operation.last_attempt().map(|a| a.error().clone()),
        Some("failure #5".to_string())
    );
}

#[test]
fn conditional_strategy_stops_on_denied_kind() {
    let strategy = ConditionalRetryStrategy::new(5)
        .with_delay(Duration::from_millis(10))
        .with_retryable([ErrorKind::Timeout, ErrorKind::RateLimited])
        .with_non_retryable([ErrorKind::Unauthorized]);
    let (mut operation, clock) = with_manual_clock(RetryableOperation::new(strategy));

    let mut script = vec![
        ServiceError::new(ErrorKind::Unauthorized, "token expired"),
        ServiceError::new(ErrorKind::RateLimited, "slow down"),
        ServiceError::new(ErrorKind::Timeout, "no answer"),
    ];
    let result: Result<(), _> = operation.execute(|| Err(script.pop().unwrap()));

    assert_eq!(result.unwrap_err().message, "token expired");
    assert_eq!(operation.attempts().len(), 3);
    assert_eq!(clock.total_slept(), Duration::from_millis(20));
}

#[test]
fn conditional_strategy_without_lists_retries_until_cap() {
    let strategy = ConditionalRetryStrategy::<ErrorKind>::new(2).with_delay(Duration::ZERO);
    let (mut operation, _) = with_manual_clock(RetryableOperation::new(strategy));
    let call = FlakyCall::always_failing(ServiceError::new(ErrorKind::Unauthorized, "no"));

    let result: Result<(), _> = operation.execute(|| call.call());
    assert!(result.is_err());
    assert_eq!(call.calls(), 3);
}

#[test]
fn one_strategy_serves_many_threads() {
    let strategy: Arc<dyn RecoveryStrategy<&'static str>> = Arc::new(
        ExponentialBackoffStrategy::new(2)
            .with_base_delay(Duration::from_millis(1))
            .with_jitter(false),
    );

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let strategy = Arc::clone(&strategy);
            std::thread::spawn(move || {
                let mut operation = RetryableOperation::shared(strategy);
                let call = FlakyCall::new(i % 3, i, "flaky");
                let result = operation.execute(|| call.call());
                (result, operation.attempts().len())
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let (result, attempts) = handle.join().unwrap();
        assert_eq!(result, Ok(i as u32));
        assert_eq!(attempts, i % 3);
    }
}

#[test]
fn cancellation_from_another_thread_stops_the_wait() {
    let mut operation = RetryableOperation::new(
        LinearBackoffStrategy::new(10).with_delay(Duration::from_secs(60)),
    );
    let token = CancellationToken::new();
    let remote = token.clone();
    let canceller = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(30));
        remote.cancel();
    });

    let result: Result<(), _> = operation.execute_with_cancel(&token, || Err("unreachable host"));

    canceller.join().unwrap();
    match result {
        Err(RetryError::Cancelled {
            attempts,
            last_error,
        }) => {
            assert_eq!(attempts, 1);
            assert_eq!(last_error, Some("unreachable host"));
        }
        other => panic!("Expected cancellation, got {:?}", other),
    }
}
