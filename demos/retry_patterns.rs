//! Retry Patterns Example
//!
//! Demonstrates the retry strategies against simulated flaky calls:
//! - Exponential backoff with and without jitter
//! - Linear backoff
//! - Conditional retry by error kind
//! - Inspecting the attempt log
//!
//! Run with: cargo run --example retry_patterns

use std::time::Duration;

use floodgate::prelude::*;
use floodgate::testing::FlakyCall;
use floodgate::Classify;

// ==================== Exponential Backoff ====================

/// Example 1: three transient failures, then success
fn example_exponential() {
    println!("\n=== Example 1: Exponential Backoff ===");

    let strategy = ExponentialBackoffStrategy::new(3)
        .with_base_delay(Duration::from_millis(50))
        .with_jitter(false);
    let mut operation = RetryableOperation::new(strategy);
    let call = FlakyCall::new(3, "payload", "connection reset");

    let result = operation.execute(|| call.call());
    println!("Result: {:?} after {} calls", result, call.calls());
    for attempt in operation.attempts() {
        println!(
            "  attempt {} failed with {:?}, waited {:?}",
            attempt.attempt_number(),
            attempt.error(),
            attempt.delay()
        );
    }
}

/// Example 2: jitter spreads delays around the exponential curve
fn example_jitter() {
    println!("\n=== Example 2: Jitter ===");

    let strategy = ExponentialBackoffStrategy::new(5).with_base_delay(Duration::from_millis(100));
    for attempt in 0..5 {
        let base = strategy.delay_for_attempt(attempt);
        let jittered = strategy.get_delay(attempt, &());
        println!("  attempt {}: capped {:?}, jittered {:?}", attempt, base, jittered);
    }
}

// ==================== Linear Backoff ====================

/// Example 3: a steady ramp, ending in exhaustion
fn example_linear() {
    println!("\n=== Example 3: Linear Backoff ===");

    let strategy = LinearBackoffStrategy::new(3)
        .with_delay(Duration::from_millis(20))
        .with_delay_increment(Duration::from_millis(10));
    let mut operation = RetryableOperation::new(strategy);
    let call: FlakyCall<(), _> = FlakyCall::always_failing("service unavailable");

    match operation.execute(|| call.call()) {
        Ok(()) => println!("Unexpected success"),
        Err(e) => println!("Gave up after {} tries with: {}", operation.attempts().len(), e),
    }
}

// ==================== Conditional Retry ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum HttpKind {
    ServerError,
    TooManyRequests,
    ClientError,
}

#[derive(Debug, Clone)]
struct HttpError {
    status: u16,
}

impl Classify for HttpError {
    type Kind = HttpKind;

    fn kind(&self) -> HttpKind {
        match self.status {
            429 => HttpKind::TooManyRequests,
            500..=599 => HttpKind::ServerError,
            _ => HttpKind::ClientError,
        }
    }
}

/// Example 4: only server-side failures are retried
fn example_conditional() {
    println!("\n=== Example 4: Conditional Retry ===");

    let strategy = ConditionalRetryStrategy::new(4)
        .with_delay(Duration::from_millis(10))
        .with_retryable([HttpKind::ServerError, HttpKind::TooManyRequests])
        .with_non_retryable([HttpKind::ClientError]);
    let mut operation = RetryableOperation::new(strategy);

    // popped from the back: 503, 429, then 404
    let mut responses = vec![404, 429, 503];
    let result: Result<(), _> = operation.execute(|| {
        let status = responses.pop().unwrap_or(500);
        println!("  request returned {}", status);
        Err(HttpError { status })
    });

    println!(
        "Stopped on {:?} after {} tries",
        result.map_err(|e| e.status),
        operation.attempts().len()
    );
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("======================================");
    println!("       Retry Patterns Example         ");
    println!("======================================");

    example_exponential();
    example_jitter();
    example_linear();
    example_conditional();

    println!("\n======================================");
    println!("           Examples Complete           ");
    println!("======================================");
}
