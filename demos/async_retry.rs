//! Async Retry Example
//!
//! Retries an async call on the tokio timer and cancels a long backoff.
//!
//! Run with: cargo run --example async_retry --features async

use std::time::Duration;

use floodgate::prelude::*;
use floodgate::testing::FlakyCall;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("\n=== Example 1: execute_async ===");
    let mut operation = RetryableOperation::new(
        ExponentialBackoffStrategy::new(4).with_base_delay(Duration::from_millis(25)),
    );
    let call = FlakyCall::new(2, 200u16, "timeout");
    let call = &call;
    let result = operation
        .execute_async(|| async move {
            tokio::task::yield_now().await;
            call.call()
        })
        .await;
    println!("Result: {:?} after {} calls", result, call.calls());

    println!("\n=== Example 2: Cancelling a backoff ===");
    let mut operation = RetryableOperation::new(
        LinearBackoffStrategy::new(5).with_delay(Duration::from_secs(30)),
    );
    let token = CancellationToken::new();
    let remote = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        remote.cancel();
    });

    let result: Result<(), _> = operation
        .execute_async_with_cancel(&token, || async { Err("still down") })
        .await;
    match result {
        Err(e @ RetryError::Cancelled { .. }) => println!("{}", e),
        other => println!("Unexpected: {:?}", other),
    }
}
