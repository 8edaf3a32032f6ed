//! Circuit Breaker Patterns Example
//!
//! Demonstrates one breaker shared by several callers:
//! - Opening after consecutive failures
//! - Fast rejection while open
//! - Half-open probing and recovery
//! - Fallback chains behind a breaker
//!
//! Run with: cargo run --example breaker_patterns

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use floodgate::prelude::*;

/// A dependency that can be switched between healthy and down.
struct Inventory {
    healthy: AtomicBool,
}

impl Inventory {
    fn stock(&self, sku: &str) -> Result<u32, String> {
        if self.healthy.load(Ordering::SeqCst) {
            Ok(sku.len() as u32 * 10)
        } else {
            Err(format!("inventory unreachable for {}", sku))
        }
    }
}

fn example_lifecycle(inventory: &Inventory, breaker: &CircuitBreaker<String>) {
    println!("\n=== Example 1: Breaker Lifecycle ===");

    inventory.healthy.store(false, Ordering::SeqCst);
    for i in 0..4 {
        let result = breaker.call(|| inventory.stock("widget"));
        println!("  call {}: {:?} (state {})", i + 1, result, breaker.state());
    }

    println!("  waiting for the reset timeout...");
    std::thread::sleep(breaker.reset_timeout());
    inventory.healthy.store(true, Ordering::SeqCst);

    let result = breaker.call(|| inventory.stock("widget"));
    println!("  probe: {:?} (state {})", result, breaker.state());
    println!("  stats: {:?}", breaker.stats());
}

fn example_with_fallback(inventory: Arc<Inventory>, breaker: Arc<CircuitBreaker<String>>) {
    println!("\n=== Example 2: Fallback Behind a Breaker ===");

    inventory.healthy.store(false, Ordering::SeqCst);
    let handler = FallbackHandler::new()
        .with_named_fallback("last_known", |sku: &str| {
            if sku == "widget" {
                Ok(42)
            } else {
                Err("no snapshot".to_string())
            }
        })
        .with_named_fallback("zero", |_: &str| Ok(0));

    for sku in ["widget", "gadget"] {
        let result = handler.execute_with_fallback(
            |sku| {
                breaker
                    .call(|| inventory.stock(sku))
                    .map_err(|e| e.to_string())
            },
            sku,
        );
        println!("  {}: {:?}", sku, result);
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let inventory = Arc::new(Inventory {
        healthy: AtomicBool::new(true),
    });
    let breaker = Arc::new(
        CircuitBreaker::new(3, Duration::from_millis(200)).with_name("inventory"),
    );

    example_lifecycle(&inventory, &breaker);
    example_with_fallback(Arc::clone(&inventory), Arc::clone(&breaker));
}
