//! Example: reconnecting to a flaky broker
//!
//! This example demonstrates:
//! 1. Retrying a connect call with the default exponential back-off
//! 2. Aborting on a permanent error with `run_while`
//! 3. A manual connection loop driven by a `RetryTracker`
//!
//! Run with:
//! ```bash
//! RUST_LOG=debug cargo run -p rebound --features trace --example reconnect
//! ```

use rebound::observability::init_tracing;
use rebound::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
enum BrokerError {
    #[error("connection refused")]
    Refused,
    #[error("bad credentials")]
    Unauthorized,
}

/// A simulated broker that refuses the first few connections
struct FlakyBroker {
    attempts: AtomicU32,
    refuse_count: u32,
}

impl FlakyBroker {
    fn new(refuse_count: u32) -> Arc<Self> {
        Arc::new(Self {
            attempts: AtomicU32::new(0),
            refuse_count,
        })
    }

    async fn connect(&self) -> Result<&'static str, BrokerError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.refuse_count {
            Err(BrokerError::Refused)
        } else {
            Ok("session-1")
        }
    }
}

async fn example_exponential() -> Result<(), Box<dyn std::error::Error>> {
    println!("\n=== Example 1: Exponential back-off ===\n");

    let config = ExponentialConfig::builder()
        .initial_interval(Duration::from_millis(50))
        .max_elapsed_time(Duration::from_secs(10))
        .build()?;
    let retrier = Retrier::new(ExponentialBackOffFactory::new(config), 3).with_label("broker");

    let broker = FlakyBroker::new(3);
    let session = retrier.run(|| broker.connect()).await?;
    println!("Connected with {session} after {} attempts", broker.attempts.load(Ordering::SeqCst));

    Ok(())
}

async fn example_permanent_error() -> Result<(), Box<dyn std::error::Error>> {
    println!("\n=== Example 2: Permanent errors ===\n");

    let config = ResilienceConfig::from_toml_str(
        r#"
        [backoff]
        kind = "random"
        min = "10 ms"
        max = "50 ms"
        count = 10
        "#,
    )?;
    let retrier = Retrier::from_config(&config)?.with_label("broker-auth");

    let result = retrier
        .run_while(
            || async { Err::<(), _>(BrokerError::Unauthorized) },
            |error| matches!(error, BrokerError::Refused),
        )
        .await;

    if let Err(err) = result {
        println!("Gave up after {} attempt(s): {err}", err.attempts());
    }

    Ok(())
}

async fn example_manual_loop() -> Result<(), Box<dyn std::error::Error>> {
    println!("\n=== Example 3: Manual loop with a tracker ===\n");

    let factory = RandomBackOffFactory::new(
        Duration::from_millis(10),
        Duration::from_millis(30),
        5,
        Seed::Entropy,
    )?;
    let mut tracker = RetryTracker::new(&factory, 2);
    let broker = FlakyBroker::new(100);

    loop {
        match broker.connect().await {
            Ok(session) => {
                tracker.on_success();
                println!("Connected with {session}");
                break;
            }
            Err(err) => {
                let delay = tracker.on_failure();
                println!(
                    "Attempt {} failed: {err} (endpoint failed: {})",
                    tracker.attempts(),
                    tracker.is_failed()
                );
                match delay {
                    Some(delay) => tokio::time::sleep(delay).await,
                    None => {
                        println!("Back-off stopped, marking broker offline");
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    example_exponential().await?;
    example_permanent_error().await?;
    example_manual_loop().await?;

    Ok(())
}
