//! Async retry driven by a back-off policy
//!
//! [`Retrier`] repeats an async operation, sleeping on the tokio timer between
//! attempts, until it succeeds or the back-off policy stops.
//!
//! # Example
//!
//! ```rust
//! use rebound::Retrier;
//! use rebound_core::backoff::{RandomBackOffFactory, Seed};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let factory = RandomBackOffFactory::new(
//!     Duration::from_millis(1),
//!     Duration::from_millis(2),
//!     3,
//!     Seed::Entropy,
//! )
//! .unwrap();
//! let retrier = Retrier::new(factory, 0).with_label("sensor-poll");
//!
//! let mut calls = 0;
//! let value = retrier
//!     .run(|| {
//!         calls += 1;
//!         let ready = calls > 1;
//!         async move { if ready { Ok(42) } else { Err("not ready") } }
//!     })
//!     .await
//!     .unwrap();
//! assert_eq!(value, 42);
//! # });
//! ```

use crate::config::ResilienceConfig;
use crate::error::{Result, RetryError};
use crate::observability::{CampaignMetadata, CampaignTimer};
use crate::tracker::RetryTracker;
use rebound_core::backoff::BackOffFactory;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

/// Retries async operations according to a back-off factory.
///
/// Every call to [`run`](Self::run) starts a fresh campaign with its own
/// back-off instance, so one `Retrier` can be shared by many tasks.
///
/// Sleeps use the tokio clock, while the elapsed-time budget of an
/// exponential policy is measured on the system clock. With paused tokio
/// time (`start_paused` tests) sleeping does not consume that budget.
#[derive(Debug, Clone)]
pub struct Retrier {
    factory: Arc<dyn BackOffFactory>,
    threshold: u32,
    label: String,
    policy: String,
}

impl Retrier {
    /// Create a retrier minting policies from `factory`.
    ///
    /// `threshold` configures the fail detector of each campaign.
    pub fn new(factory: impl BackOffFactory + 'static, threshold: u32) -> Self {
        Self::from_shared(Arc::new(factory), threshold)
    }

    /// Create a retrier from a shared factory.
    pub fn from_shared(factory: Arc<dyn BackOffFactory>, threshold: u32) -> Self {
        Self {
            factory,
            threshold,
            label: "operation".to_string(),
            policy: "custom".to_string(),
        }
    }

    /// Create a retrier from validated configuration.
    pub fn from_config(config: &ResilienceConfig) -> Result<Self> {
        let factory: Arc<dyn BackOffFactory> = Arc::from(config.factory()?);
        let mut retrier = Self::from_shared(factory, config.fail_detector.threshold()?);
        retrier.policy = config.backoff.kind().to_string();
        Ok(retrier)
    }

    /// Set the name used in log events.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// The fail-detector threshold of each campaign.
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Start a campaign by hand, for loops that manage their own attempts.
    pub fn tracker(&self) -> RetryTracker {
        RetryTracker::new(self.factory.as_ref(), self.threshold)
    }

    /// Run `operation` until it succeeds or the back-off policy stops.
    ///
    /// # Errors
    ///
    /// Returns [`RetryError::Exhausted`] with the last error once the policy
    /// returns `STOP`.
    pub async fn run<T, E, F, Fut>(&self, operation: F) -> std::result::Result<T, RetryError<E>>
    where
        E: Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        self.run_while(operation, |_| true).await
    }

    /// Like [`run`](Self::run), but stops at the first error for which
    /// `is_retryable` returns false.
    ///
    /// # Errors
    ///
    /// Returns [`RetryError::Aborted`] for a permanent error and
    /// [`RetryError::Exhausted`] once the policy returns `STOP`.
    pub async fn run_while<T, E, F, Fut, P>(
        &self,
        mut operation: F,
        mut is_retryable: P,
    ) -> std::result::Result<T, RetryError<E>>
    where
        E: Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        P: FnMut(&E) -> bool,
    {
        let meta = CampaignMetadata::new(self.label.as_str(), self.policy.as_str());
        let timer = CampaignTimer::start();
        let mut tracker = self.tracker();

        loop {
            let attempt = tracker.next_attempt();
            meta.log_attempt(attempt);

            let error = match operation().await {
                Ok(value) => {
                    meta.log_success(attempt, timer.elapsed());
                    return Ok(value);
                }
                Err(error) => error,
            };

            if !is_retryable(&error) {
                meta.log_aborted(attempt, &error);
                return Err(RetryError::Aborted {
                    source: error,
                    attempts: attempt,
                });
            }

            match tracker.on_failure() {
                Some(delay) => {
                    meta.log_retry(attempt, delay, &error);
                    tokio::time::sleep(delay).await;
                }
                None => {
                    let elapsed = timer.elapsed();
                    meta.log_exhausted(attempt, elapsed, &error);
                    return Err(RetryError::Exhausted {
                        source: error,
                        attempts: attempt,
                        elapsed,
                    });
                }
            }
        }
    }
}
