//! Centralized structured logging for retry campaigns
//!
//! Every attempt, scheduled delay, give-up and fail-detector transition is
//! logged through this module so that the field names stay consistent.

use std::fmt::Display;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Context of one retry campaign for structured logging
#[derive(Debug, Clone)]
pub struct CampaignMetadata {
    /// Name of the operation or endpoint being retried
    pub label: String,
    /// Back-off policy in use
    pub policy: String,
}

impl CampaignMetadata {
    /// Create new campaign metadata
    pub fn new(label: impl Into<String>, policy: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            policy: policy.into(),
        }
    }

    /// Log an attempt being started
    pub fn log_attempt(&self, attempt: u32) {
        debug!(
            label = %self.label,
            attempt,
            "Starting attempt"
        );
    }

    /// Log a failed attempt that will be retried after `delay`
    pub fn log_retry(&self, attempt: u32, delay: Duration, error: &dyn Display) {
        info!(
            label = %self.label,
            policy = %self.policy,
            attempt,
            delay_ms = delay.as_millis(),
            error = %error,
            "Attempt failed, retrying"
        );
    }

    /// Log success of the campaign
    pub fn log_success(&self, attempts: u32, elapsed: Duration) {
        if attempts > 1 {
            info!(
                label = %self.label,
                attempts,
                elapsed_ms = elapsed.as_millis(),
                "Operation succeeded after retries"
            );
        } else {
            debug!(
                label = %self.label,
                elapsed_ms = elapsed.as_millis(),
                "Operation succeeded"
            );
        }
    }

    /// Log the back-off policy giving up
    pub fn log_exhausted(&self, attempts: u32, elapsed: Duration, error: &dyn Display) {
        warn!(
            label = %self.label,
            policy = %self.policy,
            attempts,
            elapsed_ms = elapsed.as_millis(),
            error = %error,
            "Back-off stopped, giving up"
        );
    }

    /// Log an error the caller declared permanent
    pub fn log_aborted(&self, attempts: u32, error: &dyn Display) {
        warn!(
            label = %self.label,
            attempts,
            error = %error,
            "Permanent error, not retrying"
        );
    }
}

/// Log the fail detector declaring an endpoint failed
pub fn log_endpoint_failed(fails: u32, threshold: u32) {
    warn!(fails, threshold, "Endpoint marked as failed");
}

/// Log a failed endpoint recovering
pub fn log_endpoint_recovered(fails: u32) {
    info!(fails, "Endpoint recovered");
}

/// Timer for measuring campaign duration
///
/// Uses the tokio clock so that paused test time is honored.
#[derive(Debug, Clone, Copy)]
pub struct CampaignTimer {
    start: Instant,
}

impl CampaignTimer {
    /// Start a new timer
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Install a `fmt` subscriber filtered by `RUST_LOG`, defaulting to `info`.
///
/// Does nothing if a global subscriber is already set.
#[cfg(feature = "trace")]
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_campaign_metadata() {
        let meta = CampaignMetadata::new("mqtt-broker", "exponential");
        assert_eq!(meta.label, "mqtt-broker");
        assert_eq!(meta.policy, "exponential");

        // Logging without a subscriber is a no-op
        meta.log_attempt(1);
        meta.log_retry(1, Duration::from_millis(500), &"timeout");
        meta.log_success(2, Duration::from_millis(510));
        meta.log_exhausted(5, Duration::from_secs(3), &"timeout");
        meta.log_aborted(1, &"unauthorized");
    }

    #[tokio::test(start_paused = true)]
    async fn test_campaign_timer_follows_tokio_clock() {
        let timer = CampaignTimer::start();
        tokio::time::advance(Duration::from_millis(250)).await;
        assert!(timer.elapsed() >= Duration::from_millis(250));
    }
}
