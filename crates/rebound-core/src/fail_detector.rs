//! Threshold-based detection of failing endpoints.

use std::time::{Duration, Instant};

/// Counts consecutive failures and decides when an endpoint is failed.
///
/// The detector is "going to fail" after the first recorded failure and
/// "failed" once the number of consecutive failures reaches the threshold.
/// A threshold of [`THRESHOLD_UNLIMITED`](Self::THRESHOLD_UNLIMITED) never
/// declares failure.
///
/// Both timestamps start at construction time. Consequently
/// [`last_fail_before`](Self::last_fail_before) and
/// [`failed_before`](Self::failed_before) report `true` for a detector that
/// has existed longer than the timeout, even without any failure.
///
/// # Examples
///
/// ```rust
/// use rebound_core::FailDetector;
///
/// let mut detector = FailDetector::new(2);
///
/// detector.fail();
/// assert!(detector.is_going_to_fail());
/// assert!(!detector.is_failed());
///
/// detector.fail();
/// assert!(detector.is_failed());
///
/// detector.success();
/// assert!(!detector.is_going_to_fail());
/// ```
#[derive(Debug, Clone)]
pub struct FailDetector {
    fails: u32,
    threshold: u32,
    time_of_last_fail: Instant,
    time_of_failure: Instant,
}

impl Default for FailDetector {
    fn default() -> Self {
        Self::new(Self::THRESHOLD_UNLIMITED)
    }
}

impl FailDetector {
    /// Threshold value that never declares failure.
    pub const THRESHOLD_UNLIMITED: u32 = 0;

    /// Create a detector failing after `threshold` consecutive failures.
    pub fn new(threshold: u32) -> Self {
        let now = Instant::now();
        Self {
            fails: 0,
            threshold,
            time_of_last_fail: now,
            time_of_failure: now,
        }
    }

    /// Record a failure.
    ///
    /// Updates the time of the last failure. The counter stops growing once
    /// the detector is failed, and the time of failure is stamped only on the
    /// transition into the failed state.
    pub fn fail(&mut self) {
        let now = Instant::now();
        self.time_of_last_fail = now;

        if self.is_failed() {
            return;
        }

        self.fails = self.fails.saturating_add(1);
        if self.is_failed() {
            self.time_of_failure = now;

            #[cfg(feature = "tracing")]
            tracing::trace!(
                fails = self.fails,
                threshold = self.threshold,
                "fail detector reached its threshold"
            );
        }
    }

    /// Record a success, clearing the failure counter.
    ///
    /// Timestamps are kept as historical markers.
    pub fn success(&mut self) {
        self.fails = 0;
    }

    /// At least one failure was recorded since the last success.
    pub fn is_going_to_fail(&self) -> bool {
        self.fails > 0
    }

    /// The threshold of consecutive failures has been reached.
    pub fn is_failed(&self) -> bool {
        self.threshold > 0 && self.fails >= self.threshold
    }

    /// Consecutive failures since the last success.
    pub fn fails(&self) -> u32 {
        self.fails
    }

    /// Configured threshold, zero for unlimited.
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Instant of the last failure (construction time before any failure).
    pub fn time_of_last_fail(&self) -> Instant {
        self.time_of_last_fail
    }

    /// Instant the threshold was last reached (construction time before that).
    pub fn time_of_failure(&self) -> Instant {
        self.time_of_failure
    }

    /// The timeout has elapsed since the last failure.
    pub fn last_fail_before(&self, timeout: Duration) -> bool {
        self.time_of_last_fail.elapsed() >= timeout
    }

    /// The timeout has elapsed since the threshold was reached.
    pub fn failed_before(&self, timeout: Duration) -> bool {
        self.time_of_failure.elapsed() >= timeout
    }
}
