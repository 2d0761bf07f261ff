//! Per-connection retry state
//!
//! A [`RetryTracker`] pairs a back-off policy with a [`FailDetector`] so that
//! a connection loop only has to report outcomes:
//!
//! ```rust
//! use rebound::tracker::RetryTracker;
//! use rebound_core::backoff::ExponentialBackOffFactory;
//!
//! let mut tracker = RetryTracker::new(&ExponentialBackOffFactory::default(), 3);
//!
//! // connect() failed
//! let delay = tracker.on_failure();
//! assert!(delay.is_some());
//! assert!(tracker.is_going_to_fail());
//!
//! // connect() succeeded
//! tracker.on_success();
//! assert_eq!(tracker.attempts(), 0);
//! ```

use crate::observability;
use rebound_core::FailDetector;
use rebound_core::backoff::{BackOff, BackOffFactory};
use std::time::Duration;

/// Back-off policy and fail detector of one connection.
#[derive(Debug)]
pub struct RetryTracker {
    backoff: Box<dyn BackOff>,
    detector: FailDetector,
    attempts: u32,
}

impl RetryTracker {
    /// Create a tracker with a fresh policy from `factory`.
    ///
    /// `threshold` is the number of consecutive failures after which the
    /// connection is failed, zero for never.
    pub fn new(factory: &dyn BackOffFactory, threshold: u32) -> Self {
        Self::with_parts(factory.create(), FailDetector::new(threshold))
    }

    /// Create a tracker from an existing policy and detector.
    pub fn with_parts(backoff: Box<dyn BackOff>, detector: FailDetector) -> Self {
        Self {
            backoff,
            detector,
            attempts: 0,
        }
    }

    /// Record a failed attempt and return the delay before the next one.
    ///
    /// `None` means the back-off policy gave up.
    pub fn on_failure(&mut self) -> Option<Duration> {
        let was_failed = self.detector.is_failed();
        self.detector.fail();
        self.attempts = self.attempts.saturating_add(1);

        if !was_failed && self.detector.is_failed() {
            observability::log_endpoint_failed(self.detector.fails(), self.detector.threshold());
        }

        self.backoff.next_delay()
    }

    /// Record a successful attempt and reset the policy for the next campaign.
    pub fn on_success(&mut self) {
        if self.detector.is_failed() {
            observability::log_endpoint_recovered(self.detector.fails());
        }

        self.detector.success();
        self.backoff.reset();
        self.attempts = 0;
    }

    /// Returns true once the failure threshold is reached.
    pub fn is_failed(&self) -> bool {
        self.detector.is_failed()
    }

    /// Returns true after any unrecovered failure.
    pub fn is_going_to_fail(&self) -> bool {
        self.detector.is_going_to_fail()
    }

    /// Failed attempts since the last success.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Number of the attempt about to be made.
    pub fn next_attempt(&self) -> u32 {
        self.attempts.saturating_add(1)
    }

    /// The underlying fail detector.
    pub fn detector(&self) -> &FailDetector {
        &self.detector
    }
}
