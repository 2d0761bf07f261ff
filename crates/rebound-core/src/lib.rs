#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Core resilience primitives for gateway connections.
//!
//! This crate provides the building blocks a caller needs to retry
//! operations against unreliable remote endpoints:
//!
//! - **Back-off policies** via the [`BackOff`](backoff::BackOff) trait
//!   - Exponential back-off with jitter, bounded by an elapsed-time budget
//!   - Random back-off within a range, bounded by an iteration count
//! - **Factories** via [`BackOffFactory`](backoff::BackOffFactory), minting a
//!   fresh policy per connection from configuration captured once
//! - **Failure detection** via [`FailDetector`], classifying an endpoint as
//!   failed after a threshold of consecutive failures
//! - **Timespans** via [`Timespan`], the textual duration syntax used in
//!   configuration files
//!
//! All components are plain single-owner values: no locking, no I/O, no
//! global random state.
//!
//! # Examples
//!
//! Using the prelude for convenient imports:
//!
//! ```rust
//! use rebound_core::prelude::*;
//!
//! let mut backoff = ExponentialBackOff::default();
//! let mut detector = FailDetector::new(3);
//!
//! // the remote endpoint did not answer
//! detector.fail();
//! if let Some(delay) = backoff.next_delay() {
//!     assert!(delay.as_millis() <= 750);
//! }
//! assert!(detector.is_going_to_fail());
//! ```

pub mod backoff;
pub mod error;
pub mod fail_detector;
pub mod timespan;

mod property_tests;

pub use error::{ConfigError, Result};
pub use fail_detector::FailDetector;
pub use timespan::Timespan;

/// Convenient re-exports of commonly used items.
///
/// Import all core abstractions with:
///
/// ```rust
/// use rebound_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::backoff::{
        BackOff, BackOffFactory, ExponentialBackOff, ExponentialBackOffFactory, ExponentialConfig,
        RandomBackOff, RandomBackOffFactory, STOP, Seed,
    };
    pub use crate::error::ConfigError;
    pub use crate::fail_detector::FailDetector;
    pub use crate::timespan::Timespan;
}
