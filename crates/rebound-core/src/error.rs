//! Configuration errors for back-off policies and fail detectors.
//!
//! Every error in this module is raised while configuring a component, never
//! while it is used. Exhaustion of a back-off policy is not an error: it is
//! reported as `None` from [`BackOff::next_delay`](crate::backoff::BackOff::next_delay).

use std::time::Duration;
use thiserror::Error;

/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// A rejected configuration value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A duration that must be strictly positive was zero.
    #[error("{0} must be positive")]
    NonPositiveDuration(&'static str),

    /// A duration below the millisecond resolution of back-off growth.
    #[error("{field} must be at least 1ms (got {value:?})")]
    SubMillisecond {
        /// Name of the offending option
        field: &'static str,
        /// The rejected value
        value: Duration,
    },

    /// A non-zero cap smaller than the interval it caps.
    #[error("max interval {max:?} is smaller than initial interval {initial:?}")]
    MaxBelowInitial {
        /// Configured initial interval
        initial: Duration,
        /// Configured max interval
        max: Duration,
    },

    /// A signed timespan that must not be negative was negative.
    #[error("{field} must not be negative (got {micros}us)")]
    NegativeDuration {
        /// Name of the offending option
        field: &'static str,
        /// The rejected value in microseconds
        micros: i64,
    },

    /// Randomization factor outside of `0..=1`.
    #[error("randomization factor must be in range 0..1 (got {0})")]
    RandomizationFactor(f64),

    /// Negative or NaN multiplier.
    #[error("multiplier must not be negative (got {0})")]
    NegativeMultiplier(f64),

    /// Random back-off bounds where `min >= max`.
    #[error("min must be smaller than max (min: {min:?}, max: {max:?})")]
    InvalidRange {
        /// Lower bound
        min: Duration,
        /// Upper bound
        max: Duration,
    },

    /// Random back-off range wider than the generator can draw from.
    #[error("back-off range {span:?} exceeds the generator limit of {limit:?}")]
    RangeTooWide {
        /// Requested `max - min`
        span: Duration,
        /// Widest supported span
        limit: Duration,
    },

    /// Negative iteration count.
    #[error("count must not be negative (got {0})")]
    NegativeCount(i64),

    /// Negative fail threshold.
    #[error("fails threshold must not be negative (got {0})")]
    NegativeThreshold(i64),

    /// Text that is not a valid timespan.
    #[error("invalid timespan: {0}")]
    InvalidTimespan(String),
}
