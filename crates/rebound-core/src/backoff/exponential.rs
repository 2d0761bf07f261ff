//! Exponential back-off with jitter.

use super::{BackOff, BackOffFactory};
use crate::error::{ConfigError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{Duration, Instant};

/// Configuration of an [`ExponentialBackOff`].
///
/// Instances are validated when built, so every `ExponentialConfig` in
/// circulation satisfies `initial_interval >= 1ms`, `max_interval` either zero
/// or at least `initial_interval`, `0 <= randomization_factor <= 1` and
/// `multiplier >= 0`.
///
/// Defaults:
/// - `initial_interval`: 500ms
/// - `max_interval`: 1 minute (0 means unbounded)
/// - `max_elapsed_time`: 15 minutes
/// - `randomization_factor`: 0.5
/// - `multiplier`: 1.5
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialConfig {
    initial_interval: Duration,
    max_interval: Duration,
    max_elapsed_time: Duration,
    randomization_factor: f64,
    multiplier: f64,
}

impl Default for ExponentialConfig {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(500),
            max_interval: Duration::from_secs(60),
            max_elapsed_time: Duration::from_secs(15 * 60),
            randomization_factor: 0.5,
            multiplier: 1.5,
        }
    }
}

impl ExponentialConfig {
    /// Start building a configuration from the defaults.
    pub fn builder() -> ExponentialConfigBuilder {
        ExponentialConfigBuilder::default()
    }

    /// Start building a configuration from this one.
    pub fn to_builder(&self) -> ExponentialConfigBuilder {
        ExponentialConfigBuilder { config: *self }
    }

    /// Center of the first randomized delay.
    pub fn initial_interval(&self) -> Duration {
        self.initial_interval
    }

    /// Upper bound of the center interval, zero when unbounded.
    pub fn max_interval(&self) -> Duration {
        self.max_interval
    }

    /// Time budget of one retry campaign.
    pub fn max_elapsed_time(&self) -> Duration {
        self.max_elapsed_time
    }

    /// Relative width of the jitter window.
    pub fn randomization_factor(&self) -> f64 {
        self.randomization_factor
    }

    /// Growth factor of the center interval.
    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }
}

/// Builder for [`ExponentialConfig`].
///
/// Setters never fail; [`build`](Self::build) validates the whole record.
///
/// # Examples
///
/// ```rust
/// use rebound_core::backoff::ExponentialConfig;
/// use std::time::Duration;
///
/// let config = ExponentialConfig::builder()
///     .initial_interval(Duration::from_secs(1))
///     .max_elapsed_time(Duration::from_secs(120))
///     .randomization_factor(0.2)
///     .build()
///     .unwrap();
///
/// assert_eq!(config.multiplier(), 1.5);
/// assert!(ExponentialConfig::builder().randomization_factor(1.2).build().is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ExponentialConfigBuilder {
    config: ExponentialConfig,
}

impl ExponentialConfigBuilder {
    /// Set the center of the first delay. Must be at least 1ms.
    pub fn initial_interval(mut self, interval: Duration) -> Self {
        self.config.initial_interval = interval;
        self
    }

    /// Set the upper bound of the center interval. Zero disables the bound.
    pub fn max_interval(mut self, interval: Duration) -> Self {
        self.config.max_interval = interval;
        self
    }

    /// Set the time budget measured from the last reset.
    pub fn max_elapsed_time(mut self, elapsed: Duration) -> Self {
        self.config.max_elapsed_time = elapsed;
        self
    }

    /// Set the jitter factor. Must be within `0..=1`.
    pub fn randomization_factor(mut self, factor: f64) -> Self {
        self.config.randomization_factor = factor;
        self
    }

    /// Set the growth factor. Must not be negative.
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.config.multiplier = multiplier;
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::NonPositiveDuration`] for a zero initial interval
    /// - [`ConfigError::SubMillisecond`] for an initial interval below 1ms
    /// - [`ConfigError::MaxBelowInitial`] for a non-zero max interval below the initial interval
    /// - [`ConfigError::RandomizationFactor`] for a factor outside `0..=1` or NaN
    /// - [`ConfigError::NegativeMultiplier`] for a negative or NaN multiplier
    pub fn build(self) -> Result<ExponentialConfig> {
        let config = self.config;

        if config.initial_interval.is_zero() {
            return Err(ConfigError::NonPositiveDuration("initial interval"));
        }

        // growth works on whole milliseconds, a shorter center would collapse to zero
        if config.initial_interval < Duration::from_millis(1) {
            return Err(ConfigError::SubMillisecond {
                field: "initial interval",
                value: config.initial_interval,
            });
        }

        if !config.max_interval.is_zero() && config.max_interval < config.initial_interval {
            return Err(ConfigError::MaxBelowInitial {
                initial: config.initial_interval,
                max: config.max_interval,
            });
        }

        if !(0.0..=1.0).contains(&config.randomization_factor) {
            return Err(ConfigError::RandomizationFactor(config.randomization_factor));
        }

        if config.multiplier.is_nan() || config.multiplier < 0.0 {
            return Err(ConfigError::NegativeMultiplier(config.multiplier));
        }

        Ok(config)
    }
}

/// Exponential back-off with randomized delays.
///
/// The policy manages a center interval. Each delay is drawn uniformly from
/// `[center * (1 - factor), center * (1 + factor)]`, after which the center is
/// multiplied by `multiplier` (and capped at `max_interval` when set). Once
/// `max_elapsed_time` has passed since the last reset, the policy stops.
///
/// # Mathematical Formula
///
/// ```text
/// from  = center * (1 - randomization_factor)
/// to    = center * (1 + randomization_factor)
/// delay = from + random[0, 1) * (to - from)
/// center' = min(center_ms * multiplier, max_interval)
/// ```
///
/// The growth step multiplies the center truncated to whole milliseconds, so
/// the default centers are 500, 750, 1125, 1687, 2530, 3795 ms and so on.
///
/// # Examples
///
/// ```rust
/// use rebound_core::backoff::{BackOff, ExponentialBackOff};
/// use std::time::Duration;
///
/// let mut backoff = ExponentialBackOff::default();
/// assert_eq!(backoff.next_interval(), Duration::from_millis(500));
///
/// let delay = backoff.next_delay().unwrap();
/// assert!(delay >= Duration::from_millis(250) && delay <= Duration::from_millis(750));
/// assert_eq!(backoff.next_interval(), Duration::from_millis(750));
/// ```
#[derive(Debug, Clone)]
pub struct ExponentialBackOff {
    config: ExponentialConfig,
    next_interval: Duration,
    reset_stamp: Instant,
    rng: StdRng,
}

impl Default for ExponentialBackOff {
    fn default() -> Self {
        Self::new(ExponentialConfig::default())
    }
}

impl ExponentialBackOff {
    /// Create a back-off starting at the configured initial interval.
    pub fn new(config: ExponentialConfig) -> Self {
        Self {
            config,
            next_interval: config.initial_interval,
            reset_stamp: Instant::now(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Replace the configuration.
    ///
    /// The current center interval and the elapsed-time stamp are kept; call
    /// [`reset`](BackOff::reset) to restart from the new initial interval.
    pub fn apply_config(&mut self, config: ExponentialConfig) {
        self.config = config;
    }

    /// The configuration in effect.
    pub fn config(&self) -> &ExponentialConfig {
        &self.config
    }

    /// See [`ExponentialConfig::initial_interval`].
    pub fn initial_interval(&self) -> Duration {
        self.config.initial_interval
    }

    /// See [`ExponentialConfig::max_interval`].
    pub fn max_interval(&self) -> Duration {
        self.config.max_interval
    }

    /// See [`ExponentialConfig::max_elapsed_time`].
    pub fn max_elapsed_time(&self) -> Duration {
        self.config.max_elapsed_time
    }

    /// See [`ExponentialConfig::randomization_factor`].
    pub fn randomization_factor(&self) -> f64 {
        self.config.randomization_factor
    }

    /// See [`ExponentialConfig::multiplier`].
    pub fn multiplier(&self) -> f64 {
        self.config.multiplier
    }

    /// Center interval the next delay will be drawn around.
    pub fn next_interval(&self) -> Duration {
        self.next_interval
    }

    /// Time elapsed since the last reset or since creation.
    pub fn elapsed(&self) -> Duration {
        self.reset_stamp.elapsed()
    }

    fn next_random(&mut self) -> Duration {
        let center = self.next_interval.as_micros() as f64;
        let factor = self.config.randomization_factor;

        let from = (center * (1.0 - factor)) as i64;
        let to = (center * (1.0 + factor)) as i64;

        let diff = to - from;
        assert!(diff >= 0, "back-off range is invalid: [{from}us, {to}us]");

        let r: f64 = self.rng.gen_range(0.0..1.0);
        Duration::from_micros((from as f64 + r * diff as f64) as u64)
    }

    fn grow(&mut self) {
        let millis = self.next_interval.as_millis() as f64 * self.config.multiplier;
        let grown = Duration::from_micros((millis * 1000.0) as u64);

        self.next_interval = if self.config.max_interval.is_zero() {
            grown
        } else {
            grown.min(self.config.max_interval)
        };
    }
}

impl BackOff for ExponentialBackOff {
    fn next_delay(&mut self) -> Option<Duration> {
        if self.reset_stamp.elapsed() >= self.config.max_elapsed_time {
            #[cfg(feature = "tracing")]
            tracing::trace!(
                elapsed_ms = self.elapsed().as_millis(),
                max_elapsed_ms = self.config.max_elapsed_time.as_millis(),
                "exponential back-off exhausted its time budget"
            );
            return None;
        }

        let delay = self.next_random();
        self.grow();

        Some(delay)
    }

    fn reset(&mut self) {
        self.rng = StdRng::from_entropy();
        self.next_interval = self.config.initial_interval;
        self.reset_stamp = Instant::now();
    }
}

/// Creates [`ExponentialBackOff`] instances sharing one configuration.
///
/// Each created instance owns a copy of the configuration and starts its
/// elapsed-time budget at creation.
#[derive(Debug, Clone, Default)]
pub struct ExponentialBackOffFactory {
    config: ExponentialConfig,
}

impl ExponentialBackOffFactory {
    /// Create a factory for the given configuration.
    pub fn new(config: ExponentialConfig) -> Self {
        Self { config }
    }

    /// The configuration copied into every created instance.
    pub fn config(&self) -> &ExponentialConfig {
        &self.config
    }
}

impl BackOffFactory for ExponentialBackOffFactory {
    fn create(&self) -> Box<dyn BackOff> {
        Box::new(ExponentialBackOff::new(self.config))
    }
}
