//! Back-off policies for retrying operations against unreliable endpoints.
//!
//! A [`BackOff`] produces the delay to wait before each retry. When the policy
//! decides that retrying should cease it returns `None`, the `STOP` signal.
//! A [`BackOffFactory`] captures configuration once and mints a fresh,
//! independent policy for every connection or session.
//!
//! # Key Types
//!
//! - [`ExponentialBackOff`] - geometric growth with jitter, bounded by elapsed time
//! - [`RandomBackOff`] - uniform delays within a range, bounded by count
//!
//! # Examples
//!
//! ```rust
//! use rebound_core::backoff::{BackOff, BackOffFactory, ExponentialBackOffFactory, ExponentialConfig};
//! use std::time::Duration;
//!
//! let config = ExponentialConfig::builder()
//!     .initial_interval(Duration::from_millis(100))
//!     .multiplier(2.0)
//!     .build()
//!     .unwrap();
//!
//! let factory = ExponentialBackOffFactory::new(config);
//! let mut backoff = factory.create();
//!
//! while let Some(delay) = backoff.next_delay() {
//!     // sleep for `delay`, then retry the operation
//!     # let _ = delay;
//!     # break;
//! }
//! ```

mod exponential;
mod random;

pub use exponential::{
    ExponentialBackOff, ExponentialBackOffFactory, ExponentialConfig, ExponentialConfigBuilder,
};
pub use random::{RANDOM_SEED, RandomBackOff, RandomBackOffFactory, Seed};

use std::fmt::Debug;
use std::time::Duration;

/// The `STOP` signal: no further retries should be attempted.
pub const STOP: Option<Duration> = None;

/// A generator of delays between retry attempts.
///
/// Implementations are single-owner state machines. None of the methods
/// block, sleep or perform I/O.
pub trait BackOff: Debug + Send {
    /// Delay to wait before the next retry, or `None` ([`STOP`]) when the
    /// policy gave up.
    ///
    /// Safe to call repeatedly, including after `None` was returned.
    fn next_delay(&mut self) -> Option<Duration>;

    /// Restore the policy to its freshly constructed state so that one
    /// instance can be reused across independent retry campaigns.
    fn reset(&mut self);
}

impl<B: BackOff + ?Sized> BackOff for Box<B> {
    fn next_delay(&mut self) -> Option<Duration> {
        (**self).next_delay()
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}

/// Creates preconfigured [`BackOff`] instances.
///
/// Configure a factory once (for example from startup configuration) and call
/// [`create`](Self::create) for each connection; every instance owns its own
/// retry state.
pub trait BackOffFactory: Debug + Send + Sync {
    /// Mint a fresh back-off policy.
    fn create(&self) -> Box<dyn BackOff>;
}

impl<F: BackOffFactory + ?Sized> BackOffFactory for Box<F> {
    fn create(&self) -> Box<dyn BackOff> {
        (**self).create()
    }
}

impl<F: BackOffFactory + ?Sized> BackOffFactory for std::sync::Arc<F> {
    fn create(&self) -> Box<dyn BackOff> {
        (**self).create()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boxed_backoff_delegates() {
        let factory = RandomBackOffFactory::new(
            Duration::from_millis(10),
            Duration::from_millis(20),
            2,
            Seed::Fixed(7),
        )
        .unwrap();

        let mut backoff: Box<dyn BackOff> = factory.create();
        assert!(backoff.next_delay().is_some());
        assert!(backoff.next_delay().is_some());
        assert_eq!(backoff.next_delay(), STOP);

        backoff.reset();
        assert!(backoff.next_delay().is_some());
    }

    #[test]
    fn test_factories_are_object_safe() {
        let factories: Vec<Box<dyn BackOffFactory>> = vec![
            Box::new(ExponentialBackOffFactory::default()),
            Box::new(
                RandomBackOffFactory::new(
                    Duration::from_millis(1),
                    Duration::from_millis(2),
                    0,
                    Seed::Entropy,
                )
                .unwrap(),
            ),
        ];

        for factory in &factories {
            let mut backoff = factory.create();
            assert!(backoff.next_delay().is_some());
        }
    }
}
