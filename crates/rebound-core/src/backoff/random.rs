//! Random back-off bounded by the number of generated delays.

use super::{BackOff, BackOffFactory};
use crate::error::{ConfigError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

/// Seed value requesting a generator seeded from system entropy.
pub const RANDOM_SEED: u32 = u32::MAX;

/// Widest `max - min` span the generator draws from (2^32 - 1 microseconds,
/// roughly 71 minutes).
const MAX_SPAN: Duration = Duration::from_micros(u32::MAX as u64);

/// Seeding rule of a [`RandomBackOff`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Seed {
    /// Seed from system entropy on creation and on every reset.
    #[default]
    Entropy,
    /// Deterministic seed; the delay sequence is reproducible.
    Fixed(u32),
}

impl Seed {
    fn rng(self) -> StdRng {
        match self {
            Seed::Entropy => StdRng::from_entropy(),
            Seed::Fixed(seed) => StdRng::seed_from_u64(u64::from(seed)),
        }
    }
}

impl From<u32> for Seed {
    /// Maps [`RANDOM_SEED`] to [`Seed::Entropy`], anything else to a fixed seed.
    fn from(seed: u32) -> Self {
        if seed == RANDOM_SEED {
            Seed::Entropy
        } else {
            Seed::Fixed(seed)
        }
    }
}

fn validate(min: Duration, max: Duration) -> Result<u64> {
    if min >= max {
        return Err(ConfigError::InvalidRange { min, max });
    }

    let span = max - min;
    if span > MAX_SPAN {
        return Err(ConfigError::RangeTooWide {
            span,
            limit: MAX_SPAN,
        });
    }

    // sub-microsecond ranges leave nothing to draw from
    match span.as_micros() as u64 {
        0 => Err(ConfigError::InvalidRange { min, max }),
        micros => Ok(micros),
    }
}

/// Back-off generating uniformly random delays between `min` and `max`.
///
/// Up to `count` delays are generated before the policy stops; a count of
/// zero never stops.
///
/// # Examples
///
/// ```rust
/// use rebound_core::backoff::{BackOff, RandomBackOff, Seed};
/// use std::time::Duration;
///
/// let mut backoff = RandomBackOff::new(
///     Duration::from_millis(100),
///     Duration::from_millis(500),
///     2,
///     Seed::Fixed(42),
/// )
/// .unwrap();
///
/// assert!(backoff.next_delay().is_some());
/// assert!(backoff.next_delay().is_some());
/// assert!(backoff.next_delay().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct RandomBackOff {
    min: Duration,
    max: Duration,
    span_micros: u64,
    count: usize,
    current: usize,
    seed: Seed,
    rng: StdRng,
}

impl RandomBackOff {
    /// Create a random back-off.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::InvalidRange`] unless `min < max` (at microsecond resolution)
    /// - [`ConfigError::RangeTooWide`] when `max - min` exceeds 2^32 - 1 microseconds
    pub fn new(min: Duration, max: Duration, count: usize, seed: impl Into<Seed>) -> Result<Self> {
        let span_micros = validate(min, max)?;
        let seed = seed.into();

        Ok(Self {
            min,
            max,
            span_micros,
            count,
            current: 0,
            seed,
            rng: seed.rng(),
        })
    }

    /// Lower bound of generated delays.
    pub fn min(&self) -> Duration {
        self.min
    }

    /// Upper bound of generated delays.
    pub fn max(&self) -> Duration {
        self.max
    }

    /// Number of delays generated before stopping, zero for unlimited.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Number of delays generated since the last reset.
    pub fn current(&self) -> usize {
        self.current
    }

    /// The seeding rule.
    pub fn seed(&self) -> Seed {
        self.seed
    }
}

impl BackOff for RandomBackOff {
    fn next_delay(&mut self) -> Option<Duration> {
        if self.count > 0 && self.current >= self.count {
            return None;
        }
        self.current += 1;

        let drawn = self.rng.gen_range(0..self.span_micros);
        Some(self.min + Duration::from_micros(drawn))
    }

    fn reset(&mut self) {
        self.current = 0;
        self.rng = self.seed.rng();
    }
}

/// Creates preconfigured [`RandomBackOff`] instances.
///
/// The bounds are validated when the factory is created so that
/// [`create`](BackOffFactory::create) cannot fail.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomBackOffFactory {
    min: Duration,
    max: Duration,
    count: usize,
    seed: Seed,
}

impl RandomBackOffFactory {
    /// Create a factory, validating the bounds.
    ///
    /// # Errors
    ///
    /// Same as [`RandomBackOff::new`].
    pub fn new(min: Duration, max: Duration, count: usize, seed: impl Into<Seed>) -> Result<Self> {
        validate(min, max)?;

        Ok(Self {
            min,
            max,
            count,
            seed: seed.into(),
        })
    }

    /// Lower bound of generated delays.
    pub fn min(&self) -> Duration {
        self.min
    }

    /// Upper bound of generated delays.
    pub fn max(&self) -> Duration {
        self.max
    }

    /// Number of delays per created instance, zero for unlimited.
    pub fn count(&self) -> usize {
        self.count
    }

    /// The seeding rule passed to created instances.
    pub fn seed(&self) -> Seed {
        self.seed
    }

    fn instance(&self) -> RandomBackOff {
        let seed = self.seed;
        RandomBackOff {
            min: self.min,
            max: self.max,
            span_micros: (self.max - self.min).as_micros() as u64,
            count: self.count,
            current: 0,
            seed,
            rng: seed.rng(),
        }
    }
}

impl BackOffFactory for RandomBackOffFactory {
    fn create(&self) -> Box<dyn BackOff> {
        Box::new(self.instance())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN: Duration = Duration::from_millis(100);
    const MAX: Duration = Duration::from_millis(500);
    const COUNT: usize = 20_000;

    fn drain(backoff: &mut RandomBackOff) -> Vec<Duration> {
        let mut delays = Vec::new();
        while let Some(delay) = backoff.next_delay() {
            assert!(delay >= MIN, "{delay:?} below min");
            assert!(delay <= MAX, "{delay:?} above max");
            delays.push(delay);
        }
        delays
    }

    #[test]
    fn test_next_with_fixed_seed() {
        let mut backoff = RandomBackOff::new(MIN, MAX, COUNT, 0u32).unwrap();
        assert_eq!(backoff.seed(), Seed::Fixed(0));

        assert_eq!(drain(&mut backoff).len(), COUNT);
        assert_eq!(backoff.next_delay(), None);
    }

    #[test]
    fn test_next_with_entropy_seed() {
        let mut backoff = RandomBackOff::new(MIN, MAX, COUNT, RANDOM_SEED).unwrap();
        assert_eq!(backoff.seed(), Seed::Entropy);

        assert_eq!(drain(&mut backoff).len(), COUNT);
    }

    #[test]
    fn test_zero_count_never_stops() {
        let mut backoff = RandomBackOff::new(MIN, MAX, 0, Seed::Fixed(3)).unwrap();

        for _ in 0..100_000 {
            let delay = backoff.next_delay().unwrap();
            assert!((MIN..=MAX).contains(&delay));
        }
    }

    #[test]
    fn test_reset_replays_fixed_seed() {
        let mut backoff = RandomBackOff::new(MIN, MAX, 50, Seed::Fixed(1234)).unwrap();
        let first = drain(&mut backoff);

        backoff.reset();
        assert_eq!(backoff.current(), 0);
        let second = drain(&mut backoff);

        assert_eq!(first, second);

        let mut fresh = RandomBackOff::new(MIN, MAX, 50, Seed::Fixed(1234)).unwrap();
        assert_eq!(drain(&mut fresh), first);
    }

    #[test]
    fn test_delays_vary() {
        let mut backoff = RandomBackOff::new(MIN, MAX, 100, Seed::Fixed(9)).unwrap();
        let delays = drain(&mut backoff);

        let all_same = delays.windows(2).all(|w| w[0] == w[1]);
        assert!(!all_same, "random delays should vary");
    }

    #[test]
    fn test_invalid_range() {
        let err = RandomBackOff::new(MAX, MIN, 1, Seed::Entropy).unwrap_err();
        assert_eq!(err, ConfigError::InvalidRange { min: MAX, max: MIN });

        assert!(RandomBackOff::new(MIN, MIN, 1, Seed::Entropy).is_err());
        assert!(RandomBackOff::new(MIN, MIN + Duration::from_nanos(10), 1, Seed::Entropy).is_err());
    }

    #[test]
    fn test_range_too_wide() {
        let max = Duration::from_micros(u64::from(u32::MAX) + 1);
        let err = RandomBackOff::new(Duration::ZERO, max, 1, Seed::Entropy).unwrap_err();
        assert!(matches!(err, ConfigError::RangeTooWide { .. }));

        // exactly at the limit is fine
        let max = Duration::from_micros(u64::from(u32::MAX));
        assert!(RandomBackOff::new(Duration::ZERO, max, 1, Seed::Entropy).is_ok());
    }

    #[test]
    fn test_seed_from_u32() {
        assert_eq!(Seed::from(RANDOM_SEED), Seed::Entropy);
        assert_eq!(Seed::from(0u32), Seed::Fixed(0));
        assert_eq!(Seed::from(77u32), Seed::Fixed(77));
        assert_eq!(Seed::default(), Seed::Entropy);
    }

    #[test]
    fn test_factory() {
        let factory = RandomBackOffFactory::new(MIN, MAX, 3, Seed::Fixed(5)).unwrap();
        assert_eq!(factory.count(), 3);

        let mut first = factory.create();
        let mut second = factory.create();

        let a: Vec<_> = std::iter::from_fn(|| first.next_delay()).collect();
        let b: Vec<_> = std::iter::from_fn(|| second.next_delay()).collect();

        assert_eq!(a.len(), 3);
        assert_eq!(a, b);
    }

    #[test]
    fn test_factory_rejects_invalid_range() {
        assert!(matches!(
            RandomBackOffFactory::new(MAX, MIN, 0, Seed::Entropy),
            Err(ConfigError::InvalidRange { .. })
        ));
    }
}
