//! Configuration for back-off policies and fail detectors
//!
//! Settings are plain serde records using the option names of the gateway
//! configuration (`initialInterval`, `failsThreshold`, ...). Durations are
//! written as [`Timespan`]s (`"500 ms"`, `"15 m"`) or as integer microseconds.
//! Every loader validates eagerly, so a [`ResilienceConfig`] obtained from
//! [`from_toml_str`](ResilienceConfig::from_toml_str),
//! [`from_file`](ResilienceConfig::from_file) or
//! [`from_env`](ResilienceConfig::from_env) always yields a factory.
//!
//! ```toml
//! [backoff]
//! kind = "exponential"
//! initialInterval = "500 ms"
//! maxElapsedTime = "15 m"
//!
//! [failDetector]
//! failsThreshold = 3
//! ```

use crate::error::{Error, Result};
use rebound_core::backoff::{
    BackOffFactory, ExponentialBackOffFactory, ExponentialConfig, RandomBackOffFactory, Seed,
};
use rebound_core::{ConfigError, FailDetector, Timespan};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Settings of an exponential back-off.
///
/// Defaults match [`ExponentialConfig::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExponentialSettings {
    /// Center of the first delay, at least 1 ms
    pub initial_interval: Timespan,

    /// Cap of the center interval, zero for unbounded, otherwise at least `initial_interval`
    pub max_interval: Timespan,

    /// Time budget of one retry campaign
    pub max_elapsed_time: Timespan,

    /// Jitter factor within `0..=1`
    pub randomization_factor: f64,

    /// Growth factor, must not be negative
    pub multiplier: f64,
}

impl Default for ExponentialSettings {
    fn default() -> Self {
        let config = ExponentialConfig::default();
        Self {
            initial_interval: config.initial_interval().into(),
            max_interval: config.max_interval().into(),
            max_elapsed_time: config.max_elapsed_time().into(),
            randomization_factor: config.randomization_factor(),
            multiplier: config.multiplier(),
        }
    }
}

impl ExponentialSettings {
    /// Validate the settings into an [`ExponentialConfig`].
    pub fn to_config(&self) -> rebound_core::Result<ExponentialConfig> {
        ExponentialConfig::builder()
            .initial_interval(self.initial_interval.to_duration("initial interval")?)
            .max_interval(self.max_interval.to_duration("max interval")?)
            .max_elapsed_time(self.max_elapsed_time.to_duration("max elapsed time")?)
            .randomization_factor(self.randomization_factor)
            .multiplier(self.multiplier)
            .build()
    }
}

/// Settings of a random back-off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RandomSettings {
    /// Lower bound of delays
    pub min: Timespan,

    /// Upper bound of delays, must exceed `min`
    pub max: Timespan,

    /// Number of delays before stopping, zero for unlimited
    #[serde(default)]
    pub count: i64,

    /// Deterministic seed; absent or `-1` seeds from system entropy.
    ///
    /// Values are truncated to 32 bits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
}

impl RandomSettings {
    /// The seeding rule described by [`seed`](Self::seed).
    pub fn seed_rule(&self) -> Seed {
        match self.seed {
            None => Seed::Entropy,
            Some(seed) => Seed::from(seed as u32),
        }
    }

    /// Validate the settings into a [`RandomBackOffFactory`].
    pub fn to_factory(&self) -> rebound_core::Result<RandomBackOffFactory> {
        let count = usize::try_from(self.count).map_err(|_| ConfigError::NegativeCount(self.count))?;

        RandomBackOffFactory::new(
            self.min.to_duration("min")?,
            self.max.to_duration("max")?,
            count,
            self.seed_rule(),
        )
    }
}

/// Selects and configures a back-off policy.
///
/// The variant is chosen by the `kind` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum BackOffConfig {
    /// Exponential back-off with jitter
    Exponential(ExponentialSettings),

    /// Uniformly random back-off
    Random(RandomSettings),
}

impl Default for BackOffConfig {
    fn default() -> Self {
        Self::Exponential(ExponentialSettings::default())
    }
}

impl BackOffConfig {
    /// Short name of the selected policy.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Exponential(_) => "exponential",
            Self::Random(_) => "random",
        }
    }

    /// Build the factory for the selected policy.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found in the settings.
    pub fn factory(&self) -> rebound_core::Result<Box<dyn BackOffFactory>> {
        Ok(match self {
            Self::Exponential(settings) => {
                Box::new(ExponentialBackOffFactory::new(settings.to_config()?))
            }
            Self::Random(settings) => Box::new(settings.to_factory()?),
        })
    }
}

/// Settings of a [`FailDetector`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FailDetectorConfig {
    /// Consecutive failures before the endpoint is failed, zero for never
    pub fails_threshold: i64,
}

impl FailDetectorConfig {
    /// The validated threshold.
    pub fn threshold(&self) -> rebound_core::Result<u32> {
        if self.fails_threshold < 0 {
            return Err(ConfigError::NegativeThreshold(self.fails_threshold));
        }
        Ok(u32::try_from(self.fails_threshold).unwrap_or(u32::MAX))
    }

    /// Create a fresh detector.
    pub fn detector(&self) -> rebound_core::Result<FailDetector> {
        Ok(FailDetector::new(self.threshold()?))
    }
}

/// Complete resilience configuration of one kind of connection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResilienceConfig {
    /// The back-off policy
    pub backoff: BackOffConfig,

    /// The fail detector
    pub fail_detector: FailDetectorConfig,
}

impl ResilienceConfig {
    /// Parse and validate TOML configuration.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate JSON configuration.
    pub fn from_json_str(input: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a `.toml` or `.json` file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&content)?,
            Some("json") => Self::from_json_str(&content)?,
            _ => return Err(Error::UnsupportedFormat(path.display().to_string())),
        };

        debug!(
            path = %path.display(),
            backoff = config.backoff.kind(),
            "Loaded resilience configuration"
        );

        Ok(config)
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is loaded first. Recognized
    /// variables:
    /// - `REBOUND_BACKOFF`: `exponential` (default) or `random`
    /// - `REBOUND_INITIAL_INTERVAL`, `REBOUND_MAX_INTERVAL`,
    ///   `REBOUND_MAX_ELAPSED_TIME`: timespans
    /// - `REBOUND_RANDOMIZATION_FACTOR`, `REBOUND_MULTIPLIER`: numbers
    /// - `REBOUND_MIN`, `REBOUND_MAX`: timespans (required for `random`)
    /// - `REBOUND_COUNT`, `REBOUND_SEED`: integers
    /// - `REBOUND_FAILS_THRESHOLD`: integer
    #[cfg(feature = "env")]
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let backoff = match env_var::<String>("REBOUND_BACKOFF")?.as_deref() {
            None | Some("exponential") => {
                let mut settings = ExponentialSettings::default();
                if let Some(value) = env_var("REBOUND_INITIAL_INTERVAL")? {
                    settings.initial_interval = value;
                }
                if let Some(value) = env_var("REBOUND_MAX_INTERVAL")? {
                    settings.max_interval = value;
                }
                if let Some(value) = env_var("REBOUND_MAX_ELAPSED_TIME")? {
                    settings.max_elapsed_time = value;
                }
                if let Some(value) = env_var("REBOUND_RANDOMIZATION_FACTOR")? {
                    settings.randomization_factor = value;
                }
                if let Some(value) = env_var("REBOUND_MULTIPLIER")? {
                    settings.multiplier = value;
                }
                BackOffConfig::Exponential(settings)
            }
            Some("random") => BackOffConfig::Random(RandomSettings {
                min: required_env_var("REBOUND_MIN")?,
                max: required_env_var("REBOUND_MAX")?,
                count: env_var("REBOUND_COUNT")?.unwrap_or(0),
                seed: env_var("REBOUND_SEED")?,
            }),
            Some(other) => {
                return Err(Error::InvalidEnv {
                    name: "REBOUND_BACKOFF",
                    value: other.to_string(),
                });
            }
        };

        let fail_detector = FailDetectorConfig {
            fails_threshold: env_var("REBOUND_FAILS_THRESHOLD")?.unwrap_or(0),
        };

        let config = Self {
            backoff,
            fail_detector,
        };
        config.validate()?;

        debug!(backoff = config.backoff.kind(), "Loaded resilience configuration from environment");
        Ok(config)
    }

    /// Check every setting without building anything that is kept.
    pub fn validate(&self) -> rebound_core::Result<()> {
        self.backoff.factory()?;
        self.fail_detector.threshold()?;
        Ok(())
    }

    /// Build the back-off factory.
    pub fn factory(&self) -> rebound_core::Result<Box<dyn BackOffFactory>> {
        self.backoff.factory()
    }
}

#[cfg(feature = "env")]
fn env_var<T: std::str::FromStr>(name: &'static str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::InvalidEnv { name, value }),
        Err(_) => Ok(None),
    }
}

#[cfg(feature = "env")]
fn required_env_var<T: std::str::FromStr>(name: &'static str) -> Result<T> {
    env_var(name)?.ok_or(Error::InvalidEnv {
        name,
        value: "<unset>".to_string(),
    })
}
