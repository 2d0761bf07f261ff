//! Error types for rebound
//!
//! Configuration problems are reported through [`Error`]; giving up on an
//! operation is reported through [`RetryError`], which keeps the error of the
//! last attempt so that callers can escalate it.

use std::time::Duration;
use thiserror::Error;

pub use rebound_core::ConfigError;

/// Result type alias for configuration loading.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for loading and validating resilience configuration.
#[derive(Debug, Error)]
pub enum Error {
    /// A value was rejected by validation.
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// TOML configuration could not be parsed.
    #[error("Failed to parse TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON configuration could not be parsed.
    #[error("Failed to parse JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An environment variable held a value of the wrong shape.
    #[error("Invalid value for {name}: {value}")]
    InvalidEnv {
        /// Variable name
        name: &'static str,
        /// Rejected value
        value: String,
    },

    /// The configuration file extension is neither `.toml` nor `.json`.
    #[error("Unsupported configuration format: {0}")]
    UnsupportedFormat(String),
}

/// Outcome of a retry campaign that did not succeed.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// The back-off policy stopped; `source` is the error of the last attempt.
    #[error("retry exhausted after {attempts} attempts ({elapsed:?}): {source}")]
    Exhausted {
        /// Error from the final attempt
        #[source]
        source: E,
        /// Total attempts made (initial + retries)
        attempts: u32,
        /// Time spent on the campaign
        elapsed: Duration,
    },

    /// The operation failed with an error the caller marked as permanent.
    #[error("retry aborted after {attempts} attempts: {source}")]
    Aborted {
        /// The permanent error
        #[source]
        source: E,
        /// Total attempts made
        attempts: u32,
    },
}

impl<E> RetryError<E> {
    /// Extract the error of the last attempt, discarding metadata.
    pub fn into_inner(self) -> E {
        match self {
            Self::Exhausted { source, .. } | Self::Aborted { source, .. } => source,
        }
    }

    /// Get a reference to the error of the last attempt.
    pub fn inner(&self) -> &E {
        match self {
            Self::Exhausted { source, .. } | Self::Aborted { source, .. } => source,
        }
    }

    /// Number of attempts made before giving up.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Exhausted { attempts, .. } | Self::Aborted { attempts, .. } => *attempts,
        }
    }

    /// Returns true if the back-off policy ran out.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_conversion() {
        let err: Error = ConfigError::NonPositiveDuration("initial interval").into();
        assert!(matches!(err, Error::Config(_)));
        assert_eq!(
            err.to_string(),
            "Invalid configuration: initial interval must be positive"
        );
    }

    #[test]
    fn test_retry_error_accessors() {
        let err = RetryError::Exhausted {
            source: std::io::Error::other("connection refused"),
            attempts: 4,
            elapsed: Duration::from_millis(1500),
        };

        assert!(err.is_exhausted());
        assert_eq!(err.attempts(), 4);
        assert!(err.to_string().contains("4 attempts"));
        assert!(err.to_string().contains("connection refused"));
        assert_eq!(err.into_inner().to_string(), "connection refused");
    }

    #[test]
    fn test_retry_error_source() {
        use std::error::Error as _;

        let err = RetryError::Aborted {
            source: std::io::Error::other("unauthorized"),
            attempts: 1,
        };

        assert!(!err.is_exhausted());
        assert_eq!(err.source().map(|e| e.to_string()), Some("unauthorized".to_string()));
    }
}
