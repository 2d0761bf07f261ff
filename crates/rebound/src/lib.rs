#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Retry back-off and failure detection for gateway connections.
//!
//! `rebound` builds on [`rebound_core`] and adds what a connection loop needs
//! around the bare policies:
//!
//! - [`ResilienceConfig`]: back-off and fail-detector settings loaded from
//!   TOML, JSON or environment variables, validated at load time
//! - [`RetryTracker`]: per-connection back-off plus fail detector
//! - [`Retrier`]: async retry loop sleeping on the tokio timer
//! - [`observability`]: structured `tracing` events for every attempt
//!
//! # Example
//!
//! ```rust
//! use rebound::prelude::*;
//!
//! # tokio_test::block_on(async {
//! let config = ResilienceConfig::from_toml_str(r#"
//!     [backoff]
//!     kind = "random"
//!     min = "1 ms"
//!     max = "5 ms"
//!     count = 3
//!
//!     [failDetector]
//!     failsThreshold = 2
//! "#)?;
//!
//! let retrier = Retrier::from_config(&config)?.with_label("modbus");
//! let result = retrier.run(|| async { Err::<(), _>("no response") }).await;
//!
//! let err = result.unwrap_err();
//! assert!(err.is_exhausted());
//! assert_eq!(err.attempts(), 4);
//! # Ok::<(), rebound::Error>(())
//! # }).unwrap();
//! ```
//!
//! # Feature Flags
//!
//! - `env` (default): [`ResilienceConfig::from_env`] with `.env` support
//! - `trace`: [`observability::init_tracing`] installing a `tracing-subscriber`

pub mod config;
pub mod error;
pub mod observability;
pub mod retry;
pub mod tracker;

pub use config::{
    BackOffConfig, ExponentialSettings, FailDetectorConfig, RandomSettings, ResilienceConfig,
};
pub use error::{ConfigError, Error, Result, RetryError};
pub use retry::Retrier;
pub use tracker::RetryTracker;

pub use rebound_core::backoff;
pub use rebound_core::{FailDetector, Timespan};

/// Convenient re-exports of commonly used items.
///
/// ```rust
/// use rebound::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{BackOffConfig, ResilienceConfig};
    pub use crate::error::{Error, RetryError};
    pub use crate::retry::Retrier;
    pub use crate::tracker::RetryTracker;
    pub use rebound_core::prelude::*;
}
