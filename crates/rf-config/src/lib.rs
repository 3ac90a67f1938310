//! # rf-config
//!
//! Layered runtime configuration for the feed.
//!
//! Sources, lowest priority first:
//! 1. built-in defaults (the values the feed was tuned with),
//! 2. `rusty-feed.toml` in the working directory, or the file named by
//!    `RUSTY_FEED_CONFIG` (which then must exist),
//! 3. `RUSTY_FEED__<SECTION>__<KEY>` environment variables, after `.env`
//!    has been loaded.
//!
//! ```text
//! RUSTY_FEED__SIMULATOR__MIN_DELAY_MS=1000
//! RUSTY_FEED__LOCALE=ko
//! ```

use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use rf_core::locale::Locale;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

pub const CONFIG_PATH_ENV: &str = "RUSTY_FEED_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "rusty-feed.toml";
const ENV_PREFIX: &str = "RUSTY_FEED";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Artificial delays of the in-memory backend.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LatencyConfig {
    pub fetch_ms: u64,
    pub toggle_ms: u64,
    pub create_ms: u64,
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self { fetch_ms: 2000, toggle_ms: 300, create_ms: 500 }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub ttl_ms: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self { ttl_ms: 5000 }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulatorSettings {
    pub enabled: bool,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    pub image_probability: f64,
}

impl Default for SimulatorSettings {
    fn default() -> Self {
        Self { enabled: true, min_delay_ms: 20_000, max_delay_ms: 40_000, image_probability: 0.4 }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PagingConfig {
    pub page_size: usize,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self { page_size: 10 }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub latency: LatencyConfig,
    pub notifications: NotificationConfig,
    pub simulator: SimulatorSettings,
    pub feed: PagingConfig,
    pub locale: Locale,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            latency: LatencyConfig::default(),
            notifications: NotificationConfig::default(),
            simulator: SimulatorSettings::default(),
            feed: PagingConfig::default(),
            locale: Locale::default(),
            log_filter: "info".to_string(),
        }
    }
}

impl FeedConfig {
    /// Loads `.env`, then every source in priority order.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), ".env loaded");
        }
        let explicit = std::env::var_os(CONFIG_PATH_ENV);
        Self::load_from(explicit.as_deref().map(Path::new), Environment::with_prefix(ENV_PREFIX))
    }

    /// Loads from an optional explicit file and the given environment
    /// source. Without an explicit file, `rusty-feed.toml` is read if present.
    pub fn load_from(file: Option<&Path>, env: Environment) -> Result<Self, ConfigError> {
        let file_source = match file {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config: FeedConfig = Config::builder()
            .add_source(file_source)
            .add_source(env.prefix_separator("__").separator("__").try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let sim = &self.simulator;
        if sim.min_delay_ms >= sim.max_delay_ms {
            return Err(ConfigError::Invalid(format!(
                "simulator.min_delay_ms ({}) must be below simulator.max_delay_ms ({})",
                sim.min_delay_ms, sim.max_delay_ms
            )));
        }
        if !(0.0..=1.0).contains(&sim.image_probability) {
            return Err(ConfigError::Invalid(format!(
                "simulator.image_probability must be within [0, 1], got {}",
                sim.image_probability
            )));
        }
        if self.feed.page_size == 0 {
            return Err(ConfigError::Invalid("feed.page_size must be positive".to_string()));
        }
        if self.notifications.ttl_ms == 0 {
            return Err(ConfigError::Invalid("notifications.ttl_ms must be positive".to_string()));
        }
        Ok(())
    }

    pub fn notification_ttl(&self) -> Duration {
        Duration::from_millis(self.notifications.ttl_ms)
    }

    /// Bounds of the simulator's delay window.
    pub fn simulator_delays(&self) -> (Duration, Duration) {
        (
            Duration::from_millis(self.simulator.min_delay_ms),
            Duration::from_millis(self.simulator.max_delay_ms),
        )
    }

    pub fn fetch_latency(&self) -> Duration {
        Duration::from_millis(self.latency.fetch_ms)
    }

    pub fn toggle_latency(&self) -> Duration {
        Duration::from_millis(self.latency.toggle_ms)
    }

    pub fn create_latency(&self) -> Duration {
        Duration::from_millis(self.latency.create_ms)
    }
}
