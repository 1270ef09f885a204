//! # Configuration
//!
//! Layered configuration: built-in defaults, then an optional TOML file,
//! then environment variables prefixed with `HERALD` and using `__` as the
//! section separator:
//!
//! ```text
//! HERALD__PUBLISHER__BEARER_TOKEN=...
//! HERALD__DISPATCHER__BURST=300
//! ```
//!
//! # Example File
//!
//! ```toml
//! [feed]
//! url = "wss://ws.bitmex.com/realtime?subscribe=instrument,liquidation"
//!
//! [publisher]
//! dry_run = true
//!
//! [[dispatcher.value_tiers]]
//! below_burst = 10
//! min_usd = 5000000.0
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "HERALD";

/// Environment variable section separator.
pub const ENV_SEPARATOR: &str = "__";

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or deserialized.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Creates an invalid value error.
    #[must_use]
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Exchange feed.
    pub feed: FeedConfig,
    /// Per-symbol aggregation.
    pub aggregator: AggregatorConfig,
    /// Rate-limited dispatch.
    pub dispatcher: DispatcherConfig,
    /// Outbound publishing.
    pub publisher: PublisherConfig,
    /// Persisted state and assets.
    pub state: StateConfig,
}

/// Exchange feed configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Realtime websocket URL, including the subscription.
    pub url: String,
    /// Pause before reconnecting after a session ends.
    pub reconnect_delay_secs: u64,
    /// Interval between keep-alive pings.
    pub ping_interval_secs: u64,
    /// A connection silent for this long is considered dead.
    pub read_timeout_secs: u64,
    /// How long a liquidation order id is remembered.
    pub dedup_horizon_secs: u64,
    /// Capacity of the valued liquidation queue.
    pub queue_capacity: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: "wss://ws.bitmex.com/realtime?subscribe=instrument,liquidation".to_string(),
            reconnect_delay_secs: 10,
            ping_interval_secs: 54,
            read_timeout_secs: 60,
            dedup_horizon_secs: 4 * 60 * 60,
            queue_capacity: 1024,
        }
    }
}

impl FeedConfig {
    /// Pause before reconnecting.
    #[must_use]
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    /// Keep-alive ping interval.
    #[must_use]
    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }

    /// Dead-connection timeout.
    #[must_use]
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    /// Order id dedup horizon.
    #[must_use]
    pub fn dedup_horizon(&self) -> Duration {
        Duration::from_secs(self.dedup_horizon_secs)
    }
}

/// Per-symbol aggregation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Cadence of the pending-flush check.
    pub flush_interval_secs: u64,
    /// Capacity of each symbol's queue.
    pub queue_capacity: usize,
    /// A symbol with no arrivals for this long is retired.
    pub idle_eviction_secs: u64,
    /// Maximum number of live symbols; the least recently used is retired
    /// beyond it.
    pub max_symbols: usize,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            flush_interval_secs: 10,
            queue_capacity: 10_000,
            idle_eviction_secs: 15 * 60,
            max_symbols: 512,
        }
    }
}

impl AggregatorConfig {
    /// Flush check cadence.
    #[must_use]
    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs)
    }

    /// Idle eviction window.
    #[must_use]
    pub fn idle_eviction(&self) -> Duration {
        Duration::from_secs(self.idle_eviction_secs)
    }
}

/// Minimum USD value required while the bucket is below a level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueTier {
    /// Applies while fewer than this many tokens are available.
    pub below_burst: u32,
    /// Minimum USD value that may still be published.
    pub min_usd: f64,
}

/// Dispatcher configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Time to replenish one publishing token.
    pub replenish_interval_secs: u64,
    /// Token bucket capacity.
    pub burst: u32,
    /// Capacity of the notification queue.
    pub queue_capacity: usize,
    /// Lag beyond which lag mode starts.
    pub lag_threshold_secs: u64,
    /// Minimum USD value published in lag mode.
    pub lag_mode_min_usd: f64,
    /// Pause after the platform reports its posting limit.
    pub posting_limit_cooldown_secs: u64,
    /// Value tiers applied as the bucket drains.
    pub value_tiers: Vec<ValueTier>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            // 300 posts per 3 hours: one every 36 seconds.
            replenish_interval_secs: 36,
            burst: 300,
            queue_capacity: 10_000,
            lag_threshold_secs: 3 * 60,
            lag_mode_min_usd: 1_000_000.0,
            posting_limit_cooldown_secs: 3 * 60,
            value_tiers: vec![
                ValueTier {
                    below_burst: 10,
                    min_usd: 5_000_000.0,
                },
                ValueTier {
                    below_burst: 50,
                    min_usd: 1_000_000.0,
                },
                ValueTier {
                    below_burst: 150,
                    min_usd: 100_000.0,
                },
            ],
        }
    }
}

impl DispatcherConfig {
    /// Token replenishment interval.
    #[must_use]
    pub fn replenish_interval(&self) -> Duration {
        Duration::from_secs(self.replenish_interval_secs)
    }

    /// Lag mode entry threshold.
    #[must_use]
    pub fn lag_threshold(&self) -> Duration {
        Duration::from_secs(self.lag_threshold_secs)
    }

    /// Posting limit cooldown.
    #[must_use]
    pub fn posting_limit_cooldown(&self) -> Duration {
        Duration::from_secs(self.posting_limit_cooldown_secs)
    }
}

/// Publisher configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublisherConfig {
    /// Log instead of posting.
    pub dry_run: bool,
    /// Posting endpoint.
    pub endpoint: String,
    /// Bearer token for the posting endpoint.
    pub bearer_token: String,
    /// Request timeout.
    pub timeout_ms: u64,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            endpoint: "https://api.twitter.com/2/tweets".to_string(),
            bearer_token: String::new(),
            timeout_ms: 10_000,
        }
    }
}

/// Persisted state and asset paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    /// High score document.
    pub high_scores_path: PathBuf,
    /// Commentary deck, one line per entry.
    pub commentary_path: PathBuf,
    /// Streak labels, one line per entry.
    pub streaks_path: PathBuf,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            high_scores_path: PathBuf::from("high_scores.json"),
            commentary_path: PathBuf::from("text/memes.txt"),
            streaks_path: PathBuf::from("text/kill_streaks.txt"),
        }
    }
}

impl AppConfig {
    /// Loads and validates configuration from an optional file and the
    /// environment.
    ///
    /// A missing file is not an error; defaults apply.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Load` if a source is malformed, or
    /// `ConfigError::Invalid` if a value is out of range.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let cfg = Self::from_sources(path)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reads the file and environment layers without validating, so
    /// command-line overrides can be applied first.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Load` if a source is malformed.
    pub fn from_sources(path: &Path) -> ConfigResult<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Parses configuration from TOML text, without the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Load` if the text is malformed, or
    /// `ConfigError::Invalid` if a value is out of range.
    pub fn from_toml(text: &str) -> ConfigResult<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(text, config::FileFormat::Toml))
            .build()?;

        let cfg: Self = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the first offending value.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.feed.url.is_empty() {
            return Err(ConfigError::invalid("feed.url must not be empty"));
        }
        if self.feed.ping_interval_secs == 0
            || self.feed.ping_interval_secs >= self.feed.read_timeout_secs
        {
            return Err(ConfigError::invalid(
                "feed.ping_interval_secs must be positive and below feed.read_timeout_secs",
            ));
        }
        if self.aggregator.flush_interval_secs == 0 {
            return Err(ConfigError::invalid(
                "aggregator.flush_interval_secs must be positive",
            ));
        }
        if self.aggregator.max_symbols == 0 {
            return Err(ConfigError::invalid("aggregator.max_symbols must be positive"));
        }
        if self.dispatcher.replenish_interval_secs == 0 || self.dispatcher.burst == 0 {
            return Err(ConfigError::invalid(
                "dispatcher.replenish_interval_secs and dispatcher.burst must be positive",
            ));
        }
        if self.feed.queue_capacity == 0
            || self.aggregator.queue_capacity == 0
            || self.dispatcher.queue_capacity == 0
        {
            return Err(ConfigError::invalid("queue capacities must be positive"));
        }
        if !self.publisher.dry_run && self.publisher.bearer_token.is_empty() {
            return Err(ConfigError::invalid(
                "publisher.bearer_token is required unless publisher.dry_run is set",
            ));
        }
        Ok(())
    }
}
