//! Engine configuration.
//!
//! Values are read from the environment by [`EngineConfig::from_env`]:
//! - `TASKLANE_STORE_TIMEOUT_MS` - Optional. Deadline for each store call.
//!   Unset means no deadline.
//! - `TASKLANE_PUBLISH_TIMEOUT_MS` - Optional. Deadline for each status
//!   publish. Defaults to `5000`; `0` disables the deadline.
//! - `TASKLANE_DEFAULT_PAGE_LIMIT` - Optional. Page size used when a listing
//!   does not ask for one. Defaults to `10`.
//! - `TASKLANE_MAX_PAGE_LIMIT` - Optional. Largest accepted page size.
//!   Defaults to `100`.
//! - `TASKLANE_QUEUE_CAPACITY` - Optional. Buffer size of the channel
//!   notifier. Defaults to `1024`.
//! - `DATABASE_URL` - Optional. `PostgreSQL` connection URL.
//! - `TASKLANE_DB_POOL_SIZE` - Optional. Connection pool size. Defaults to
//!   `10`.

use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while loading configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed.
    #[error("invalid value for {name}: {value}")]
    InvalidValue {
        /// Variable name.
        name: &'static str,
        /// Raw value found in the environment.
        value: String,
    },

    /// The default page size exceeds the page size cap.
    #[error("default page limit {default} exceeds maximum page limit {max}")]
    PageLimitOutOfRange {
        /// Configured default page size.
        default: u32,
        /// Configured page size cap.
        max: u32,
    },
}

/// Runtime settings for the task engine and its adapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Deadline for each store call.
    pub store_timeout: Option<Duration>,
    /// Deadline for each status publish.
    pub publish_timeout: Option<Duration>,
    /// Page size used when a listing does not ask for one.
    pub default_page_limit: u32,
    /// Largest accepted page size.
    pub max_page_limit: u32,
    /// Buffer size of the channel notifier.
    pub queue_capacity: usize,
    /// `PostgreSQL` connection URL.
    pub database_url: Option<String>,
    /// Connection pool size.
    pub db_pool_size: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            store_timeout: None,
            publish_timeout: Some(Duration::from_millis(5_000)),
            default_page_limit: 10,
            max_page_limit: 100,
            queue_capacity: 1_024,
            database_url: None,
            db_pool_size: 10,
        }
    }
}

impl EngineConfig {
    /// Loads configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable is present but malformed or
    /// the page limits are inconsistent.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through a variable lookup function.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable is present but malformed or
    /// the page limits are inconsistent.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let store_timeout = match parse::<u64>(&lookup, "TASKLANE_STORE_TIMEOUT_MS")? {
            Some(millis) => non_zero_millis(millis),
            None => defaults.store_timeout,
        };
        let publish_timeout = match parse::<u64>(&lookup, "TASKLANE_PUBLISH_TIMEOUT_MS")? {
            Some(millis) => non_zero_millis(millis),
            None => defaults.publish_timeout,
        };
        let default_page_limit = parse(&lookup, "TASKLANE_DEFAULT_PAGE_LIMIT")?
            .unwrap_or(defaults.default_page_limit);
        let max_page_limit =
            parse(&lookup, "TASKLANE_MAX_PAGE_LIMIT")?.unwrap_or(defaults.max_page_limit);
        let queue_capacity =
            parse(&lookup, "TASKLANE_QUEUE_CAPACITY")?.unwrap_or(defaults.queue_capacity);
        let db_pool_size =
            parse(&lookup, "TASKLANE_DB_POOL_SIZE")?.unwrap_or(defaults.db_pool_size);
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let config = Self {
            store_timeout,
            publish_timeout,
            default_page_limit,
            max_page_limit,
            queue_capacity,
            database_url,
            db_pool_size,
        };
        config.validate()?;
        Ok(config)
    }

    /// Sets the store call deadline.
    #[must_use]
    pub const fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = Some(timeout);
        self
    }

    /// Sets the publish deadline.
    #[must_use]
    pub const fn with_publish_timeout(mut self, timeout: Duration) -> Self {
        self.publish_timeout = Some(timeout);
        self
    }

    /// Sets the default and maximum page sizes.
    #[must_use]
    pub const fn with_page_limits(mut self, default: u32, max: u32) -> Self {
        self.default_page_limit = default;
        self.max_page_limit = max;
        self
    }

    /// Checks that the settings are mutually consistent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::PageLimitOutOfRange`] when the default page
    /// size is zero or above the cap.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.default_page_limit == 0 || self.default_page_limit > self.max_page_limit {
            return Err(ConfigError::PageLimitOutOfRange {
                default: self.default_page_limit,
                max: self.max_page_limit,
            });
        }
        Ok(())
    }
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    lookup(name)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|_| ConfigError::InvalidValue { name, value: raw })
        })
        .transpose()
}

const fn non_zero_millis(millis: u64) -> Option<Duration> {
    if millis == 0 {
        None
    } else {
        Some(Duration::from_millis(millis))
    }
}
