//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all application settings.
//! Configuration is loaded from a TOML file; `GPMARKET_DATABASE` overrides the
//! journal database path.
//!
//! # Example
//!
//! ```no_run
//! use gpmarket::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ledger::LedgerConfig;
use super::logging::LoggingConfig;
use super::market::MarketConfig;
use super::policy::PolicyConfig;
use super::storage::{JournalBackend, StorageConfig};
use crate::application::engine::EngineSettings;
use crate::application::wallet::MAX_PAGE_SIZE;
use crate::error::{ConfigError, Result};

/// Environment variable that replaces `storage.database`.
pub const DATABASE_ENV: &str = "GPMARKET_DATABASE";

/// Main application configuration.
///
/// Every section is optional; an empty file yields the defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Journal backend and database location.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Rounding of trade amounts and payout per winning share.
    #[serde(default)]
    pub policy: PolicyConfig,

    /// Ledger verification and paging.
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Market creation defaults.
    #[serde(default)]
    pub market: MarketConfig,
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// Applies the `GPMARKET_DATABASE` override before validating.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        Self::parse_with_database_override(content, std::env::var(DATABASE_ENV).ok())
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The TOML content is malformed
    /// - Validation fails
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Load `path` if it exists, otherwise start from the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file is unreadable or invalid.
    #[allow(clippy::result_large_err)]
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Self::parse_toml("")
        }
    }

    #[allow(clippy::result_large_err)]
    fn parse_with_database_override(content: &str, database: Option<String>) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        if let Some(database) = database.filter(|path| !path.trim().is_empty()) {
            config.storage.database = database;
        }
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first offending field.
    #[allow(clippy::result_large_err)]
    pub fn validate(&self) -> Result<()> {
        if !self.logging.is_known_format() {
            return Err(ConfigError::InvalidValue {
                field: "logging.format",
                reason: format!("unknown format '{}' (use pretty or json)", self.logging.format),
            }
            .into());
        }
        if self.storage.journal == JournalBackend::Sqlite
            && self.storage.database.trim().is_empty()
        {
            return Err(ConfigError::MissingField {
                field: "storage.database",
            }
            .into());
        }
        if self.policy.payout_per_share <= 0 {
            return Err(ConfigError::InvalidValue {
                field: "policy.payout_per_share",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.ledger.history_page_size == 0 || self.ledger.history_page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::InvalidValue {
                field: "ledger.history_page_size",
                reason: format!("must be between 1 and {MAX_PAGE_SIZE}"),
            }
            .into());
        }
        if self.market.min_liquidity <= Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: "market.min_liquidity",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.market.default_liquidity < self.market.min_liquidity {
            return Err(ConfigError::InvalidValue {
                field: "market.default_liquidity",
                reason: "must be >= min_liquidity".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Engine tunables derived from the `[ledger]` and `[market]` sections.
    #[must_use]
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            verify_on_commit: self.ledger.verify_on_commit,
            min_liquidity: self.market.min_liquidity,
            history_page_size: self.ledger.history_page_size,
        }
    }

    /// Render the effective configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    #[allow(clippy::result_large_err)]
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Other(e.to_string()).into())
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}
