//! # Shop Configuration
//!
//! Settings for the ledger binary.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     DUKAAN_DB_PATH=/var/lib/dukaan/dukaan.db                           │
//! │     DUKAAN_LOW_STOCK_THRESHOLD=3                                       │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     $DUKAAN_CONFIG, or                                                 │
//! │     ~/.config/dukaan/dukaan.toml (Linux)                               │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # dukaan.toml
//! [shop]
//! shopkeeper_name = "Ramesh"
//! honorific = "ji"
//! currency_symbol = "₹"
//!
//! [ledger]
//! low_stock_threshold = 5.0
//! top_n = 5
//!
//! [storage]
//! database_path = "/home/ramesh/dukaan.db"
//! io_timeout_secs = 10
//! max_connections = 5
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use dukaan_core::{SummaryOptions, DEFAULT_LOW_STOCK_THRESHOLD, DEFAULT_TOP_N};
use dukaan_db::DbConfig;

/// File name looked up in the platform config dir.
const CONFIG_FILE_NAME: &str = "dukaan.toml";

/// File name of the database in the platform data dir.
const DATABASE_FILE_NAME: &str = "dukaan.db";

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Could not determine a data directory for the database")]
    NoDataDir,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

/// How the shop and shopkeeper are addressed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopSettings {
    #[serde(default = "default_shopkeeper_name")]
    pub shopkeeper_name: String,

    #[serde(default)]
    pub honorific: String,

    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

fn default_shopkeeper_name() -> String {
    "भैया".to_string()
}

fn default_currency_symbol() -> String {
    "₹".to_string()
}

impl Default for ShopSettings {
    fn default() -> Self {
        ShopSettings {
            shopkeeper_name: default_shopkeeper_name(),
            honorific: String::new(),
            currency_symbol: default_currency_symbol(),
        }
    }
}

/// Summary and alert tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSettings {
    /// Items at or below this quantity are reported as low stock.
    #[serde(default = "default_low_stock_threshold")]
    pub low_stock_threshold: f64,

    /// How many entries the top-items and top-expenses lists keep.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

fn default_low_stock_threshold() -> f64 {
    DEFAULT_LOW_STOCK_THRESHOLD
}

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

impl Default for LedgerSettings {
    fn default() -> Self {
        LedgerSettings {
            low_stock_threshold: default_low_stock_threshold(),
            top_n: default_top_n(),
        }
    }
}

/// Where and how the ledger is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Database file. Defaults to the platform data dir.
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Upper bound on a single save or load (seconds).
    #[serde(default = "default_io_timeout")]
    pub io_timeout_secs: u64,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_io_timeout() -> u64 {
    10
}

fn default_max_connections() -> u32 {
    5
}

impl Default for StorageSettings {
    fn default() -> Self {
        StorageSettings {
            database_path: None,
            io_timeout_secs: default_io_timeout(),
            max_connections: default_max_connections(),
        }
    }
}

// =============================================================================
// Shop Config
// =============================================================================

/// Complete configuration for the ledger binary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShopConfig {
    #[serde(default)]
    pub shop: ShopSettings,

    #[serde(default)]
    pub ledger: LedgerSettings,

    #[serde(default)]
    pub storage: StorageSettings,
}

impl ShopConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`config_path`, `DUKAAN_CONFIG`, or the platform default)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        let path = config_path
            .or_else(|| std::env::var_os("DUKAAN_CONFIG").map(PathBuf::from))
            .or_else(Self::default_config_path);

        if let Some(path) = path {
            if path.exists() {
                info!(?path, "Loading shop config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = Self::from_toml(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Parses a TOML document. Missing sections and keys take their defaults.
    pub fn from_toml(contents: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        let threshold = self.ledger.low_stock_threshold;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "low_stock_threshold must be a finite, non-negative number, got: {}",
                threshold
            )));
        }

        if self.ledger.top_n == 0 {
            return Err(ConfigError::Invalid("top_n must be greater than 0".into()));
        }

        if self.storage.io_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "io_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.storage.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "max_connections must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(path) = var("DUKAAN_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.storage.database_path = Some(PathBuf::from(path));
        }

        if let Some(threshold) = var("DUKAAN_LOW_STOCK_THRESHOLD") {
            match threshold.parse::<f64>() {
                Ok(t) => self.ledger.low_stock_threshold = t,
                Err(_) => warn!(value = %threshold, "Ignoring unparsable low stock threshold"),
            }
        }

        if let Some(top_n) = var("DUKAAN_TOP_N") {
            match top_n.parse::<usize>() {
                Ok(n) => self.ledger.top_n = n,
                Err(_) => warn!(value = %top_n, "Ignoring unparsable top_n"),
            }
        }

        if let Some(secs) = var("DUKAAN_IO_TIMEOUT_SECS") {
            if let Ok(s) = secs.parse::<u64>() {
                debug!(secs = s, "Overriding I/O timeout from environment");
                self.storage.io_timeout_secs = s;
            }
        }

        if let Some(name) = var("DUKAAN_SHOPKEEPER_NAME") {
            self.shop.shopkeeper_name = name;
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("in", "dukaan", "dukaan")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    // =========================================================================
    // Derived Settings
    // =========================================================================

    /// Resolves the database file, creating the data dir when defaulted.
    pub fn database_path(&self) -> ConfigResult<PathBuf> {
        if let Some(path) = &self.storage.database_path {
            return Ok(path.clone());
        }

        let dirs = directories::ProjectDirs::from("in", "dukaan", "dukaan")
            .ok_or(ConfigError::NoDataDir)?;
        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;

        Ok(data_dir.join(DATABASE_FILE_NAME))
    }

    /// Database settings for `dukaan-db`.
    pub fn db_config(&self) -> ConfigResult<DbConfig> {
        Ok(DbConfig::new(self.database_path()?)
            .max_connections(self.storage.max_connections)
            .io_timeout(Duration::from_secs(self.storage.io_timeout_secs)))
    }

    /// Summary tuning for the intent handler.
    pub fn summary_options(&self) -> SummaryOptions {
        SummaryOptions {
            low_stock_threshold: self.ledger.low_stock_threshold,
            top_n: self.ledger.top_n,
        }
    }

    /// How the shopkeeper is addressed, e.g. "Ramesh ji".
    pub fn address(&self) -> String {
        let honorific = self.shop.honorific.trim();
        if honorific.is_empty() {
            self.shop.shopkeeper_name.clone()
        } else {
            format!("{} {}", self.shop.shopkeeper_name, honorific)
        }
    }

    /// Renders an amount with the configured currency symbol.
    pub fn format_currency(&self, amount: f64) -> String {
        if amount < 0.0 {
            format!("-{}{:.2}", self.shop.currency_symbol, amount.abs())
        } else {
            format!("{}{:.2}", self.shop.currency_symbol, amount)
        }
    }
}
