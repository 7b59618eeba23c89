//! API server configuration.
//!
//! Layered with the `config` crate, later sources win:
//!
//! ```text
//! built-in defaults ──► stockroom.toml (optional) ──► environment variables
//! ```
//!
//! Environment keys: `HOST`, `PORT`, `DATABASE_URL`, `LOW_STOCK_THRESHOLD`,
//! `DB_MAX_CONNECTIONS`.

use std::net::SocketAddr;

use config::{Config, Environment, File};
use serde::Deserialize;

use stockroom_core::DEFAULT_LOW_STOCK_THRESHOLD;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DATABASE_URL: &str = "sqlite://stockroom.db";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

/// API server configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApiConfig {
    /// Interface to bind
    pub host: String,

    /// HTTP port
    pub port: u16,

    /// SQLite connection URL
    pub database_url: String,

    /// Default `?threshold=` for low-stock queries and notifications
    pub low_stock_threshold: i64,

    /// Connection pool size
    pub db_max_connections: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from `stockroom.toml` and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_env(Environment::default())
    }

    /// Loads configuration with an explicit environment source.
    pub fn from_env(env: Environment) -> Result<Self, ConfigError> {
        let defaults = ApiConfig::default();

        let config: ApiConfig = Config::builder()
            .set_default("host", defaults.host)?
            .set_default("port", defaults.port as i64)?
            .set_default("database_url", defaults.database_url)?
            .set_default("low_stock_threshold", defaults.low_stock_threshold)?
            .set_default("db_max_connections", defaults.db_max_connections as i64)?
            .add_source(File::with_name("stockroom").required(false))
            .add_source(env)
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidValue {
                key: "PORT",
                reason: "must be between 1 and 65535".to_string(),
            });
        }

        if self.database_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "DATABASE_URL",
                reason: "must not be empty".to_string(),
            });
        }

        if self.low_stock_threshold < 0 {
            return Err(ConfigError::InvalidValue {
                key: "LOW_STOCK_THRESHOLD",
                reason: "must not be negative".to_string(),
            });
        }

        if self.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                key: "DB_MAX_CONNECTIONS",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    /// Socket address to bind.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                key: "HOST",
                reason: format!("'{}' is not an IP address", self.host),
            })
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}
