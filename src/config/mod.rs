//! Application configuration module
//!
//! Type-safe configuration loading using the `config` and `dotenvy` crates.
//! Values come from an optional YAML file and from environment variables with
//! the `PREPAY_GATEWAY` prefix; nested values use `__` as separator.
//!
//! # Example
//!
//! ```ignore
//! use prepay_gateway::config::AppConfig;
//!
//! let config = AppConfig::load()?;
//! config.validate()?;
//! ```

mod admin;
mod database;
mod entitlement;
mod error;
mod ledger;
mod payment;
mod server;

pub use admin::AdminConfig;
pub use database::DatabaseConfig;
pub use entitlement::EntitlementConfig;
pub use error::{ConfigError, ValidationError};
pub use ledger::LedgerConfig;
pub use payment::PaymentConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;
use std::path::Path;

/// Environment variable naming the YAML configuration file.
pub const CONFIG_FILE_ENV: &str = "PREPAY_GATEWAY_CONFIG";

/// Used when `PREPAY_GATEWAY_CONFIG` is unset. The file is optional.
pub const DEFAULT_CONFIG_FILE: &str = "./conf/gateway.yaml";

const ENV_PREFIX: &str = "PREPAY_GATEWAY";

/// Root application configuration
///
/// Load using [`AppConfig::load()`].
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (MySQL connection)
    pub database: DatabaseConfig,

    /// Record-keeping service
    pub ledger: LedgerConfig,

    /// Payment provider merchant account
    pub payment: PaymentConfig,

    #[serde(default)]
    pub entitlement: EntitlementConfig,

    #[serde(default)]
    pub admin: AdminConfig,
}

impl AppConfig {
    /// Load configuration
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads the YAML file named by `PREPAY_GATEWAY_CONFIG` if it exists
    /// 3. Overlays environment variables with `PREPAY_GATEWAY` prefix
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `PREPAY_GATEWAY__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `PREPAY_GATEWAY__ENTITLEMENT__ELIGIBLE_ORDER_TYPES=3,4` -> list
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required values are missing or cannot be
    /// parsed into the expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let file =
            std::env::var(CONFIG_FILE_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(&file)
    }

    /// Load with an explicit YAML file path (missing file is not an error).
    pub fn load_from(file: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(file.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("entitlement.eligible_order_types")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.ledger.validate()?;
        self.payment.validate(self.is_production())?;
        self.entitlement.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
