//! Configuration management for the stock ledger service
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with LEDGER_ prefix (`LEDGER__AUTH__JWT_SECRET`)

use config::{builder::DefaultState, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Token and password hashing configuration
    #[serde(default)]
    pub auth: AuthConfig,

    /// Account created on first start
    #[serde(default)]
    pub admin: AdminConfig,

    /// Low-stock notification delivery
    #[serde(default)]
    pub notification: NotificationConfig,

    /// Ledger defaults
    #[serde(default)]
    pub inventory: InventoryConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

/// Which `LedgerStore` implementation backs the service
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub backend: StorageBackend,

    /// PostgreSQL connection URL
    #[serde(default)]
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Apply embedded migrations at startup
    pub run_migrations: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// Secret key for signing JWT tokens; required, checked by `validate`
    #[serde(default)]
    pub jwt_secret: String,

    /// Access token expiration in seconds
    pub token_expiry_secs: i64,

    /// bcrypt work factor
    pub bcrypt_cost: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AdminConfig {
    pub username: String,

    /// Generated and logged once when absent
    pub password: Option<String>,

    pub email: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotificationConfig {
    /// Mail relay webhook; alerts are only logged when unset
    pub relay_url: Option<String>,

    pub recipient: Option<String>,

    pub sender: String,

    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InventoryConfig {
    /// Threshold used when a product is created without one
    pub default_min_stock: i64,

    /// Location that receives initial stock and edit adjustments
    pub receiving_location: String,

    /// Seed sample products, locations and movements into an empty store
    pub seed_demo_data: bool,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("LEDGER_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = Self::defaults(&environment)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (LEDGER_ prefix)
            .add_source(
                Environment::with_prefix("LEDGER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Default values, the bottom configuration layer
    fn defaults(environment: &str) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        config::Config::builder()
            .set_default("environment", environment)?
            .set_default("server.port", 5000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.backend", "postgres")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.run_migrations", true)?
            .set_default("auth.token_expiry_secs", 3600)?
            .set_default("auth.bcrypt_cost", i64::from(bcrypt::DEFAULT_COST))?
            .set_default("admin.username", "admin")?
            .set_default("notification.sender", "inventory@localhost")?
            .set_default("notification.timeout_secs", 10)?
            .set_default("inventory.default_min_stock", shared::DEFAULT_MIN_STOCK)?
            .set_default("inventory.receiving_location", "WH001")?
            .set_default("inventory.seed_demo_data", false)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(ConfigError::Message(
                "auth.jwt_secret must be set (LEDGER__AUTH__JWT_SECRET)".to_string(),
            ));
        }
        if self.database.backend == StorageBackend::Postgres && self.database.url.is_empty() {
            return Err(ConfigError::Message(
                "database.url must be set for the postgres backend (LEDGER__DATABASE__URL)"
                    .to_string(),
            ));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            host: "0.0.0.0".to_string(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            url: String::new(),
            max_connections: 10,
            min_connections: 2,
            run_migrations: true,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_expiry_secs: 3600,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: None,
            email: None,
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            relay_url: None,
            recipient: None,
            sender: "inventory@localhost".to_string(),
            timeout_secs: 10,
        }
    }
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            default_min_stock: shared::DEFAULT_MIN_STOCK,
            receiving_location: "WH001".to_string(),
            seed_demo_data: false,
        }
    }
}
