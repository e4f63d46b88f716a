//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtConfig,
    /// Fee schedule configuration.
    #[serde(default)]
    pub fees: FeesConfig,
    /// Notification delivery configuration.
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Access token expiration in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
}

fn default_access_token_expiry() -> u64 {
    900 // 15 minutes
}

/// Fee schedule configuration.
///
/// The fee schedule itself is owned by an external pricing system; this
/// section is the snapshot the engine runs with. Rates are integer basis
/// points so no float ever enters fee arithmetic.
#[derive(Debug, Clone, Deserialize)]
pub struct FeesConfig {
    /// Flat fee charged per withdrawal, in minor currency units.
    #[serde(default = "default_withdrawal_flat_fee")]
    pub withdrawal_flat_fee: i64,
    /// Anticipation fee rate in basis points (1000 = 10.00%).
    #[serde(default = "default_anticipation_fee_bps")]
    pub anticipation_fee_bps: u32,
}

fn default_withdrawal_flat_fee() -> i64 {
    390 // R$ 3,90
}

fn default_anticipation_fee_bps() -> u32 {
    1000 // 10.00%
}

impl Default for FeesConfig {
    fn default() -> Self {
        Self {
            withdrawal_flat_fee: default_withdrawal_flat_fee(),
            anticipation_fee_bps: default_anticipation_fee_bps(),
        }
    }
}

/// Notification delivery configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationsConfig {
    /// Webhook endpoint for lifecycle events; `None` logs events instead.
    #[serde(default)]
    pub webhook_url: Option<String>,
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("SALDO").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
