//! # Server Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TAVOLA_PORT=8080                                                   │
//! │     TAVOLA_APP_URL=https://order.example.com                           │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     $TAVOLA_CONFIG, or                                                 │
//! │     ~/.config/tavola/server.toml (Linux)                               │
//! │     ~/Library/Application Support/com.tavola.tavola/server.toml (macOS)│
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [server]
//! bind_addr = "0.0.0.0"
//! port = 8080
//!
//! [database]
//! path = "/var/lib/tavola/tavola.db"
//! max_connections = 5
//!
//! [ordering]
//! app_url = "https://order.example.com"
//! session_idle_timeout_secs = 7200
//!
//! [payments]
//! checkout_url = "https://pay.example.com/checkout"
//! currency = "EUR"
//! signing_secret = "whsec_..."        # or TAVOLA_PAYMENT_SECRET
//! session_ttl_secs = 3600
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tavola_db::DbConfig;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Invalid URL for {field}: {reason}")]
    InvalidUrl { field: &'static str, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

// =============================================================================
// Sections
// =============================================================================

/// Listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for HttpSettings {
    fn default() -> Self {
        HttpSettings {
            bind_addr: default_bind_addr(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file, created on first start.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("tavola.db")
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Guest ordering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderingSettings {
    /// Public base URL of the QR menu front end. Table links and payment
    /// return URLs are built from it.
    #[serde(default = "default_app_url")]
    pub app_url: String,

    /// Carts untouched for this long are discarded.
    #[serde(default = "default_session_idle_timeout")]
    pub session_idle_timeout_secs: u64,
}

fn default_app_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_session_idle_timeout() -> u64 {
    2 * 60 * 60
}

impl Default for OrderingSettings {
    fn default() -> Self {
        OrderingSettings {
            app_url: default_app_url(),
            session_idle_timeout_secs: default_session_idle_timeout(),
        }
    }
}

/// Hosted checkout settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSettings {
    /// Page the guest is redirected to for online payment.
    #[serde(default = "default_checkout_url")]
    pub checkout_url: String,

    /// ISO 4217 code passed to the checkout page.
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Shared with the provider; it signs success callbacks with it.
    #[serde(default)]
    pub signing_secret: String,

    /// Unconfirmed checkout sessions are forgotten after this long.
    #[serde(default = "default_checkout_session_ttl")]
    pub session_ttl_secs: u64,
}

fn default_checkout_url() -> String {
    "http://localhost:3000/pay".to_string()
}

fn default_currency() -> String {
    "EUR".to_string()
}

fn default_checkout_session_ttl() -> u64 {
    60 * 60
}

/// Shortest accepted payment signing secret, in bytes.
const MIN_SIGNING_SECRET_LEN: usize = 16;

impl Default for PaymentSettings {
    fn default() -> Self {
        PaymentSettings {
            checkout_url: default_checkout_url(),
            currency: default_currency(),
            signing_secret: String::new(),
            session_ttl_secs: default_checkout_session_ttl(),
        }
    }
}

// =============================================================================
// Main Server Configuration
// =============================================================================

/// Complete server configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: HttpSettings,

    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub ordering: OrderingSettings,

    #[serde(default)]
    pub payments: PaymentSettings,
}

impl ServerConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`TAVOLA_CONFIG` or the platform config dir)
    /// 3. `TAVOLA_*` environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let path = std::env::var_os("TAVOLA_CONFIG")
            .map(PathBuf::from)
            .or_else(Self::default_config_path);

        if let Some(path) = path {
            if path.exists() {
                info!(?path, "Loading server config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Applies `TAVOLA_*` overrides from `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("TAVOLA_BIND_ADDR") {
            self.server.bind_addr = addr;
        }

        if let Some(port) = lookup("TAVOLA_PORT") {
            self.server.port = parse_var("TAVOLA_PORT", &port)?;
        }

        if let Some(path) = lookup("TAVOLA_DATABASE_PATH") {
            self.database.path = PathBuf::from(path);
        }

        if let Some(max) = lookup("TAVOLA_DB_MAX_CONNECTIONS") {
            self.database.max_connections = parse_var("TAVOLA_DB_MAX_CONNECTIONS", &max)?;
        }

        if let Some(url) = lookup("TAVOLA_APP_URL") {
            debug!(url = %url, "Overriding app URL from environment");
            self.ordering.app_url = url;
        }

        if let Some(secs) = lookup("TAVOLA_SESSION_IDLE_SECS") {
            self.ordering.session_idle_timeout_secs = parse_var("TAVOLA_SESSION_IDLE_SECS", &secs)?;
        }

        if let Some(url) = lookup("TAVOLA_CHECKOUT_URL") {
            self.payments.checkout_url = url;
        }

        if let Some(currency) = lookup("TAVOLA_CURRENCY") {
            self.payments.currency = currency;
        }

        if let Some(secret) = lookup("TAVOLA_PAYMENT_SECRET") {
            self.payments.signing_secret = secret;
        }

        if let Some(secs) = lookup("TAVOLA_CHECKOUT_TTL_SECS") {
            self.payments.session_ttl_secs = parse_var("TAVOLA_CHECKOUT_TTL_SECS", &secs)?;
        }

        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidConfig("port must not be 0".into()));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidConfig(
                "max_connections must be greater than 0".into(),
            ));
        }

        if self.ordering.session_idle_timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "session_idle_timeout_secs must be greater than 0".into(),
            ));
        }

        http_url("app_url", &self.ordering.app_url)?;
        http_url("checkout_url", &self.payments.checkout_url)?;

        let currency = &self.payments.currency;
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ConfigError::InvalidValue(format!("currency '{}'", currency)));
        }

        if self.payments.signing_secret.len() < MIN_SIGNING_SECRET_LEN {
            return Err(ConfigError::InvalidConfig(format!(
                "payments.signing_secret must be at least {} bytes (TAVOLA_PAYMENT_SECRET)",
                MIN_SIGNING_SECRET_LEN
            )));
        }

        if self.payments.session_ttl_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "payments.session_ttl_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "tavola", "tavola")
            .map(|dirs| dirs.config_dir().join("server.toml"))
    }

    /// Returns the full bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.bind_addr, self.server.port)
    }

    /// Public app URL without a trailing slash.
    pub fn app_url(&self) -> &str {
        self.ordering.app_url.trim_end_matches('/')
    }

    pub fn session_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.ordering.session_idle_timeout_secs)
    }

    pub fn checkout_session_ttl(&self) -> Duration {
        Duration::from_secs(self.payments.session_ttl_secs)
    }

    /// Database pool settings.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database.path.clone()).max_connections(self.database.max_connections)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(key.to_string()))
}

/// Parses an absolute http(s) URL.
pub(crate) fn http_url(field: &'static str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::InvalidUrl {
        field,
        reason: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl {
            field,
            reason: format!("expected http or https, got {}", url.scheme()),
        });
    }

    Ok(url)
}
