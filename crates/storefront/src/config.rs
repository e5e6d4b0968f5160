//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `STOREFRONT_GATEWAY_SECRET` - Shared secret the auth gateway sends on `/auth/*` calls
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `CART_SYNC_DEBOUNCE_MS` - Delay before a cart change is written remotely (default: 250)
//! - `CART_SESSION_IDLE_SECS` - Idle time before a cart session is evicted (default: 7 days)
//! - `CART_SESSION_CAPACITY` - Maximum live cart sessions (default: 10000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_DEBOUNCE_MS: u64 = 250;
const MAX_DEBOUNCE_MS: u64 = 10_000;
const DEFAULT_SESSION_IDLE_SECS: u64 = 7 * 24 * 60 * 60;
const DEFAULT_SESSION_CAPACITY: u64 = 10_000;
const MIN_GATEWAY_SECRET_LEN: usize = 32;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: Url,
    /// Shared secret expected from the auth gateway
    pub gateway_secret: SecretString,
    /// Cart sync tuning
    pub cart: CartConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. `production`, `staging`)
    pub sentry_environment: Option<String>,
}

/// Cart session tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartConfig {
    /// Quiet period after the last change before the remote write fires.
    pub debounce: Duration,
    /// Idle time after which a browser's cart session is dropped from memory.
    pub session_idle: Duration,
    /// Maximum number of cart sessions held in memory.
    pub session_capacity: u64,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            session_idle: Duration::from_secs(DEFAULT_SESSION_IDLE_SECS),
            session_capacity: DEFAULT_SESSION_CAPACITY,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
        let host = parse_env_or_default::<IpAddr>("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env_or_default::<u16>("STOREFRONT_PORT", "3000")?;
        let base_url = parse_base_url(&get_required_env("STOREFRONT_BASE_URL")?)?;
        let gateway_secret = parse_gateway_secret(get_required_env("STOREFRONT_GATEWAY_SECRET")?)?;
        let cart = CartConfig::from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            gateway_secret,
            cart,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether session cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.base_url.scheme() == "https"
    }
}

impl CartConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let debounce_ms = parse_env_or_default::<u64>(
            "CART_SYNC_DEBOUNCE_MS",
            &DEFAULT_DEBOUNCE_MS.to_string(),
        )?;
        let debounce = validate_debounce(debounce_ms)?;

        let idle_secs = parse_env_or_default::<u64>(
            "CART_SESSION_IDLE_SECS",
            &DEFAULT_SESSION_IDLE_SECS.to_string(),
        )?;
        let session_capacity = parse_env_or_default::<u64>(
            "CART_SESSION_CAPACITY",
            &DEFAULT_SESSION_CAPACITY.to_string(),
        )?;
        if session_capacity == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "CART_SESSION_CAPACITY".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            debounce,
            session_idle: Duration::from_secs(idle_secs),
            session_capacity,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse the public base URL. Only `http` and `https` are accepted.
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidEnvVar("STOREFRONT_BASE_URL".to_string(), e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidEnvVar(
            "STOREFRONT_BASE_URL".to_string(),
            format!("unsupported scheme '{other}'"),
        )),
    }
}

/// The gateway secret must be long enough that guessing it is impractical.
fn parse_gateway_secret(raw: String) -> Result<SecretString, ConfigError> {
    if raw.len() < MIN_GATEWAY_SECRET_LEN {
        return Err(ConfigError::InvalidEnvVar(
            "STOREFRONT_GATEWAY_SECRET".to_string(),
            format!("must be at least {MIN_GATEWAY_SECRET_LEN} characters"),
        ));
    }
    Ok(SecretString::from(raw))
}

/// Debounce must be at least 1ms and at most 10s.
fn validate_debounce(ms: u64) -> Result<Duration, ConfigError> {
    if ms == 0 || ms > MAX_DEBOUNCE_MS {
        return Err(ConfigError::InvalidEnvVar(
            "CART_SYNC_DEBOUNCE_MS".to_string(),
            format!("must be between 1 and {MAX_DEBOUNCE_MS} (got {ms})"),
        ));
    }
    Ok(Duration::from_millis(ms))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_config(base_url: &str) -> StorefrontConfig {
        StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: Url::parse(base_url).unwrap(),
            gateway_secret: SecretString::from("g".repeat(32)),
            cart: CartConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    #[test]
    fn test_socket_addr() {
        let addr = test_config("http://localhost:3000").socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_secure_cookies_follow_scheme() {
        assert!(!test_config("http://localhost:3000").secure_cookies());
        assert!(test_config("https://stride.shop").secure_cookies());
    }

    #[test]
    fn test_cart_config_defaults() {
        let cart = CartConfig::default();
        assert_eq!(cart.debounce, Duration::from_millis(250));
        assert_eq!(cart.session_idle, Duration::from_secs(604_800));
        assert_eq!(cart.session_capacity, 10_000);
    }

    #[test]
    fn test_validate_debounce_bounds() {
        assert!(validate_debounce(0).is_err());
        assert_eq!(validate_debounce(1).unwrap(), Duration::from_millis(1));
        assert_eq!(validate_debounce(10_000).unwrap(), Duration::from_secs(10));
        assert!(matches!(
            validate_debounce(10_001),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
    }

    #[test]
    fn test_parse_base_url() {
        assert!(parse_base_url("https://stride.shop").is_ok());
        assert!(parse_base_url("not a url").is_err());
        assert!(parse_base_url("ftp://stride.shop").is_err());
    }

    #[test]
    fn test_parse_gateway_secret_min_length() {
        assert!(parse_gateway_secret("short".to_string()).is_err());
        assert!(parse_gateway_secret("s".repeat(32)).is_ok());
    }

    #[test]
    fn test_secrets_debug_is_redacted() {
        let config = test_config("http://localhost:3000");
        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains("postgres://localhost/test"));
        assert!(!debug_output.contains(&"g".repeat(32)));
    }
}
