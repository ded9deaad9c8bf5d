//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `LUAR_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//! - `FRONTEND_URL` - Public URL of the storefront (payment back urls, CORS)
//! - `BACKEND_URL` - Public URL of this API (webhook + image links)
//! - `MERCADO_PAGO_ACCESS_TOKEN` - Payment provider access token
//! - `SMTP_HOST` / `SMTP_USER` / `SMTP_PASS` - Mail transport
//! - `NOTIFY_EMAIL` - Store owner address for admin notifications
//!
//! ## Optional
//! - `LUAR_HOST` - Bind address (default: 127.0.0.1)
//! - `LUAR_PORT` - Listen port (default: 4001)
//! - `SMTP_PORT` - SMTP port (default: 587)
//! - `FROM_EMAIL` - Sender address (default: `SMTP_USER`)
//! - `FROM_NAME` - Sender display name (default: "Luar Sleepwear")
//! - `MELHOR_ENVIO_TOKEN` - Carrier API token; without it the zone-table
//!   fallback is used for every quote
//! - `STORE_CEP` - Origin CEP for quotes (default: 01310-100)
//! - `SENTRY_DSN` / `SENTRY_ENVIRONMENT` - Error tracking

use std::net::{IpAddr, SocketAddr};

use luar_core::{Cep, CepError};
use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public storefront URL (payment back urls, CORS origin)
    pub frontend_url: String,
    /// Public URL of this API (webhook notification url, image links)
    pub backend_url: String,
    /// Payment provider configuration
    pub payment: PaymentConfig,
    /// Mail transport configuration
    pub email: EmailConfig,
    /// Shipping quote configuration
    pub shipping: ShippingConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
}

/// Mercado Pago configuration.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct PaymentConfig {
    /// Access token for the preferences API
    pub access_token: SecretString,
}

impl std::fmt::Debug for PaymentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentConfig")
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

/// SMTP mail transport configuration.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct EmailConfig {
    /// SMTP server hostname
    pub smtp_host: String,
    /// SMTP server port
    pub smtp_port: u16,
    /// SMTP authentication username
    pub smtp_username: String,
    /// SMTP authentication password
    pub smtp_password: SecretString,
    /// Email sender address (From header)
    pub from_address: String,
    /// Email sender display name
    pub from_name: String,
    /// Store owner address for admin order notifications
    pub notify_address: String,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .field("from_name", &self.from_name)
            .field("notify_address", &self.notify_address)
            .finish()
    }
}

/// Shipping quote configuration.
///
/// Implements `Debug` manually to redact the carrier token.
#[derive(Clone)]
pub struct ShippingConfig {
    /// Melhor Envio API token; `None` disables carrier quotes entirely
    pub melhor_envio_token: Option<SecretString>,
    /// Origin CEP for shipment calculations
    pub store_cep: Cep,
}

impl std::fmt::Debug for ShippingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShippingConfig")
            .field(
                "melhor_envio_token",
                &self.melhor_envio_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("store_cep", &self.store_cep)
            .finish()
    }
}

impl ServerConfig {
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

        let database_url = get_database_url("LUAR_DATABASE_URL")?;
        let host = get_env_or_default("LUAR_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("LUAR_HOST".to_owned(), e.to_string()))?;
        let port = get_env_or_default("LUAR_PORT", "4001")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("LUAR_PORT".to_owned(), e.to_string()))?;
        let frontend_url = get_required_env("FRONTEND_URL")?;
        let backend_url = get_required_env("BACKEND_URL")?;

        let payment = PaymentConfig {
            access_token: get_required_secret("MERCADO_PAGO_ACCESS_TOKEN")?,
        };
        let email = EmailConfig::from_env()?;
        let shipping = ShippingConfig::from_env()?;

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");

        Ok(Self {
            database_url,
            host,
            port,
            frontend_url,
            backend_url,
            payment,
            email,
            shipping,
            sentry_dsn,
            sentry_environment,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl EmailConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let smtp_username = get_required_env("SMTP_USER")?;
        let from_address =
            get_optional_env("FROM_EMAIL").unwrap_or_else(|| smtp_username.clone());

        Ok(Self {
            smtp_host: get_required_env("SMTP_HOST")?,
            smtp_port: get_env_or_default("SMTP_PORT", "587")
                .parse::<u16>()
                .map_err(|e| ConfigError::InvalidEnvVar("SMTP_PORT".to_owned(), e.to_string()))?,
            smtp_username,
            smtp_password: get_required_secret("SMTP_PASS")?,
            from_address,
            from_name: get_env_or_default("FROM_NAME", "Luar Sleepwear"),
            notify_address: get_required_env("NOTIFY_EMAIL")?,
        })
    }
}

impl ShippingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let store_cep = Cep::parse(&get_env_or_default("STORE_CEP", "01310-100"))
            .map_err(|e: CepError| {
                ConfigError::InvalidEnvVar("STORE_CEP".to_owned(), e.to_string())
            })?;

        Ok(Self {
            melhor_envio_token: get_optional_env("MELHOR_ENVIO_TOKEN").map(SecretString::from),
            store_cep,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_owned()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_owned()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_addr() {
        let config = ServerConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 4001,
            frontend_url: "http://localhost:5173".to_owned(),
            backend_url: "http://localhost:4001".to_owned(),
            payment: PaymentConfig {
                access_token: SecretString::from("APP_USR-test-token"),
            },
            email: EmailConfig {
                smtp_host: "smtp.example.com".to_owned(),
                smtp_port: 587,
                smtp_username: "loja@example.com".to_owned(),
                smtp_password: SecretString::from("senha-super-secreta"),
                from_address: "loja@example.com".to_owned(),
                from_name: "Luar Sleepwear".to_owned(),
                notify_address: "dona@example.com".to_owned(),
            },
            shipping: ShippingConfig {
                melhor_envio_token: None,
                store_cep: Cep::parse("01310-100").unwrap(),
            },
            sentry_dsn: None,
            sentry_environment: None,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 4001);
    }

    #[test]
    fn test_email_config_debug_redacts_password() {
        let config = EmailConfig {
            smtp_host: "smtp.example.com".to_owned(),
            smtp_port: 587,
            smtp_username: "loja@example.com".to_owned(),
            smtp_password: SecretString::from("senha-super-secreta"),
            from_address: "loja@example.com".to_owned(),
            from_name: "Luar Sleepwear".to_owned(),
            notify_address: "dona@example.com".to_owned(),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("smtp.example.com"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("senha-super-secreta"));
    }

    #[test]
    fn test_payment_config_debug_redacts_token() {
        let config = PaymentConfig {
            access_token: SecretString::from("APP_USR-live-token"),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("APP_USR-live-token"));
    }
}
