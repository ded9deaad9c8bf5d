//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ServerConfig;
use crate::services::email_log::EmailLog;
use crate::services::mailer::Mailer;
use crate::services::payment::{PaymentClient, PaymentError};
use crate::services::shipping::{ShippingClient, ShippingError};

/// Error constructing the shared clients at startup.
#[derive(Debug, thiserror::Error)]
pub enum StateInitError {
    #[error("payment client: {0}")]
    Payment(#[from] PaymentError),
    #[error("mailer: {0}")]
    Mail(#[from] lettre::transport::smtp::Error),
    #[error("shipping client: {0}")]
    Shipping(#[from] ShippingError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    payments: PaymentClient,
    shipping: ShippingClient,
    mailer: Mailer,
    email_log: EmailLog,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the outbound clients fails to build from
    /// its configuration.
    pub fn new(config: ServerConfig, pool: PgPool) -> Result<Self, StateInitError> {
        let payments = PaymentClient::new(&config.payment)?;
        let shipping = ShippingClient::new(&config.shipping)?;
        let mailer = Mailer::new(&config.email)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                payments,
                shipping,
                mailer,
                email_log: EmailLog::new(),
            }),
        })
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the payment provider client.
    #[must_use]
    pub fn payments(&self) -> &PaymentClient {
        &self.inner.payments
    }

    /// Get a reference to the shipping quote client.
    #[must_use]
    pub fn shipping(&self) -> &ShippingClient {
        &self.inner.shipping
    }

    /// Get a reference to the transactional mailer.
    #[must_use]
    pub fn mailer(&self) -> &Mailer {
        &self.inner.mailer
    }

    /// Get a reference to the in-memory email delivery log.
    #[must_use]
    pub fn email_log(&self) -> &EmailLog {
        &self.inner.email_log
    }
}
