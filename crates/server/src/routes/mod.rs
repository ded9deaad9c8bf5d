//! HTTP route handlers for the checkout API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                     - Liveness check
//! GET  /health/ready               - Readiness check (pings the database)
//!
//! # Catalog
//! GET  /api/products               - Product listing
//! GET  /api/products/{id}          - Product detail
//!
//! # Checkout
//! POST /api/create-payment         - Validate cart, persist order, create
//!                                    payment preference, send emails
//! POST /api/webhook/mercadopago    - Payment provider notifications
//!
//! # Shipping
//! POST /api/shipping/calculate     - Quote delivery options for a cart
//! GET  /api/shipping/cep/{cep}     - Resolve a CEP to a street address
//!
//! # Operations
//! GET  /api/email-log              - Recent email send attempts and stats
//! ```

pub mod checkout;
pub mod email_log;
pub mod products;
pub mod shipping;
pub mod webhook;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the `/api` routes router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index))
        .route("/products/{id}", get(products::show))
        .route("/create-payment", post(checkout::create_payment))
        .route("/shipping/calculate", post(shipping::calculate))
        .route("/shipping/cep/{cep}", get(shipping::lookup_cep))
        .route("/webhook/mercadopago", post(webhook::mercadopago))
        .route("/email-log", get(email_log::index))
}
