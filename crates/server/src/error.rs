//! Unified error handling with Sentry integration.
//!
//! Provides a unified `ApiError` type that captures server-side errors to
//! Sentry before responding to the client. All route handlers should return
//! `Result<T, ApiError>`. Responses are JSON of the form
//! `{"error": "...", "details": ...?}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use luar_core::ProductId;

use crate::db::RepositoryError;
use crate::services::payment::PaymentError;
use crate::services::shipping::ShippingError;

/// Application-level error type for the checkout API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Payment provider operation failed.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Shipping quote or CEP lookup failed.
    #[error("Shipping error: {0}")]
    Shipping(#[from] ShippingError),

    /// Client payload failed validation; the message names the offending
    /// field and is returned verbatim.
    #[error("{0}")]
    Validation(String),

    /// One or more cart product ids do not exist in the catalog.
    #[error("Products not found: {}", format_ids(.0))]
    ProductsNotFound(Vec<ProductId>),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

fn format_ids(ids: &[ProductId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(_) | Self::Payment(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Shipping(ShippingError::CepNotFound) => StatusCode::NOT_FOUND,
            Self::Shipping(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Validation(_) | Self::ProductsNotFound(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let body = match &self {
            Self::Database(_) => json!({"error": "Internal server error"}),
            Self::Payment(e) => json!({
                "error": "Failed to create payment preference",
                "details": e.to_string(),
            }),
            Self::Shipping(ShippingError::CepNotFound) => json!({"error": "CEP not found"}),
            Self::Shipping(_) => json!({"error": "Failed to calculate shipping"}),
            _ => json!({"error": self.to_string()}),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `ApiError`.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_is_bad_request() {
        let err = ApiError::Validation("customerName is required".to_owned());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "customerName is required");
    }

    #[test]
    fn test_products_not_found_lists_every_id() {
        let err = ApiError::ProductsNotFound(vec![ProductId::new(3), ProductId::new(7)]);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Products not found: 3, 7");
    }

    #[test]
    fn test_unknown_cep_is_not_found() {
        let err = ApiError::Shipping(ShippingError::CepNotFound);
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_carrier_failures_are_server_errors() {
        let err = ApiError::Shipping(ShippingError::Carrier { status: 503 });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_repository_not_found_maps_to_404() {
        let err = ApiError::Database(RepositoryError::NotFound);
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }
}
