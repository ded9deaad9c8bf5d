//! Payment provider webhook handler.

use axum::body::Bytes;
use axum::extract::RawQuery;
use axum::http::StatusCode;
use serde_json::Value;

/// `POST /api/webhook/mercadopago` - payment notification sink.
///
/// Always answers 200 regardless of payload; the provider retries
/// aggressively on anything else, and its IPN-style callbacks carry only
/// query parameters with an empty body. Payment state is confirmed
/// out-of-band, so for now the notification is only logged.
pub async fn mercadopago(RawQuery(query): RawQuery, body: Bytes) -> StatusCode {
    let payload: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let notification_type = payload
        .get("type")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown");

    tracing::info!(
        notification_type,
        query = query.as_deref().unwrap_or(""),
        payload = %payload,
        "Payment webhook received"
    );
    StatusCode::OK
}
