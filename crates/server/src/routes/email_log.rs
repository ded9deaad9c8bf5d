//! Email delivery log handler.

use axum::{Json, extract::State};
use serde::Serialize;

use crate::services::email_log::{EmailLogEntry, EmailLogStats};
use crate::state::AppState;

/// Number of entries returned per request.
const PAGE_SIZE: usize = 50;

/// `GET /api/email-log` response body.
#[derive(Debug, Serialize)]
pub struct EmailLogResponse {
    pub entries: Vec<EmailLogEntry>,
    pub stats: EmailLogStats,
}

/// `GET /api/email-log` - recent send attempts, newest first, plus
/// aggregate success stats.
pub async fn index(State(state): State<AppState>) -> Json<EmailLogResponse> {
    let log = state.email_log();
    Json(EmailLogResponse {
        entries: log.recent(PAGE_SIZE),
        stats: log.stats(),
    })
}
