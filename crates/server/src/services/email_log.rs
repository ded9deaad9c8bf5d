//! In-memory rolling log of transactional email sends.
//!
//! Bounded to the most recent [`EMAIL_LOG_CAPACITY`] entries, oldest evicted
//! first. Per-process only: in a multi-process deployment each process keeps
//! its own log, and this is operational visibility, not a source of truth.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;

use luar_core::OrderId;

/// Maximum number of entries retained in the log.
pub const EMAIL_LOG_CAPACITY: usize = 100;

/// Which transactional email a result belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailKind {
    AdminNotification,
    CustomerConfirmation,
}

impl EmailKind {
    /// Stable string tag used in logs and the `emailStatus.errors` entries.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AdminNotification => "admin_notification",
            Self::CustomerConfirmation => "customer_confirmation",
        }
    }

    /// Short human label for error messages ("admin" / "customer").
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::AdminNotification => "admin",
            Self::CustomerConfirmation => "customer",
        }
    }
}

/// Outcome of one email send attempt.
#[derive(Debug, Clone, Serialize)]
pub struct EmailResult {
    pub success: bool,
    #[serde(rename = "type")]
    pub kind: EmailKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EmailResult {
    /// A successful send.
    #[must_use]
    pub fn sent(kind: EmailKind, recipient: &str, message_id: String) -> Self {
        Self {
            success: true,
            kind,
            message_id: Some(message_id),
            recipient: Some(recipient.to_owned()),
            error: None,
        }
    }

    /// A failed send attempt.
    #[must_use]
    pub fn failed(kind: EmailKind, recipient: Option<&str>, error: String) -> Self {
        Self {
            success: false,
            kind,
            message_id: None,
            recipient: recipient.map(str::to_owned),
            error: Some(error),
        }
    }
}

/// One recorded send attempt.
#[derive(Debug, Clone, Serialize)]
pub struct EmailLogEntry {
    pub timestamp: DateTime<Utc>,
    pub order_id: OrderId,
    pub customer_email: String,
    pub result: EmailResult,
}

/// Aggregate statistics over the retained entries.
#[derive(Debug, Clone, Serialize)]
pub struct EmailLogStats {
    pub total: usize,
    pub success: usize,
    /// Success percentage over retained entries (0.0 when empty).
    pub rate: f64,
}

/// Shared, bounded, in-memory email send log.
///
/// Cheaply cloneable; all clones share the same buffer. Appends are safe
/// under concurrent checkout requests.
#[derive(Clone, Default)]
pub struct EmailLog {
    inner: Arc<Mutex<VecDeque<EmailLogEntry>>>,
}

impl EmailLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, VecDeque<EmailLogEntry>> {
        // A poisoned lock only means another thread panicked mid-append;
        // the buffer itself is still a valid VecDeque.
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Record one send attempt, evicting the oldest entry past capacity.
    pub fn record(&self, entry: EmailLogEntry) {
        if entry.result.success {
            tracing::info!(
                kind = entry.result.kind.as_str(),
                recipient = entry.result.recipient.as_deref().unwrap_or(""),
                order_id = %entry.order_id,
                "email sent"
            );
        } else {
            tracing::error!(
                kind = entry.result.kind.as_str(),
                recipient = entry.result.recipient.as_deref().unwrap_or(""),
                order_id = %entry.order_id,
                error = entry.result.error.as_deref().unwrap_or(""),
                "email send failed"
            );
        }

        let mut entries = self.entries();
        entries.push_back(entry);
        while entries.len() > EMAIL_LOG_CAPACITY {
            entries.pop_front();
        }
    }

    /// The most recent entries, newest first.
    #[must_use]
    pub fn recent(&self, limit: usize) -> Vec<EmailLogEntry> {
        self.entries().iter().rev().take(limit).cloned().collect()
    }

    /// Success-rate statistics over the retained entries.
    #[must_use]
    pub fn stats(&self) -> EmailLogStats {
        let entries = self.entries();
        let total = entries.len();
        let success = entries.iter().filter(|e| e.result.success).count();
        #[allow(clippy::cast_precision_loss)] // bounded to EMAIL_LOG_CAPACITY
        let rate = if total > 0 {
            success as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        EmailLogStats {
            total,
            success,
            rate,
        }
    }

    /// Number of retained entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn entry(n: i32, success: bool) -> EmailLogEntry {
        EmailLogEntry {
            timestamp: Utc::now(),
            order_id: OrderId::new(n),
            customer_email: format!("cliente{n}@example.com"),
            result: if success {
                EmailResult::sent(
                    EmailKind::CustomerConfirmation,
                    "cliente@example.com",
                    "250 Ok".to_owned(),
                )
            } else {
                EmailResult::failed(
                    EmailKind::CustomerConfirmation,
                    Some("cliente@example.com"),
                    "connection refused".to_owned(),
                )
            },
        }
    }

    #[test]
    fn test_record_and_recent_order() {
        let log = EmailLog::new();
        for n in 0..3 {
            log.record(entry(n, true));
        }

        let recent = log.recent(10);
        assert_eq!(recent.len(), 3);
        // Newest first
        assert_eq!(recent[0].order_id, OrderId::new(2));
        assert_eq!(recent[2].order_id, OrderId::new(0));
    }

    #[test]
    fn test_eviction_keeps_most_recent_100() {
        let log = EmailLog::new();
        for n in 0..105 {
            log.record(entry(n, true));
        }

        assert_eq!(log.len(), EMAIL_LOG_CAPACITY);

        let all = log.recent(EMAIL_LOG_CAPACITY);
        // Oldest 5 (orders 0-4) were evicted.
        assert_eq!(all.last().map(|e| e.order_id), Some(OrderId::new(5)));
        assert_eq!(all.first().map(|e| e.order_id), Some(OrderId::new(104)));
        assert!(!all.iter().any(|e| e.order_id.as_i32() < 5));
    }

    #[test]
    fn test_stats() {
        let log = EmailLog::new();
        assert_eq!(log.stats().total, 0);
        assert!((log.stats().rate - 0.0).abs() < f64::EPSILON);

        log.record(entry(1, true));
        log.record(entry(2, true));
        log.record(entry(3, false));

        let stats = log.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.success, 2);
        assert!((stats.rate - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_concurrent_appends() {
        let log = EmailLog::new();
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let log = log.clone();
                std::thread::spawn(move || {
                    for n in 0..50 {
                        log.record(entry(t * 50 + n, true));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("writer thread panicked");
        }

        assert_eq!(log.len(), EMAIL_LOG_CAPACITY);
    }
}
