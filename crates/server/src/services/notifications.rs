//! Order email dispatch and status aggregation.
//!
//! The two order emails are independent: a failed owner notification must
//! not block the customer confirmation, and vice versa. Failures are
//! captured per message and reported in the checkout response instead of
//! failing the request. The order is already persisted and the payment
//! preference already created by the time this runs.

use chrono::Utc;
use serde::Serialize;

use luar_core::OrderId;

use crate::services::email_log::{EmailKind, EmailLog, EmailLogEntry, EmailResult};
use crate::services::mailer::{MailError, Mailer, OrderEmailContext};

/// Per-order email outcome, embedded in the checkout response.
#[derive(Debug, Clone, Serialize)]
pub struct EmailStatus {
    /// True only when both messages were delivered.
    pub success: bool,
    pub admin: bool,
    pub customer: bool,
    pub errors: Vec<String>,
}

/// Send both order emails, recording each outcome in the log.
///
/// Never returns an error; delivery failures are folded into the returned
/// [`EmailStatus`] and captured in Sentry.
pub async fn send_order_emails(
    mailer: &Mailer,
    log: &EmailLog,
    ctx: &OrderEmailContext,
    order_id: OrderId,
) -> EmailStatus {
    let admin = mailer.send_admin_notification(ctx).await;
    record(
        log,
        order_id,
        &ctx.customer_email,
        EmailKind::AdminNotification,
        mailer.notify_address(),
        &admin,
    );

    let customer = mailer.send_customer_confirmation(ctx).await;
    record(
        log,
        order_id,
        &ctx.customer_email,
        EmailKind::CustomerConfirmation,
        &ctx.customer_email,
        &customer,
    );

    aggregate_status(&admin, &customer)
}

fn record(
    log: &EmailLog,
    order_id: OrderId,
    customer_email: &str,
    kind: EmailKind,
    recipient: &str,
    outcome: &Result<String, MailError>,
) {
    let result = match outcome {
        Ok(message_id) => EmailResult::sent(kind, recipient, message_id.clone()),
        Err(e) => {
            sentry::capture_error(e);
            EmailResult::failed(kind, Some(recipient), e.to_string())
        }
    };
    log.record(EmailLogEntry {
        timestamp: Utc::now(),
        order_id,
        customer_email: customer_email.to_owned(),
        result,
    });
}

/// Fold the two send outcomes into one status.
///
/// Error strings are prefixed with which message failed so the caller can
/// tell them apart without parsing SMTP errors.
fn aggregate_status(
    admin: &Result<String, MailError>,
    customer: &Result<String, MailError>,
) -> EmailStatus {
    let mut errors = Vec::new();
    if let Err(e) = admin {
        errors.push(format!("{}: {e}", EmailKind::AdminNotification.label()));
    }
    if let Err(e) = customer {
        errors.push(format!("{}: {e}", EmailKind::CustomerConfirmation.label()));
    }

    EmailStatus {
        success: admin.is_ok() && customer.is_ok(),
        admin: admin.is_ok(),
        customer: customer.is_ok(),
        errors,
    }
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn sent() -> Result<String, MailError> {
        Ok("250 Ok".to_owned())
    }

    fn rejected() -> Result<String, MailError> {
        Err(MailError::InvalidAddress("nobody@".to_owned()))
    }

    #[test]
    fn test_aggregate_both_delivered() {
        let status = aggregate_status(&sent(), &sent());
        assert!(status.success);
        assert!(status.admin);
        assert!(status.customer);
        assert!(status.errors.is_empty());
    }

    #[test]
    fn test_aggregate_customer_failure_keeps_admin_success() {
        let status = aggregate_status(&sent(), &rejected());
        assert!(!status.success);
        assert!(status.admin);
        assert!(!status.customer);
        assert_eq!(status.errors.len(), 1);
        assert!(status.errors[0].starts_with("customer: "));
    }

    #[test]
    fn test_aggregate_both_failures_collects_two_errors() {
        let status = aggregate_status(&rejected(), &rejected());
        assert!(!status.success);
        assert!(!status.admin);
        assert!(!status.customer);
        assert_eq!(status.errors.len(), 2);
        assert!(status.errors[0].starts_with("admin: "));
        assert!(status.errors[1].starts_with("customer: "));
    }
}
