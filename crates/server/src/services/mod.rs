//! External integrations and cross-cutting services.

pub mod email_log;
pub mod mailer;
pub mod notifications;
pub mod payment;
pub mod shipping;

pub use email_log::EmailLog;
pub use mailer::{Mailer, OrderEmailContext, ShippingSummary};
pub use notifications::{EmailStatus, send_order_emails};
pub use payment::{PaymentClient, PaymentError, PreferenceRequest};
pub use shipping::{ShippingClient, ShippingError};
