//! Order email delivery.
//!
//! Uses SMTP via lettre for delivery with Askama HTML templates. Two
//! messages exist per order: a notification to the store owner and a
//! confirmation to the customer. Both render from the same pre-formatted
//! [`OrderEmailContext`] so templates stay free of money/date logic.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType,
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use luar_core::format_brl;

use crate::config::EmailConfig;
use crate::models::Order;
use crate::services::payment::PaymentPreference;

/// HTML template for the owner-facing new order notification.
#[derive(Template)]
#[template(path = "email/order_admin.html")]
struct AdminOrderEmailHtml<'a> {
    ctx: &'a OrderEmailContext,
}

/// HTML template for the customer order confirmation.
#[derive(Template)]
#[template(path = "email/order_customer.html")]
struct CustomerOrderEmailHtml<'a> {
    ctx: &'a OrderEmailContext,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum MailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// The shipping option the customer picked, for display in emails.
#[derive(Debug, Clone)]
pub struct ShippingSummary {
    pub method: String,
    pub service: String,
    pub delivery_time: String,
}

/// One rendered line of the order, money already formatted.
#[derive(Debug, Clone)]
pub struct EmailLineItem {
    pub name: String,
    pub size: String,
    pub quantity: i32,
    pub unit_price: String,
    pub line_total: String,
}

/// Display-ready view of an order for both email templates.
#[derive(Debug, Clone)]
pub struct OrderEmailContext {
    pub order_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_cpf: String,
    pub address_line: String,
    pub address_locality: String,
    pub cep: String,
    pub items: Vec<EmailLineItem>,
    pub shipping_cost: String,
    pub total_amount: String,
    pub init_point: String,
    pub shipping: Option<ShippingSummary>,
}

impl OrderEmailContext {
    /// Build the view-model from a persisted order and its catalog names.
    ///
    /// `item_names` must be in the same order as `order.items`; the caller
    /// resolved them during reconciliation.
    #[must_use]
    pub fn build(
        order: &Order,
        item_names: &[String],
        preference: &PaymentPreference,
        shipping: Option<ShippingSummary>,
    ) -> Self {
        let items = order
            .items
            .iter()
            .zip(item_names)
            .map(|(item, name)| EmailLineItem {
                name: name.clone(),
                size: item.size.clone(),
                quantity: item.quantity,
                unit_price: format_brl(item.unit_price),
                line_total: format_brl(item.unit_price * rust_decimal::Decimal::from(item.quantity)),
            })
            .collect();

        let address_line = order.complement.as_ref().map_or_else(
            || format!("{}, {} - {}", order.street, order.number, order.neighborhood),
            |complement| {
                format!(
                    "{}, {} ({}) - {}",
                    order.street, order.number, complement, order.neighborhood
                )
            },
        );

        Self {
            order_id: order.id.to_string(),
            customer_name: order.customer_name.clone(),
            customer_email: order.customer_email.to_string(),
            customer_cpf: order.customer_cpf.formatted(),
            address_line,
            address_locality: format!("{} - {}", order.city, order.state),
            cep: order.cep.hyphenated(),
            items,
            shipping_cost: format_brl(order.shipping_cost),
            total_amount: format_brl(order.total_amount),
            init_point: preference.init_point.clone(),
            shipping,
        }
    }
}

/// Transactional mailer for order emails.
#[derive(Clone)]
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_mailbox: String,
    notify_address: String,
}

impl Mailer {
    /// Create a new mailer from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            transport,
            from_mailbox: format!("{} <{}>", config.from_name, config.from_address),
            notify_address: config.notify_address.clone(),
        })
    }

    /// Send the new order notification to the store owner.
    ///
    /// Returns the SMTP reply code on success, for the email log.
    ///
    /// # Errors
    ///
    /// Returns error if the message fails to render, build, or send.
    pub async fn send_admin_notification(
        &self,
        ctx: &OrderEmailContext,
    ) -> Result<String, MailError> {
        let html = AdminOrderEmailHtml { ctx }.render()?;
        let subject = format!("Novo pedido #{} - {}", ctx.order_id, ctx.customer_name);
        self.send_html(&self.notify_address, &subject, &html).await
    }

    /// Send the order confirmation to the customer.
    ///
    /// Returns the SMTP reply code on success, for the email log.
    ///
    /// # Errors
    ///
    /// Returns error if the message fails to render, build, or send.
    pub async fn send_customer_confirmation(
        &self,
        ctx: &OrderEmailContext,
    ) -> Result<String, MailError> {
        let html = CustomerOrderEmailHtml { ctx }.render()?;
        let subject = format!("Pedido #{} recebido - Luar Sleepwear", ctx.order_id);
        self.send_html(&ctx.customer_email, &subject, &html).await
    }

    async fn send_html(&self, to: &str, subject: &str, html: &str) -> Result<String, MailError> {
        let email = Message::builder()
            .from(
                self.from_mailbox
                    .parse()
                    .map_err(|_| MailError::InvalidAddress(self.from_mailbox.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| MailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html.to_string())?;

        let response = self.transport.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(response.code().to_string())
    }

    /// Recipient of owner notifications.
    #[must_use]
    pub fn notify_address(&self) -> &str {
        &self.notify_address
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use luar_core::{Cep, Cpf, Email, OrderId, OrderItemId, ProductId};
    use crate::models::OrderItem;

    use super::*;

    fn sample_order(complement: Option<&str>) -> Order {
        Order {
            id: OrderId::new(42),
            customer_name: "Ana Souza".to_owned(),
            customer_email: Email::parse("ana@example.com").unwrap(),
            customer_cpf: Cpf::parse("529.982.247-25").unwrap(),
            cep: Cep::parse("88010400").unwrap(),
            street: "Rua das Gaivotas".to_owned(),
            number: "12".to_owned(),
            complement: complement.map(str::to_owned),
            neighborhood: "Centro".to_owned(),
            city: "Florianópolis".to_owned(),
            state: "SC".to_owned(),
            shipping_cost: Decimal::new(25, 0),
            total_amount: Decimal::new(18490, 2),
            created_at: Utc::now(),
            items: vec![OrderItem {
                id: OrderItemId::new(1),
                order_id: OrderId::new(42),
                product_id: ProductId::new(1),
                quantity: 1,
                size: "M".to_owned(),
                unit_price: Decimal::new(15990, 2),
            }],
        }
    }

    fn preference() -> PaymentPreference {
        PaymentPreference {
            id: "pref-1".to_owned(),
            init_point: "https://mp.example/init".to_owned(),
            sandbox_init_point: None,
        }
    }

    #[test]
    fn test_context_formats_money_and_address() {
        let ctx = OrderEmailContext::build(
            &sample_order(None),
            &["Pijama Lua Cheia".to_owned()],
            &preference(),
            None,
        );

        assert_eq!(ctx.order_id, "42");
        assert_eq!(ctx.cep, "88010-400");
        assert_eq!(ctx.customer_cpf, "529.982.247-25");
        assert_eq!(ctx.address_line, "Rua das Gaivotas, 12 - Centro");
        assert_eq!(ctx.address_locality, "Florianópolis - SC");
        assert_eq!(ctx.shipping_cost, "R$ 25,00");
        assert_eq!(ctx.total_amount, "R$ 184,90");

        let item = &ctx.items[0];
        assert_eq!(item.name, "Pijama Lua Cheia");
        assert_eq!(item.unit_price, "R$ 159,90");
        assert_eq!(item.line_total, "R$ 159,90");
    }

    #[test]
    fn test_context_includes_complement_when_present() {
        let ctx = OrderEmailContext::build(
            &sample_order(Some("Apto 301")),
            &["Pijama Lua Cheia".to_owned()],
            &preference(),
            None,
        );
        assert_eq!(ctx.address_line, "Rua das Gaivotas, 12 (Apto 301) - Centro");
    }

    #[test]
    fn test_admin_template_renders() {
        let ctx = OrderEmailContext::build(
            &sample_order(None),
            &["Pijama Lua Cheia".to_owned()],
            &preference(),
            Some(ShippingSummary {
                method: "PAC".to_owned(),
                service: "Correios".to_owned(),
                delivery_time: "5 dias úteis".to_owned(),
            }),
        );

        let html = AdminOrderEmailHtml { ctx: &ctx }.render().unwrap();
        assert!(html.contains("Ana Souza"));
        assert!(html.contains("R$ 184,90"));
        assert!(html.contains("PAC"));
    }

    #[test]
    fn test_customer_template_renders_payment_link() {
        let ctx = OrderEmailContext::build(
            &sample_order(None),
            &["Pijama Lua Cheia".to_owned()],
            &preference(),
            None,
        );

        let html = CustomerOrderEmailHtml { ctx: &ctx }.render().unwrap();
        assert!(html.contains("https://mp.example/init"));
        assert!(html.contains("Pijama Lua Cheia"));
    }
}
