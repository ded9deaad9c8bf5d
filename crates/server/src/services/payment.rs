//! Mercado Pago checkout preference client.
//!
//! Creates the provider-side record of a purchase intent and returns the
//! redirect URL the customer uses to pay.
//!
//! # API Reference
//!
//! - Base URL: `https://api.mercadopago.com`
//! - Authentication: `Authorization: Bearer <access token>`
//! - Endpoint: `POST /checkout/preferences`

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use luar_core::ProductId;

use crate::config::PaymentConfig;
use crate::models::{Order, Product};

/// Mercado Pago API base URL.
const BASE_URL: &str = "https://api.mercadopago.com";

/// Line item id used for the synthetic shipping line.
///
/// Shipping is its own line item rather than being folded into product
/// prices, so the provider's display and the internal total stay
/// reconcilable.
pub const SHIPPING_ITEM_ID: &str = "shipping";

/// Errors that can occur when creating a preference.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed (network, DNS, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider rejected the preference.
    #[error("provider error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Unauthorized (invalid access token).
    #[error("unauthorized: invalid access token")]
    Unauthorized,

    /// Failed to construct the client or parse a response.
    #[error("payment client error: {0}")]
    Client(String),
}

/// Mercado Pago preferences API client.
///
/// Cheaply cloneable via `Arc`; one instance is created at startup and
/// shared through `AppState`.
#[derive(Clone)]
pub struct PaymentClient {
    inner: Arc<PaymentClientInner>,
}

struct PaymentClientInner {
    client: reqwest::Client,
    base_url: String,
}

impl PaymentClient {
    /// Create a new payment client.
    ///
    /// # Errors
    ///
    /// Returns an error if the access token is not a valid header value or
    /// the HTTP client fails to build.
    pub fn new(config: &PaymentConfig) -> Result<Self, PaymentError> {
        Self::with_base_url(config, BASE_URL)
    }

    /// Create a client against a non-default base URL (tests).
    ///
    /// # Errors
    ///
    /// Same as [`PaymentClient::new`].
    pub fn with_base_url(config: &PaymentConfig, base_url: &str) -> Result<Self, PaymentError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.access_token.expose_secret());
        let mut auth_header = HeaderValue::from_str(&auth_value)
            .map_err(|e| PaymentError::Client(format!("invalid access token: {e}")))?;
        auth_header.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_header);

        let client = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self {
            inner: Arc::new(PaymentClientInner {
                client,
                base_url: base_url.trim_end_matches('/').to_owned(),
            }),
        })
    }

    /// Submit a preference request to the provider.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Unauthorized` on a 401, `PaymentError::Api`
    /// for other provider rejections, and `PaymentError::Http` if the
    /// provider cannot be reached.
    pub async fn create_preference(
        &self,
        request: &PreferenceRequest,
    ) -> Result<PaymentPreference, PaymentError> {
        let url = format!("{}/checkout/preferences", self.inner.base_url);
        let response = self.inner.client.post(&url).json(request).send().await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(PaymentError::Unauthorized);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let preference = response.json::<PaymentPreference>().await?;
        Ok(preference)
    }
}

/// A preference request, in the provider's wire shape.
#[derive(Debug, Clone, Serialize)]
pub struct PreferenceRequest {
    pub items: Vec<PreferenceItem>,
    pub payer: PreferencePayer,
    pub back_urls: BackUrls,
    pub notification_url: String,
}

/// One line item of a preference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreferenceItem {
    pub id: String,
    pub title: String,
    pub quantity: i32,
    /// Serialized as a JSON number; the provider rejects string prices.
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    pub currency_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
}

/// Payer identification forwarded to the provider.
#[derive(Debug, Clone, Serialize)]
pub struct PreferencePayer {
    pub name: String,
    pub email: String,
}

/// Redirect targets after payment.
#[derive(Debug, Clone, Serialize)]
pub struct BackUrls {
    pub success: String,
    pub failure: String,
    pub pending: String,
}

/// The provider's issued preference: id plus redirect URL(s). Ephemeral -
/// passed into the emails and the checkout response, never persisted.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentPreference {
    pub id: String,
    pub init_point: String,
    #[serde(default)]
    pub sandbox_init_point: Option<String>,
}

impl PreferenceRequest {
    /// Build the preference for a persisted order.
    ///
    /// Line items use the authoritative catalog name/price/image, never
    /// client-submitted values; shipping is appended as its own synthetic
    /// line ([`SHIPPING_ITEM_ID`]). `shipping_label` carries the carrier
    /// name when the customer picked a quoted option.
    #[must_use]
    pub fn for_order(
        order: &Order,
        catalog: &HashMap<ProductId, Product>,
        shipping_label: Option<&str>,
        frontend_url: &str,
        backend_url: &str,
    ) -> Self {
        let frontend = frontend_url.trim_end_matches('/');
        let backend = backend_url.trim_end_matches('/');

        let mut items: Vec<PreferenceItem> = order
            .items
            .iter()
            .filter_map(|item| {
                let product = catalog.get(&item.product_id)?;
                Some(PreferenceItem {
                    id: product.id.to_string(),
                    title: product.name.clone(),
                    quantity: item.quantity,
                    unit_price: product.price,
                    currency_id: "BRL".to_owned(),
                    picture_url: Some(format!("{backend}/images/{}", product.image_url)),
                    category_id: Some(product.category.clone()),
                })
            })
            .collect();

        items.push(PreferenceItem {
            id: SHIPPING_ITEM_ID.to_owned(),
            title: shipping_label
                .map_or_else(|| "Frete".to_owned(), |method| format!("Frete - {method}")),
            quantity: 1,
            unit_price: order.shipping_cost,
            currency_id: "BRL".to_owned(),
            picture_url: None,
            category_id: Some("Frete".to_owned()),
        });

        Self {
            items,
            payer: PreferencePayer {
                name: order.customer_name.clone(),
                email: order.customer_email.to_string(),
            },
            back_urls: BackUrls {
                success: format!("{frontend}/success"),
                failure: format!("{frontend}/failure"),
                pending: format!("{frontend}/pending"),
            },
            notification_url: format!("{backend}/api/webhook/mercadopago"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::Utc;

    use luar_core::{Cep, Cpf, Email, OrderId, OrderItemId};
    use crate::models::OrderItem;

    use super::*;

    fn product(id: i32, name: &str, price: Decimal) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_owned(),
            slug: name.to_lowercase().replace(' ', "-"),
            price,
            image_url: format!("pijama-{id:02}.jpg"),
            category: "Inverno".to_owned(),
            description: String::new(),
        }
    }

    fn order_with_two_items() -> (Order, HashMap<ProductId, Product>) {
        let catalog: HashMap<ProductId, Product> = [
            product(1, "Pijama Lua Cheia", Decimal::new(1599, 1)),
            product(2, "Pijama Estrelar Infantil", Decimal::new(1199, 1)),
        ]
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

        let order = Order {
            id: OrderId::new(10),
            customer_name: "Ana Souza".to_owned(),
            customer_email: Email::parse("ana@example.com").unwrap(),
            customer_cpf: Cpf::parse("52998224725").unwrap(),
            cep: Cep::parse("88010-400").unwrap(),
            street: "Rua das Gaivotas".to_owned(),
            number: "12".to_owned(),
            complement: None,
            neighborhood: "Centro".to_owned(),
            city: "Florianópolis".to_owned(),
            state: "SC".to_owned(),
            shipping_cost: Decimal::new(25, 0),
            total_amount: Decimal::new(4647, 1),
            created_at: Utc::now(),
            items: vec![
                OrderItem {
                    id: OrderItemId::new(1),
                    order_id: OrderId::new(10),
                    product_id: ProductId::new(1),
                    quantity: 2,
                    size: "M".to_owned(),
                    unit_price: Decimal::new(1599, 1),
                },
                OrderItem {
                    id: OrderItemId::new(2),
                    order_id: OrderId::new(10),
                    product_id: ProductId::new(2),
                    quantity: 1,
                    size: "4".to_owned(),
                    unit_price: Decimal::new(1199, 1),
                },
            ],
        };

        (order, catalog)
    }

    #[test]
    fn test_for_order_appends_synthetic_shipping_line() {
        let (order, catalog) = order_with_two_items();
        let request = PreferenceRequest::for_order(
            &order,
            &catalog,
            None,
            "https://loja.example",
            "https://api.loja.example",
        );

        assert_eq!(request.items.len(), 3);
        let shipping = request.items.last().unwrap();
        assert_eq!(shipping.id, SHIPPING_ITEM_ID);
        assert_eq!(shipping.title, "Frete");
        assert_eq!(shipping.quantity, 1);
        assert_eq!(shipping.unit_price, Decimal::new(25, 0));
    }

    #[test]
    fn test_for_order_uses_catalog_prices_and_names() {
        let (order, catalog) = order_with_two_items();
        let request = PreferenceRequest::for_order(
            &order,
            &catalog,
            Some("SEDEX"),
            "https://loja.example/",
            "https://api.loja.example/",
        );

        let first = &request.items[0];
        assert_eq!(first.title, "Pijama Lua Cheia");
        assert_eq!(first.unit_price, Decimal::new(1599, 1));
        assert_eq!(first.quantity, 2);
        assert_eq!(
            first.picture_url.as_deref(),
            Some("https://api.loja.example/images/pijama-01.jpg")
        );

        let shipping = request.items.last().unwrap();
        assert_eq!(shipping.title, "Frete - SEDEX");

        assert_eq!(request.back_urls.success, "https://loja.example/success");
        assert_eq!(
            request.notification_url,
            "https://api.loja.example/api/webhook/mercadopago"
        );
    }

    #[test]
    fn test_preference_response_parses_without_sandbox_url() {
        let preference: PaymentPreference = serde_json::from_str(
            r#"{"id":"123-abc","init_point":"https://mp.example/init"}"#,
        )
        .unwrap();
        assert_eq!(preference.id, "123-abc");
        assert!(preference.sandbox_init_point.is_none());
    }
}
