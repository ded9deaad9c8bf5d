//! Checkout handler: the heart of the API.
//!
//! `POST /api/create-payment` runs the whole pipeline in order: validate
//! the payload, reconcile cart items against the catalog, verify the
//! client's totals against authoritative prices, persist the order in one
//! transaction, create the payment preference, then send the two order
//! emails. Email failures never fail the request; they are reported in the
//! response's `emailStatus`.

use std::collections::HashMap;

use axum::{Json, extract::State};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use luar_core::{Cep, Cpf, Email, ProductId};

use crate::db::orders::OrderRepository;
use crate::db::products::ProductRepository;
use crate::error::{ApiError, Result};
use crate::models::{NewOrder, NewOrderItem, Product};
use crate::services::mailer::{OrderEmailContext, ShippingSummary};
use crate::services::notifications::{EmailStatus, send_order_emails};
use crate::services::payment::PreferenceRequest;
use crate::state::AppState;

/// `POST /api/create-payment` request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub customer_name: String,
    pub customer_email: String,
    #[serde(rename = "customerCPF")]
    pub customer_cpf: String,
    pub address: AddressPayload,
    pub items: Vec<ItemPayload>,
    pub shipping_cost: Decimal,
    pub total_amount: Decimal,
    /// The quoted option the customer picked, when shipping was quoted.
    #[serde(default)]
    pub shipping: Option<ShippingSelection>,
}

/// Delivery address as submitted by the storefront.
#[derive(Debug, Deserialize)]
pub struct AddressPayload {
    pub cep: String,
    pub street: String,
    pub number: String,
    #[serde(default)]
    pub complement: Option<String>,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
}

/// One cart line as submitted by the storefront.
///
/// `price` is what the storefront displayed; it is cross-checked against
/// the catalog but never trusted for persistence or payment.
#[derive(Debug, Deserialize)]
pub struct ItemPayload {
    pub id: i32,
    pub quantity: i32,
    pub size: String,
    pub price: Decimal,
}

/// The shipping option chosen at quote time, echoed back for the emails
/// and the payment preference label.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingSelection {
    pub method: String,
    pub service: String,
    pub delivery_time: String,
    /// Carrier option id from the quote, kept for support tickets.
    #[serde(default)]
    pub melhor_envio_id: Option<i64>,
}

/// `POST /api/create-payment` response body.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub id: String,
    pub init_point: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sandbox_init_point: Option<String>,
    #[serde(rename = "emailStatus")]
    pub email_status: EmailStatus,
}

/// A payload that passed validation, with parsed domain types.
#[derive(Debug)]
struct ValidatedCheckout {
    customer_name: String,
    customer_email: Email,
    customer_cpf: Cpf,
    cep: Cep,
    address: AddressPayload,
    items: Vec<ItemPayload>,
    shipping_cost: Decimal,
    total_amount: Decimal,
    shipping: Option<ShippingSelection>,
}

/// `POST /api/create-payment` - the full checkout pipeline.
#[tracing::instrument(skip_all, fields(customer_email, order_id))]
pub async fn create_payment(
    State(state): State<AppState>,
    Json(body): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>> {
    let checkout = validate(body)?;
    tracing::Span::current().record("customer_email", checkout.customer_email.as_str());

    let product_repo = ProductRepository::new(state.pool());
    let requested: Vec<ProductId> = checkout
        .items
        .iter()
        .map(|item| ProductId::new(item.id))
        .collect();
    let catalog: HashMap<ProductId, Product> = product_repo
        .find_by_ids(&requested)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let missing = missing_ids(&requested, &catalog);
    if !missing.is_empty() {
        return Err(ApiError::ProductsNotFound(missing));
    }

    verify_total(&checkout, &catalog)?;

    let (new_order, new_items) = to_records(&checkout, &catalog);
    let order = OrderRepository::new(state.pool())
        .create(&new_order, &new_items)
        .await?;
    tracing::Span::current().record("order_id", order.id.as_i32());
    tracing::info!(total = %order.total_amount, items = order.items.len(), "Order persisted");

    let preference_request = PreferenceRequest::for_order(
        &order,
        &catalog,
        checkout.shipping.as_ref().map(|s| s.method.as_str()),
        &state.config().frontend_url,
        &state.config().backend_url,
    );
    let preference = state.payments().create_preference(&preference_request).await?;
    tracing::info!(preference_id = %preference.id, "Payment preference created");

    let item_names: Vec<String> = order
        .items
        .iter()
        .filter_map(|item| catalog.get(&item.product_id).map(|p| p.name.clone()))
        .collect();
    let ctx = OrderEmailContext::build(
        &order,
        &item_names,
        &preference,
        checkout.shipping.map(|s| ShippingSummary {
            method: s.method,
            service: s.service,
            delivery_time: s.delivery_time,
        }),
    );
    let email_status = send_order_emails(state.mailer(), state.email_log(), &ctx, order.id).await;

    Ok(Json(CheckoutResponse {
        id: preference.id,
        init_point: preference.init_point,
        sandbox_init_point: preference.sandbox_init_point,
        email_status,
    }))
}

/// Validate the payload, reporting the first violation by field name.
fn validate(body: CheckoutRequest) -> Result<ValidatedCheckout> {
    let invalid = |message: String| ApiError::Validation(message);

    let customer_name = body.customer_name.trim().to_owned();
    if customer_name.is_empty() {
        return Err(invalid("customerName is required".to_owned()));
    }

    let customer_email = Email::parse(&body.customer_email)
        .map_err(|e| invalid(format!("customerEmail: {e}")))?;
    let customer_cpf =
        Cpf::parse(&body.customer_cpf).map_err(|e| invalid(format!("customerCPF: {e}")))?;
    let cep =
        Cep::parse(&body.address.cep).map_err(|e| invalid(format!("address.cep: {e}")))?;

    for (field, value) in [
        ("address.street", &body.address.street),
        ("address.number", &body.address.number),
        ("address.neighborhood", &body.address.neighborhood),
        ("address.city", &body.address.city),
        ("address.state", &body.address.state),
    ] {
        if value.trim().is_empty() {
            return Err(invalid(format!("{field} is required")));
        }
    }

    if body.items.is_empty() {
        return Err(invalid("items must not be empty".to_owned()));
    }
    for (index, item) in body.items.iter().enumerate() {
        if item.id <= 0 {
            return Err(invalid(format!("items[{index}].id must be a positive integer")));
        }
        if item.quantity <= 0 {
            return Err(invalid(format!(
                "items[{index}].quantity must be a positive integer"
            )));
        }
        if item.size.trim().is_empty() {
            return Err(invalid(format!("items[{index}].size is required")));
        }
        if item.price <= Decimal::ZERO {
            return Err(invalid(format!("items[{index}].price must be positive")));
        }
    }

    if body.shipping_cost < Decimal::ZERO {
        return Err(invalid("shippingCost must not be negative".to_owned()));
    }
    if body.total_amount <= Decimal::ZERO {
        return Err(invalid("totalAmount must be positive".to_owned()));
    }

    Ok(ValidatedCheckout {
        customer_name,
        customer_email,
        customer_cpf,
        cep,
        address: body.address,
        items: body.items,
        shipping_cost: body.shipping_cost,
        total_amount: body.total_amount,
        shipping: body.shipping,
    })
}

/// Requested ids absent from the catalog, sorted and deduplicated so the
/// error message lists each missing product once.
fn missing_ids(
    requested: &[ProductId],
    catalog: &HashMap<ProductId, Product>,
) -> Vec<ProductId> {
    let mut missing: Vec<ProductId> = requested
        .iter()
        .filter(|id| !catalog.contains_key(id))
        .copied()
        .collect();
    missing.sort_by_key(|id| id.as_i32());
    missing.dedup();
    missing
}

/// Recompute the order total from catalog prices and reject the payload if
/// the client's `totalAmount` disagrees. Stale storefront prices surface
/// here instead of as an order the customer underpaid or overpaid.
fn verify_total(
    checkout: &ValidatedCheckout,
    catalog: &HashMap<ProductId, Product>,
) -> Result<()> {
    let items_total: Decimal = checkout
        .items
        .iter()
        .filter_map(|item| {
            let product = catalog.get(&ProductId::new(item.id))?;
            Some(product.price * Decimal::from(item.quantity))
        })
        .sum();
    let expected = items_total + checkout.shipping_cost;

    if expected != checkout.total_amount {
        return Err(ApiError::Validation(format!(
            "totalAmount mismatch: expected {expected}, got {}",
            checkout.total_amount
        )));
    }
    Ok(())
}

/// Build insertable records, pricing every line from the catalog.
fn to_records(
    checkout: &ValidatedCheckout,
    catalog: &HashMap<ProductId, Product>,
) -> (NewOrder, Vec<NewOrderItem>) {
    let items = checkout
        .items
        .iter()
        .filter_map(|item| {
            let product = catalog.get(&ProductId::new(item.id))?;
            Some(NewOrderItem {
                product_id: product.id,
                quantity: item.quantity,
                size: item.size.clone(),
                unit_price: product.price,
            })
        })
        .collect();

    let order = NewOrder {
        customer_name: checkout.customer_name.clone(),
        customer_email: checkout.customer_email.clone(),
        customer_cpf: checkout.customer_cpf.clone(),
        cep: checkout.cep.clone(),
        street: checkout.address.street.clone(),
        number: checkout.address.number.clone(),
        complement: checkout.address.complement.clone(),
        neighborhood: checkout.address.neighborhood.clone(),
        city: checkout.address.city.clone(),
        state: checkout.address.state.clone(),
        shipping_cost: checkout.shipping_cost,
        total_amount: checkout.total_amount,
    };

    (order, items)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn product(id: i32, price: Decimal) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Pijama {id}"),
            slug: format!("pijama-{id}"),
            price,
            image_url: format!("pijama-{id}.jpg"),
            category: "Inverno".to_owned(),
            description: String::new(),
        }
    }

    fn catalog() -> HashMap<ProductId, Product> {
        [
            product(1, Decimal::new(15990, 2)),
            product(2, Decimal::new(11990, 2)),
        ]
        .into_iter()
        .map(|p| (p.id, p))
        .collect()
    }

    fn valid_request() -> CheckoutRequest {
        CheckoutRequest {
            customer_name: "Ana Souza".to_owned(),
            customer_email: "ana@example.com".to_owned(),
            customer_cpf: "529.982.247-25".to_owned(),
            address: AddressPayload {
                cep: "88010-400".to_owned(),
                street: "Rua das Gaivotas".to_owned(),
                number: "12".to_owned(),
                complement: None,
                neighborhood: "Centro".to_owned(),
                city: "Florianópolis".to_owned(),
                state: "SC".to_owned(),
            },
            items: vec![
                ItemPayload {
                    id: 1,
                    quantity: 2,
                    size: "M".to_owned(),
                    price: Decimal::new(15990, 2),
                },
                ItemPayload {
                    id: 2,
                    quantity: 1,
                    size: "4".to_owned(),
                    price: Decimal::new(11990, 2),
                },
            ],
            // 2 * 159.90 + 119.90 + 25.00
            shipping_cost: Decimal::new(25, 0),
            total_amount: Decimal::new(46470, 2),
            shipping: None,
        }
    }

    fn validation_message(err: ApiError) -> String {
        match err {
            ApiError::Validation(message) => message,
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn test_validate_accepts_well_formed_payload() {
        let checkout = validate(valid_request()).unwrap();
        assert_eq!(checkout.customer_email.as_str(), "ana@example.com");
        assert_eq!(checkout.cep.as_str(), "88010400");
        assert_eq!(checkout.items.len(), 2);
    }

    #[test]
    fn test_validate_rejects_blank_name_first() {
        let mut request = valid_request();
        request.customer_name = "   ".to_owned();
        request.customer_email = "not-an-email".to_owned();

        let message = validation_message(validate(request).unwrap_err());
        assert_eq!(message, "customerName is required");
    }

    #[test]
    fn test_validate_names_offending_item_index() {
        let mut request = valid_request();
        request.items[1].quantity = 0;

        let message = validation_message(validate(request).unwrap_err());
        assert_eq!(message, "items[1].quantity must be a positive integer");
    }

    #[test]
    fn test_validate_rejects_bad_cpf() {
        let mut request = valid_request();
        request.customer_cpf = "1234".to_owned();

        let message = validation_message(validate(request).unwrap_err());
        assert!(message.starts_with("customerCPF: "));
    }

    #[test]
    fn test_validate_rejects_negative_shipping() {
        let mut request = valid_request();
        request.shipping_cost = Decimal::new(-1, 0);

        let message = validation_message(validate(request).unwrap_err());
        assert_eq!(message, "shippingCost must not be negative");
    }

    #[test]
    fn test_missing_ids_sorted_and_deduplicated() {
        let requested = vec![
            ProductId::new(7),
            ProductId::new(1),
            ProductId::new(3),
            ProductId::new(7),
        ];
        let missing = missing_ids(&requested, &catalog());
        assert_eq!(missing, vec![ProductId::new(3), ProductId::new(7)]);
    }

    #[test]
    fn test_verify_total_accepts_matching_amount() {
        let checkout = validate(valid_request()).unwrap();
        assert!(verify_total(&checkout, &catalog()).is_ok());
    }

    #[test]
    fn test_verify_total_rejects_stale_client_prices() {
        let mut request = valid_request();
        // Client believes item 1 still costs 99.90.
        request.items[0].price = Decimal::new(9990, 2);
        request.total_amount = Decimal::new(34470, 2);

        let checkout = validate(request).unwrap();
        let message = validation_message(verify_total(&checkout, &catalog()).unwrap_err());
        assert!(message.starts_with("totalAmount mismatch"));
    }

    #[test]
    fn test_to_records_prices_from_catalog() {
        let mut request = valid_request();
        request.items[0].price = Decimal::new(1, 0);
        request.total_amount = Decimal::new(46470, 2);
        // Totals verified separately; the inserted rows must carry catalog
        // prices even when the client's differ.
        let checkout = validate(request).unwrap();

        let (order, items) = to_records(&checkout, &catalog());
        assert_eq!(items[0].unit_price, Decimal::new(15990, 2));
        assert_eq!(items[1].unit_price, Decimal::new(11990, 2));
        assert_eq!(order.total_amount, Decimal::new(46470, 2));
    }

    #[test]
    fn test_request_deserializes_storefront_shape() {
        let json = r#"{
            "customerName": "Ana Souza",
            "customerEmail": "ana@example.com",
            "customerCPF": "529.982.247-25",
            "address": {
                "cep": "88010-400",
                "street": "Rua das Gaivotas",
                "number": "12",
                "neighborhood": "Centro",
                "city": "Florianópolis",
                "state": "SC"
            },
            "items": [
                {"id": 1, "quantity": 2, "size": "M", "price": 159.90}
            ],
            "shippingCost": 25.00,
            "totalAmount": 344.80,
            "shipping": {
                "method": "PAC",
                "service": "Correios",
                "deliveryTime": "5 dias úteis"
            }
        }"#;

        let request: CheckoutRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.customer_cpf, "529.982.247-25");
        assert_eq!(request.items[0].price, Decimal::new(15990, 2));
        assert_eq!(request.shipping.unwrap().delivery_time, "5 dias úteis");
    }
}
