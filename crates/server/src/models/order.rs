//! Order and order item models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use luar_core::{Cep, Cpf, Email, OrderId, OrderItemId, ProductId};

/// A persisted order with its line items.
///
/// Created once per checkout and immutable thereafter; there is no update
/// or cancel path in this flow.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_name: String,
    pub customer_email: Email,
    pub customer_cpf: Cpf,
    pub cep: Cep,
    pub street: String,
    pub number: String,
    pub complement: Option<String>,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
    pub shipping_cost: Decimal,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

/// A persisted order line item, owned exclusively by its order.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub size: String,
    /// Authoritative catalog price at the time of the order.
    pub unit_price: Decimal,
}

/// Order fields ready for insertion (validated and normalized).
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_name: String,
    pub customer_email: Email,
    pub customer_cpf: Cpf,
    pub cep: Cep,
    pub street: String,
    pub number: String,
    pub complement: Option<String>,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
    pub shipping_cost: Decimal,
    pub total_amount: Decimal,
}

/// Line item fields ready for insertion.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub quantity: i32,
    pub size: String,
    pub unit_price: Decimal,
}
