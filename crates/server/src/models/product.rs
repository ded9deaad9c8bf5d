//! Catalog product model.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

use luar_core::ProductId;

/// A catalog product.
///
/// Read-only from the checkout flow's perspective; the catalog is seeded via
/// migration. `price` is the authoritative unit price - client-submitted
/// prices are only ever cross-checked against it, never trusted.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub price: Decimal,
    pub image_url: String,
    pub category: String,
    pub description: String,
}
