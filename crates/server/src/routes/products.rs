//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, State},
};

use luar_core::ProductId;

use crate::db::products::ProductRepository;
use crate::error::{ApiError, Result};
use crate::models::Product;
use crate::state::AppState;

/// `GET /api/products` - the full catalog, ordered by id.
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool()).list().await?;
    Ok(Json(products))
}

/// `GET /api/products/{id}` - one product, 404 when unknown.
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    let product = ProductRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("product {id}")))?;
    Ok(Json(product))
}
