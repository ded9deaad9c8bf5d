//! Shipping quote and CEP lookup handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use luar_core::Cep;

use crate::error::{ApiError, Result};
use crate::services::shipping::{QuoteItem, ShippingOption};
use crate::state::AppState;

/// `POST /api/shipping/calculate` request body.
#[derive(Debug, Deserialize)]
pub struct CalculateRequest {
    pub cep: String,
    pub items: Vec<QuoteItem>,
}

/// `POST /api/shipping/calculate` - quote delivery options for a cart.
pub async fn calculate(
    State(state): State<AppState>,
    Json(body): Json<CalculateRequest>,
) -> Result<Json<Vec<ShippingOption>>> {
    let cep = Cep::parse(&body.cep).map_err(|e| ApiError::Validation(format!("cep: {e}")))?;
    if body.items.is_empty() {
        return Err(ApiError::Validation("items must not be empty".to_owned()));
    }
    for (index, item) in body.items.iter().enumerate() {
        if item.quantity <= 0 {
            return Err(ApiError::Validation(format!(
                "items[{index}].quantity must be a positive integer"
            )));
        }
    }

    let options = state.shipping().quote(&cep, &body.items).await?;
    Ok(Json(options))
}

/// `GET /api/shipping/cep/{cep}` response body.
#[derive(Debug, Serialize)]
pub struct CepLookupResponse {
    pub valid: bool,
    pub address: CepAddress,
}

/// Resolved address fields, without the echo of the queried CEP.
#[derive(Debug, Serialize)]
pub struct CepAddress {
    pub street: String,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
}

/// `GET /api/shipping/cep/{cep}` - resolve a CEP to a street address.
///
/// 400 for a malformed CEP, 404 when ViaCEP does not know it.
pub async fn lookup_cep(
    State(state): State<AppState>,
    Path(cep): Path<String>,
) -> Result<Json<CepLookupResponse>> {
    let cep = Cep::parse(&cep).map_err(|e| ApiError::Validation(format!("cep: {e}")))?;
    let info = state.shipping().lookup(&cep).await?;
    Ok(Json(CepLookupResponse {
        valid: true,
        address: CepAddress {
            street: info.street,
            neighborhood: info.neighborhood,
            city: info.city,
            state: info.state,
        },
    }))
}
