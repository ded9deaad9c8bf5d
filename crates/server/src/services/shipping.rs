//! Shipping quotes and address lookup.
//!
//! Primary quotes come from the Melhor Envio calculator. When no API token
//! is configured or the carrier call fails, quoting degrades to a flat
//! regional table keyed off the destination state, resolved through the
//! public ViaCEP service. Checkout itself never calls this module; the
//! storefront quotes before submitting and sends the chosen cost along.

use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, HeaderValue};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use luar_core::Cep;

use crate::config::ShippingConfig;

/// Melhor Envio production API base URL.
const MELHOR_ENVIO_URL: &str = "https://melhorenvio.com.br/api/v2";

/// ViaCEP public lookup base URL.
const VIACEP_URL: &str = "https://viacep.com.br/ws";

/// Default package dimensions in centimeters, per-shipment.
const PACKAGE_WIDTH_CM: u32 = 20;
const PACKAGE_HEIGHT_CM: u32 = 10;
const PACKAGE_LENGTH_CM: u32 = 30;

/// Default weight per item when the catalog carries none, and the carrier's
/// minimum billable weight, both in kilograms.
const DEFAULT_ITEM_WEIGHT_KG: Decimal = Decimal::from_parts(5, 0, 0, false, 1);
const MIN_WEIGHT_KG: Decimal = Decimal::from_parts(1, 0, 0, false, 1);

/// Errors that can occur when quoting or looking up a CEP.
#[derive(Debug, Error)]
pub enum ShippingError {
    /// HTTP request failed (network, DNS, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// ViaCEP does not know the destination CEP.
    #[error("CEP not found")]
    CepNotFound,

    /// Carrier returned a non-success status.
    #[error("carrier error: status {status}")]
    Carrier { status: u16 },
}

/// One item of a quote request, as submitted by the storefront.
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteItem {
    pub quantity: i32,
    pub price: Decimal,
    /// Weight in kilograms; defaulted when absent.
    #[serde(default)]
    pub weight: Option<Decimal>,
}

/// A quoted delivery option, in the shape the storefront renders.
#[derive(Debug, Clone, Serialize)]
pub struct ShippingOption {
    pub id: i64,
    pub name: String,
    pub company: ShippingCompany,
    /// Price in BRL, kept as the carrier's decimal string.
    pub price: String,
    /// Typical delivery time in business days.
    pub delivery_time: u32,
    pub delivery_range: DeliveryRange,
}

/// Carrier operating a quoted option.
#[derive(Debug, Clone, Serialize)]
pub struct ShippingCompany {
    pub id: i64,
    pub name: String,
}

/// Business-day delivery window.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryRange {
    pub min: u32,
    pub max: u32,
}

/// A resolved postal address from ViaCEP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CepInfo {
    pub cep: String,
    #[serde(rename = "logradouro")]
    pub street: String,
    #[serde(rename = "bairro")]
    pub neighborhood: String,
    #[serde(rename = "localidade")]
    pub city: String,
    #[serde(rename = "uf")]
    pub state: String,
    /// ViaCEP signals unknown CEPs with `{"erro": true}` and a 200.
    #[serde(default, skip_serializing)]
    erro: bool,
}

#[derive(Debug, Serialize)]
struct CarrierQuoteRequest {
    from: CarrierEndpoint,
    to: CarrierEndpoint,
    products: Vec<CarrierProduct>,
}

#[derive(Debug, Serialize)]
struct CarrierEndpoint {
    postal_code: String,
}

#[derive(Debug, Serialize)]
struct CarrierProduct {
    width: u32,
    height: u32,
    length: u32,
    weight: Decimal,
    insurance_value: Decimal,
    quantity: i32,
}

#[derive(Debug, Deserialize)]
struct CarrierQuoteOption {
    id: i64,
    name: String,
    #[serde(default)]
    price: Option<String>,
    #[serde(default)]
    company: Option<CarrierCompany>,
    #[serde(default)]
    delivery_time: Option<u32>,
    #[serde(default)]
    delivery_range: Option<DeliveryRangeWire>,
    /// Present when the carrier cannot serve this option.
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CarrierCompany {
    id: i64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct DeliveryRangeWire {
    min: u32,
    max: u32,
}

/// Shipping quote client. Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct ShippingClient {
    inner: Arc<ShippingClientInner>,
}

struct ShippingClientInner {
    client: reqwest::Client,
    carrier_auth: Option<HeaderValue>,
    store_cep: Cep,
    carrier_url: String,
    viacep_url: String,
}

impl ShippingClient {
    /// Create a new shipping client.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured token is not a valid header
    /// value or the HTTP client fails to build.
    pub fn new(config: &ShippingConfig) -> Result<Self, ShippingError> {
        Self::with_base_urls(config, MELHOR_ENVIO_URL, VIACEP_URL)
    }

    /// Create a client against non-default base URLs (tests).
    ///
    /// # Errors
    ///
    /// Same as [`ShippingClient::new`].
    pub fn with_base_urls(
        config: &ShippingConfig,
        carrier_url: &str,
        viacep_url: &str,
    ) -> Result<Self, ShippingError> {
        let carrier_auth = match &config.melhor_envio_token {
            Some(token) => {
                let mut value =
                    HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                        .map_err(|_| ShippingError::Carrier { status: 0 })?;
                value.set_sensitive(true);
                Some(value)
            }
            None => None,
        };

        let client = reqwest::Client::builder().build()?;

        Ok(Self {
            inner: Arc::new(ShippingClientInner {
                client,
                carrier_auth,
                store_cep: config.store_cep.clone(),
                carrier_url: carrier_url.trim_end_matches('/').to_owned(),
                viacep_url: viacep_url.trim_end_matches('/').to_owned(),
            }),
        })
    }

    /// Quote delivery options for a destination CEP and cart contents.
    ///
    /// Tries the carrier first when a token is configured; any carrier
    /// failure falls back to the regional flat table. The fallback itself
    /// fails only when the CEP is unknown or ViaCEP is unreachable.
    ///
    /// # Errors
    ///
    /// Returns `ShippingError::CepNotFound` for unknown CEPs, or an HTTP
    /// error when both quote paths are unreachable.
    pub async fn quote(
        &self,
        destination: &Cep,
        items: &[QuoteItem],
    ) -> Result<Vec<ShippingOption>, ShippingError> {
        if self.inner.carrier_auth.is_some() {
            match self.carrier_quote(destination, items).await {
                Ok(options) if !options.is_empty() => return Ok(options),
                Ok(_) => {
                    tracing::warn!(cep = %destination, "Carrier returned no viable options, using fallback rates");
                }
                Err(e) => {
                    tracing::warn!(cep = %destination, error = %e, "Carrier quote failed, using fallback rates");
                }
            }
        }

        self.fallback_quote(destination).await
    }

    /// Resolve a CEP to a street address via ViaCEP.
    ///
    /// # Errors
    ///
    /// Returns `ShippingError::CepNotFound` when ViaCEP does not know the
    /// CEP, or an HTTP error if ViaCEP is unreachable.
    pub async fn lookup(&self, cep: &Cep) -> Result<CepInfo, ShippingError> {
        let url = format!("{}/{}/json/", self.inner.viacep_url, cep.as_str());
        let response = self.inner.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(ShippingError::CepNotFound);
        }

        let info = response.json::<CepInfo>().await?;
        if info.erro {
            return Err(ShippingError::CepNotFound);
        }
        Ok(info)
    }

    async fn carrier_quote(
        &self,
        destination: &Cep,
        items: &[QuoteItem],
    ) -> Result<Vec<ShippingOption>, ShippingError> {
        let products = items
            .iter()
            .map(|item| {
                let weight = item
                    .weight
                    .unwrap_or(DEFAULT_ITEM_WEIGHT_KG)
                    .max(MIN_WEIGHT_KG);
                CarrierProduct {
                    width: PACKAGE_WIDTH_CM,
                    height: PACKAGE_HEIGHT_CM,
                    length: PACKAGE_LENGTH_CM,
                    weight,
                    insurance_value: item.price * Decimal::from(item.quantity),
                    quantity: item.quantity,
                }
            })
            .collect();

        let body = CarrierQuoteRequest {
            from: CarrierEndpoint {
                postal_code: self.inner.store_cep.as_str().to_owned(),
            },
            to: CarrierEndpoint {
                postal_code: destination.as_str().to_owned(),
            },
            products,
        };

        let mut request = self
            .inner
            .client
            .post(format!("{}/me/shipment/calculate", self.inner.carrier_url))
            .json(&body);
        if let Some(auth) = &self.inner.carrier_auth {
            request = request.header(AUTHORIZATION, auth.clone());
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ShippingError::Carrier {
                status: status.as_u16(),
            });
        }

        let options = response.json::<Vec<CarrierQuoteOption>>().await?;
        Ok(options
            .into_iter()
            .filter(|option| option.error.is_none())
            .filter_map(|option| {
                let price = option.price?;
                let range = option.delivery_range?;
                let company = option.company.map_or(
                    ShippingCompany {
                        id: 0,
                        name: String::new(),
                    },
                    |c| ShippingCompany {
                        id: c.id,
                        name: c.name,
                    },
                );
                Some(ShippingOption {
                    id: option.id,
                    name: option.name,
                    company,
                    price,
                    delivery_time: option.delivery_time.unwrap_or(range.min),
                    delivery_range: DeliveryRange {
                        min: range.min,
                        max: range.max,
                    },
                })
            })
            .collect())
    }

    async fn fallback_quote(&self, destination: &Cep) -> Result<Vec<ShippingOption>, ShippingError> {
        let info = self.lookup(destination).await?;
        let (price, min_days) = zone_rate(&info.state);

        Ok(vec![ShippingOption {
            id: 1,
            name: "PAC".to_owned(),
            company: ShippingCompany {
                id: 1,
                name: "Correios".to_owned(),
            },
            price: format!("{price:.2}"),
            delivery_time: min_days,
            delivery_range: DeliveryRange {
                min: min_days,
                max: min_days + 2,
            },
        }])
    }

    /// CEP the fallback and carrier quotes ship from.
    #[must_use]
    pub fn store_cep(&self) -> &Cep {
        &self.inner.store_cep
    }
}

/// Flat rate and minimum delivery days for a destination state.
///
/// The store ships from Santa Catarina, so neighboring southern states
/// get the cheapest tier.
#[must_use]
pub fn zone_rate(state: &str) -> (Decimal, u32) {
    match state {
        "SC" | "RS" | "PR" => (Decimal::new(15, 0), 5),
        "SP" | "RJ" | "MG" | "ES" => (Decimal::new(25, 0), 7),
        "BA" | "PE" | "CE" => (Decimal::new(30, 0), 8),
        _ => (Decimal::new(40, 0), 10),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_rate_south_is_cheapest() {
        for state in ["SC", "RS", "PR"] {
            assert_eq!(zone_rate(state), (Decimal::new(15, 0), 5));
        }
    }

    #[test]
    fn test_zone_rate_southeast_tier() {
        for state in ["SP", "RJ", "MG", "ES"] {
            assert_eq!(zone_rate(state), (Decimal::new(25, 0), 7));
        }
    }

    #[test]
    fn test_zone_rate_northeast_tier() {
        for state in ["BA", "PE", "CE"] {
            assert_eq!(zone_rate(state), (Decimal::new(30, 0), 8));
        }
    }

    #[test]
    fn test_zone_rate_everywhere_else() {
        assert_eq!(zone_rate("AM"), (Decimal::new(40, 0), 10));
        assert_eq!(zone_rate("DF"), (Decimal::new(40, 0), 10));
        assert_eq!(zone_rate(""), (Decimal::new(40, 0), 10));
    }

    #[test]
    fn test_weight_constants_match_catalog_defaults() {
        assert_eq!(DEFAULT_ITEM_WEIGHT_KG, Decimal::new(5, 1));
        assert_eq!(MIN_WEIGHT_KG, Decimal::new(1, 1));
    }

    #[test]
    fn test_cep_info_detects_viacep_error_payload() {
        let info: CepInfo = serde_json::from_str(
            r#"{"cep":"","logradouro":"","bairro":"","localidade":"","uf":"","erro":true}"#,
        )
        .unwrap();
        assert!(info.erro);

        let ok: CepInfo = serde_json::from_str(
            r#"{"cep":"88010-400","logradouro":"Rua das Gaivotas","bairro":"Centro","localidade":"Florianópolis","uf":"SC"}"#,
        )
        .unwrap();
        assert!(!ok.erro);
        assert_eq!(ok.state, "SC");
    }
}
