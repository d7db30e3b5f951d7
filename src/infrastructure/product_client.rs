use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::errors::CatalogError;
use crate::domain::order::ProductSnapshot;
use crate::domain::ports::ProductCatalog;

#[derive(Debug, Serialize)]
struct ValidateProductsRequest<'a> {
    ids: &'a [String],
}

#[derive(Debug, Deserialize)]
struct ProductDto {
    id: Value,
    name: String,
    price: Value,
}

impl From<reqwest::Error> for CatalogError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            CatalogError::Timeout
        } else if e.is_decode() {
            CatalogError::InvalidResponse(e.to_string())
        } else {
            CatalogError::Transport(e.to_string())
        }
    }
}

/// Numbers and strings are both accepted; the price is parsed from its
/// textual form so no binary floating point is involved.
fn parse_price(value: &Value) -> Result<BigDecimal, CatalogError> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => {
            return Err(CatalogError::InvalidResponse(format!(
                "price must be a number or string, got {}",
                other
            )))
        }
    };
    BigDecimal::from_str(&text)
        .map_err(|e| CatalogError::InvalidResponse(format!("invalid price '{}': {}", text, e)))
}

fn parse_id(value: &Value) -> Result<String, CatalogError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(CatalogError::InvalidResponse(format!(
            "product id must be a string or number, got {}",
            other
        ))),
    }
}

impl TryFrom<ProductDto> for ProductSnapshot {
    type Error = CatalogError;

    fn try_from(dto: ProductDto) -> Result<Self, Self::Error> {
        Ok(ProductSnapshot {
            id: parse_id(&dto.id)?,
            price: parse_price(&dto.price)?,
            name: dto.name,
        })
    }
}

/// [`ProductCatalog`] backed by the product service's HTTP API.
///
/// One `reqwest::Client` is shared by all requests so connections are pooled.
#[derive(Debug, Clone)]
pub struct HttpProductCatalog {
    client: reqwest::Client,
    base_url: String,
}

impl HttpProductCatalog {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn validate_url(&self) -> String {
        format!("{}/products/validate", self.base_url)
    }
}

#[async_trait]
impl ProductCatalog for HttpProductCatalog {
    async fn validate_products(
        &self,
        ids: &[String],
    ) -> Result<Vec<ProductSnapshot>, CatalogError> {
        log::debug!("Validating {} product(s) against {}", ids.len(), self.base_url);

        let resp = self
            .client
            .post(self.validate_url())
            .json(&ValidateProductsRequest { ids })
            .send()
            .await?;

        let status = resp.status();
        if status.is_client_error() {
            let message = resp.text().await.unwrap_or_default();
            return Err(CatalogError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        if !status.is_success() {
            return Err(CatalogError::Unavailable {
                status: status.as_u16(),
            });
        }

        let products: Vec<ProductDto> = resp.json().await?;
        products.into_iter().map(ProductSnapshot::try_from).collect()
    }
}
