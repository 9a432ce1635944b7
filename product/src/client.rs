//! Outbound client for the pricing service.
//!
//! The product service calls pricing synchronously in two places: the
//! product detail endpoint (authoritative price lookup) and the update
//! path (policy-driven discount application). [`PricingApi`] is the seam;
//! [`HttpPricingClient`] is the production implementation with an explicit
//! bounded timeout, so a slow pricing service fails the calling request
//! with [`PricingApiError::Unavailable`] instead of stalling it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Errors from pricing calls.
#[derive(Error, Debug, Clone)]
pub enum PricingApiError {
    /// The pricing service has no price record for the product.
    #[error("no price for product {0}")]
    NotFound(Uuid),

    /// The pricing service could not be reached (connect error, timeout,
    /// 5xx).
    #[error("pricing service unavailable: {0}")]
    Unavailable(String),

    /// The pricing service answered with something unexpected.
    #[error("pricing protocol error: {0}")]
    Protocol(String),
}

/// The authoritative price of a product as served by the pricing API.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PriceQuote {
    /// The product the quote is for.
    pub product_id: Uuid,
    /// Current base price.
    pub current_price: Decimal,
    /// Price after active discounts.
    pub discounted_price: Decimal,
}

/// How a requested discount reduces the price.
///
/// Mirrors the pricing service's wire vocabulary; the two services share
/// JSON, not types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountKind {
    /// Subtract a percentage of the running price.
    Percentage,
    /// Subtract a flat amount.
    Fixed,
}

/// Body for `POST /pricing/apply-discount`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DiscountRequest {
    /// The product the discount applies to.
    pub product_id: Uuid,
    /// Percentage or fixed.
    pub kind: DiscountKind,
    /// Percent points or flat amount.
    pub value: Decimal,
    /// Start of the validity window.
    pub starts_at: DateTime<Utc>,
    /// End of the validity window.
    pub ends_at: DateTime<Utc>,
}

/// Synchronous operations against the pricing service.
#[async_trait]
pub trait PricingApi: Send + Sync {
    /// Fetch the authoritative price-with-discounts for a product.
    async fn get_price(&self, product_id: Uuid) -> Result<PriceQuote, PricingApiError>;

    /// Apply a discount to a product.
    async fn apply_discount(&self, request: DiscountRequest) -> Result<(), PricingApiError>;
}

/// HTTP implementation of [`PricingApi`].
#[derive(Clone)]
pub struct HttpPricingClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPricingClient {
    /// Create a client for the pricing service at `base_url`
    /// (e.g. `http://pricing:8081`), with every request bounded by
    /// `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`PricingApiError::Protocol`] if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, PricingApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PricingApiError::Protocol(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PricingApi for HttpPricingClient {
    async fn get_price(&self, product_id: Uuid) -> Result<PriceQuote, PricingApiError> {
        let url = format!("{}/pricing/{product_id}", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| PricingApiError::Unavailable(e.to_string()))?;

        match response.status() {
            StatusCode::OK => response
                .json::<PriceQuote>()
                .await
                .map_err(|e| PricingApiError::Protocol(e.to_string())),
            StatusCode::NOT_FOUND => Err(PricingApiError::NotFound(product_id)),
            status if status.is_server_error() => {
                Err(PricingApiError::Unavailable(format!("status {status}")))
            }
            status => Err(PricingApiError::Protocol(format!(
                "unexpected status {status}"
            ))),
        }
    }

    async fn apply_discount(&self, request: DiscountRequest) -> Result<(), PricingApiError> {
        let url = format!("{}/pricing/apply-discount", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| PricingApiError::Unavailable(e.to_string()))?;

        match response.status() {
            StatusCode::NO_CONTENT => Ok(()),
            status if status.is_server_error() => {
                Err(PricingApiError::Unavailable(format!("status {status}")))
            }
            status => Err(PricingApiError::Protocol(format!(
                "unexpected status {status}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let client =
            HttpPricingClient::new("http://pricing:8081/", Duration::from_secs(2)).unwrap();
        assert_eq!(client.base_url, "http://pricing:8081");
    }

    #[test]
    fn discount_kind_matches_pricing_wire_format() {
        let json = serde_json::to_string(&DiscountKind::Percentage).unwrap();
        assert_eq!(json, "\"percentage\"");
    }
}
