//! Error taxonomy for the pricing service.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use shoply_core::bus::EventBusError;
use shoply_core::event::EventError;
use thiserror::Error;
use uuid::Uuid;

/// Result alias for pricing operations.
pub type Result<T> = std::result::Result<T, PricingError>;

/// Everything that can go wrong inside the pricing service.
#[derive(Error, Debug)]
pub enum PricingError {
    /// No price record exists for the product.
    #[error("price for product {0} not found")]
    PriceNotFound(Uuid),

    /// The relational store failed.
    #[error("database error: {0}")]
    Database(String),

    /// The event bus failed (publish or subscribe).
    #[error("event bus error: {0}")]
    Bus(#[from] EventBusError),

    /// An event payload could not be encoded or decoded.
    #[error("event codec failed: {0}")]
    Event(#[from] EventError),
}

impl IntoResponse for PricingError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Self::PriceNotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Self::Database(_) | Self::Event(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
            Self::Bus(_) => (StatusCode::BAD_GATEWAY, "bus_error"),
        };

        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "Request failed");
        }

        let body = Json(json!({
            "error": code,
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let response = PricingError::PriceNotFound(Uuid::new_v4()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn database_maps_to_500() {
        let response = PricingError::Database("boom".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn bus_failure_maps_to_502() {
        let err = PricingError::Bus(EventBusError::PublishFailed {
            topic: "price-events".into(),
            reason: "down".into(),
        });
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }
}
