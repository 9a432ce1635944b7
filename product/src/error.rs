//! Error taxonomy for the product service.

use crate::client::PricingApiError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use shoply_core::bus::EventBusError;
use shoply_core::event::EventError;
use thiserror::Error;
use uuid::Uuid;

/// Result alias for product operations.
pub type Result<T> = std::result::Result<T, ProductError>;

/// Everything that can go wrong inside the product service.
#[derive(Error, Debug)]
pub enum ProductError {
    /// No product exists with the requested id.
    #[error("product {0} not found")]
    NotFound(Uuid),

    /// The pricing service has no price for the product.
    #[error("price for product {0} not found")]
    PriceNotFound(Uuid),

    /// Path id and body id disagree on an update.
    #[error("product id mismatch: path {path}, body {body}")]
    IdMismatch {
        /// Id from the URL path.
        path: Uuid,
        /// Id from the request body.
        body: Uuid,
    },

    /// The pricing service could not be reached or answered abnormally.
    #[error("pricing service unavailable: {0}")]
    PricingUnavailable(String),

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

impl From<PricingApiError> for ProductError {
    fn from(err: PricingApiError) -> Self {
        match err {
            PricingApiError::NotFound(product_id) => Self::PriceNotFound(product_id),
            PricingApiError::Unavailable(reason) | PricingApiError::Protocol(reason) => {
                Self::PricingUnavailable(reason)
            }
        }
    }
}

impl IntoResponse for ProductError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Self::NotFound(_) | Self::PriceNotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Self::IdMismatch { .. } => (StatusCode::BAD_REQUEST, "id_mismatch"),
            Self::PricingUnavailable(_) | Self::Bus(_) => {
                (StatusCode::BAD_GATEWAY, "upstream_error")
            }
            Self::Database(_) | Self::Event(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
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
        let response = ProductError::NotFound(Uuid::new_v4()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn id_mismatch_maps_to_400() {
        let err = ProductError::IdMismatch {
            path: Uuid::new_v4(),
            body: Uuid::new_v4(),
        };
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn pricing_unavailable_maps_to_502() {
        let err = ProductError::PricingUnavailable("timeout".into());
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn pricing_api_not_found_converts_to_price_not_found() {
        let id = Uuid::new_v4();
        let err: ProductError = PricingApiError::NotFound(id).into();
        assert!(matches!(err, ProductError::PriceNotFound(got) if got == id));
    }
}
