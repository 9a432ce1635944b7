//! HTTP surface of the pricing service.
//!
//! Thin adapters only: extract, call the engine, map the result. Error
//! mapping lives on [`PricingError`](crate::error::PricingError)'s
//! `IntoResponse` impl.

use crate::engine::PricingEngine;
use crate::error::PricingError;
use crate::models::{DiscountApplyRequest, PriceResponse, PriceUpdateRequest};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

/// Build the pricing router.
pub fn router(engine: Arc<PricingEngine>) -> Router {
    Router::new()
        .route("/pricing/:product_id", get(get_price))
        .route("/pricing/update", put(update_price))
        .route("/pricing/apply-discount", post(apply_discount))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(engine)
}

#[allow(clippy::unused_async)]
async fn health() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

async fn get_price(
    State(engine): State<Arc<PricingEngine>>,
    Path(product_id): Path<Uuid>,
) -> Result<Json<PriceResponse>, PricingError> {
    let response = engine.get_price(product_id).await?;
    Ok(Json(response))
}

async fn update_price(
    State(engine): State<Arc<PricingEngine>>,
    Json(request): Json<PriceUpdateRequest>,
) -> Result<StatusCode, PricingError> {
    engine.update_price(request).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn apply_discount(
    State(engine): State<Arc<PricingEngine>>,
    Json(request): Json<DiscountApplyRequest>,
) -> Result<StatusCode, PricingError> {
    engine.apply_discount(request).await?;
    Ok(StatusCode::NO_CONTENT)
}
