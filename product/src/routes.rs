//! HTTP surface of the product service.

use crate::engine::ProductEngine;
use crate::error::ProductError;
use crate::models::{Product, ProductWithPrice};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

/// Build the product router.
pub fn router(engine: Arc<ProductEngine>) -> Router {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(engine)
}

#[allow(clippy::unused_async)]
async fn health() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

async fn list_products(
    State(engine): State<Arc<ProductEngine>>,
) -> Result<Json<Vec<Product>>, ProductError> {
    let products = engine.list().await?;
    Ok(Json(products))
}

async fn get_product(
    State(engine): State<Arc<ProductEngine>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductWithPrice>, ProductError> {
    let product = engine.get(id).await?;
    Ok(Json(product))
}

async fn create_product(
    State(engine): State<Arc<ProductEngine>>,
    Json(product): Json<Product>,
) -> Result<(StatusCode, Json<Product>), ProductError> {
    let created = engine.create(product).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_product(
    State(engine): State<Arc<ProductEngine>>,
    Path(id): Path<Uuid>,
    Json(product): Json<Product>,
) -> Result<StatusCode, ProductError> {
    engine.update(id, product).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_product(
    State(engine): State<Arc<ProductEngine>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ProductError> {
    engine.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
