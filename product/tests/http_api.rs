//! Product service HTTP surface.

#![allow(clippy::unwrap_used)]

use async_trait::async_trait;
use axum_test::TestServer;
use rust_decimal_macros::dec;
use serde_json::json;
use shoply_bus::InMemoryEventBus;
use shoply_core::bus::EventBus;
use shoply_product::client::{DiscountRequest, PriceQuote, PricingApi, PricingApiError};
use shoply_product::engine::ProductEngine;
use shoply_product::models::ProductWithPrice;
use shoply_product::routes;
use shoply_product::store::InMemoryProductStore;
use std::sync::Arc;
use uuid::Uuid;

/// Pricing stub that quotes every product at 10 with no discounts.
struct FlatPricingApi;

#[async_trait]
impl PricingApi for FlatPricingApi {
    async fn get_price(&self, product_id: Uuid) -> Result<PriceQuote, PricingApiError> {
        Ok(PriceQuote {
            product_id,
            current_price: dec!(10),
            discounted_price: dec!(10),
        })
    }

    async fn apply_discount(&self, _request: DiscountRequest) -> Result<(), PricingApiError> {
        Ok(())
    }
}

fn server() -> TestServer {
    let engine = Arc::new(ProductEngine::new(
        Arc::new(InMemoryProductStore::new()),
        Arc::new(InMemoryEventBus::new()) as Arc<dyn EventBus>,
        Arc::new(FlatPricingApi),
        None,
    ));
    TestServer::new(routes::router(engine)).unwrap()
}

#[tokio::test]
async fn create_then_get_composes_price() {
    let server = server();
    let id = Uuid::new_v4();

    server
        .post("/products")
        .json(&json!({
            "id": id,
            "name": "widget",
            "price": "10",
            "user_id": "u-1",
        }))
        .await
        .assert_status(axum::http::StatusCode::CREATED);

    let response = server.get(&format!("/products/{id}")).await;
    response.assert_status_ok();
    let detail: ProductWithPrice = response.json();
    assert_eq!(detail.name, "widget");
    assert_eq!(detail.price, dec!(10));
}

#[tokio::test]
async fn update_with_mismatched_body_id_is_400() {
    let server = server();
    let id = Uuid::new_v4();

    server
        .post("/products")
        .json(&json!({
            "id": id,
            "name": "widget",
            "price": "10",
            "user_id": "u-1",
        }))
        .await
        .assert_status(axum::http::StatusCode::CREATED);

    let response = server
        .put(&format!("/products/{id}"))
        .json(&json!({
            "id": Uuid::new_v4(),
            "name": "widget",
            "price": "20",
            "user_id": "u-1",
        }))
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_of_missing_product_is_404() {
    let server = server();
    let response = server
        .delete(&format!("/products/{}", Uuid::new_v4()))
        .await;
    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_returns_created_products() {
    let server = server();

    for name in ["widget", "gadget"] {
        server
            .post("/products")
            .json(&json!({
                "id": Uuid::new_v4(),
                "name": name,
                "price": "10",
                "user_id": "u-1",
            }))
            .await
            .assert_status(axum::http::StatusCode::CREATED);
    }

    let response = server.get("/products").await;
    response.assert_status_ok();
    let products: Vec<shoply_product::models::Product> = response.json();
    assert_eq!(products.len(), 2);
}
