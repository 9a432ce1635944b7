//! Pricing engine behavior over the in-memory store and bus.

#![allow(clippy::unwrap_used)]

use chrono::{Duration, Utc};
use futures::StreamExt;
use rust_decimal_macros::dec;
use shoply_bus::InMemoryEventBus;
use shoply_core::bus::EventBus;
use shoply_core::contracts::{PRICE_EVENTS_TOPIC, PriceUpdated};
use shoply_pricing::engine::PricingEngine;
use shoply_pricing::error::PricingError;
use shoply_pricing::models::{DiscountApplyRequest, DiscountKind, PriceUpdateRequest};
use shoply_pricing::store::InMemoryPriceStore;
use std::sync::Arc;
use uuid::Uuid;

fn engine_with(
    store: InMemoryPriceStore,
    bus: Arc<InMemoryEventBus>,
) -> PricingEngine {
    PricingEngine::new(Arc::new(store), bus as Arc<dyn EventBus>)
}

#[tokio::test]
async fn get_price_for_unknown_product_is_not_found() {
    let engine = engine_with(InMemoryPriceStore::new(), Arc::new(InMemoryEventBus::new()));

    let result = engine.get_price(Uuid::new_v4()).await;

    assert!(matches!(result, Err(PricingError::PriceNotFound(_))));
}

#[tokio::test]
async fn fresh_price_has_no_discounts() {
    let engine = engine_with(InMemoryPriceStore::new(), Arc::new(InMemoryEventBus::new()));
    let product_id = Uuid::new_v4();

    engine.add_price(product_id, dec!(10)).await.unwrap();

    let response = engine.get_price(product_id).await.unwrap();
    assert_eq!(response.current_price, dec!(10));
    assert_eq!(response.discounted_price, dec!(10));
    assert!(response.active_discounts.is_empty());
}

#[tokio::test]
async fn percentage_then_fixed_discounts_compound_in_creation_order() {
    let engine = engine_with(InMemoryPriceStore::new(), Arc::new(InMemoryEventBus::new()));
    let product_id = Uuid::new_v4();
    let now = Utc::now();

    engine.add_price(product_id, dec!(100)).await.unwrap();
    engine
        .apply_discount(DiscountApplyRequest {
            product_id,
            kind: DiscountKind::Percentage,
            value: dec!(10),
            starts_at: now - Duration::hours(1),
            ends_at: now + Duration::days(1),
        })
        .await
        .unwrap();
    engine
        .apply_discount(DiscountApplyRequest {
            product_id,
            kind: DiscountKind::Fixed,
            value: dec!(5),
            starts_at: now - Duration::hours(1),
            ends_at: now + Duration::days(1),
        })
        .await
        .unwrap();

    let response = engine.get_price(product_id).await.unwrap();

    // (100 - 10%) - 5, applied in creation order.
    assert_eq!(response.discounted_price, dec!(85.0));
    assert_eq!(response.active_discounts.len(), 2);
    assert_eq!(response.active_discounts[0].kind, DiscountKind::Percentage);
    assert_eq!(response.active_discounts[1].kind, DiscountKind::Fixed);
}

#[tokio::test]
async fn update_price_publishes_exactly_one_event_with_new_base() {
    let bus = Arc::new(InMemoryEventBus::new());
    let store = InMemoryPriceStore::new();
    let engine = engine_with(store, bus.clone());
    let product_id = Uuid::new_v4();
    let before = Utc::now();

    engine.add_price(product_id, dec!(10)).await.unwrap();

    let mut stream = bus.subscribe(&[PRICE_EVENTS_TOPIC]).await.unwrap();
    engine
        .update_price(PriceUpdateRequest {
            product_id,
            new_price: dec!(20),
        })
        .await
        .unwrap();

    // The new base is visible to reads.
    let response = engine.get_price(product_id).await.unwrap();
    assert_eq!(response.current_price, dec!(20));

    // Exactly one PriceUpdated crossed the bus, with a plausible timestamp.
    let envelope = stream.next().await.unwrap().unwrap();
    let event: PriceUpdated = envelope.decode().unwrap();
    assert_eq!(event.product_id, product_id);
    assert_eq!(event.new_price, dec!(20));
    assert!(event.updated_at >= before);

    let no_more =
        tokio::time::timeout(std::time::Duration::from_millis(50), stream.next()).await;
    assert!(no_more.is_err(), "expected no second event");
}

#[tokio::test]
async fn update_price_for_unknown_product_is_silent_and_publishes_nothing() {
    let bus = Arc::new(InMemoryEventBus::new());
    let engine = engine_with(InMemoryPriceStore::new(), bus.clone());

    let mut stream = bus.subscribe(&[PRICE_EVENTS_TOPIC]).await.unwrap();
    engine
        .update_price(PriceUpdateRequest {
            product_id: Uuid::new_v4(),
            new_price: dec!(20),
        })
        .await
        .unwrap();

    let nothing =
        tokio::time::timeout(std::time::Duration::from_millis(50), stream.next()).await;
    assert!(nothing.is_err(), "no event expected for unknown product");
}

#[tokio::test]
async fn discounts_never_drive_price_below_zero() {
    let engine = engine_with(InMemoryPriceStore::new(), Arc::new(InMemoryEventBus::new()));
    let product_id = Uuid::new_v4();
    let now = Utc::now();

    engine.add_price(product_id, dec!(10)).await.unwrap();
    engine
        .apply_discount(DiscountApplyRequest {
            product_id,
            kind: DiscountKind::Fixed,
            value: dec!(25),
            starts_at: now - Duration::hours(1),
            ends_at: now + Duration::days(1),
        })
        .await
        .unwrap();

    let response = engine.get_price(product_id).await.unwrap();
    assert_eq!(response.discounted_price, dec!(0));
}

#[tokio::test]
async fn future_discount_activates_once_window_opens() {
    let engine = engine_with(InMemoryPriceStore::new(), Arc::new(InMemoryEventBus::new()));
    let product_id = Uuid::new_v4();
    let now = Utc::now();

    engine.add_price(product_id, dec!(100)).await.unwrap();
    engine
        .apply_discount(DiscountApplyRequest {
            product_id,
            kind: DiscountKind::Percentage,
            value: dec!(50),
            starts_at: now + Duration::days(1),
            ends_at: now + Duration::days(2),
        })
        .await
        .unwrap();

    // Window not open yet: full price.
    let response = engine.get_price(product_id).await.unwrap();
    assert_eq!(response.discounted_price, dec!(100));
    assert!(response.active_discounts.is_empty());
}

#[tokio::test]
async fn add_price_twice_overwrites_rather_than_duplicates() {
    let store = InMemoryPriceStore::new();
    let engine = engine_with(store.clone(), Arc::new(InMemoryEventBus::new()));
    let product_id = Uuid::new_v4();

    engine.add_price(product_id, dec!(10)).await.unwrap();
    engine.add_price(product_id, dec!(10)).await.unwrap();

    assert_eq!(store.price_count(), 1);
    let response = engine.get_price(product_id).await.unwrap();
    assert_eq!(response.current_price, dec!(10));
}
