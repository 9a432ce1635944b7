//! `ProductAdded` consumer.
//!
//! Subscribes to `product-events` and seeds a price record for every new
//! product. The loop never dies on a bad message: transport errors,
//! duplicate deliveries, unknown event types, and handler failures are all
//! logged and skipped, leaving retry to the bus's redelivery.

use crate::engine::PricingEngine;
use crate::error::PricingError;
use crate::metrics::PricingMetrics;
use futures::StreamExt;
use shoply_core::bus::EventBus;
use shoply_core::contracts::{PRODUCT_EVENTS_TOPIC, ProductAdded};
use shoply_core::dedup::SeenEvents;
use shoply_core::event::EventEnvelope;
use std::sync::Arc;

/// How many processed event ids the dedup window remembers.
const DEDUP_WINDOW: usize = 1024;

/// Run the consumer until the subscription stream ends.
///
/// # Errors
///
/// Returns [`PricingError::Bus`] only if the initial subscription cannot be
/// established; per-event failures never propagate.
pub async fn run(engine: Arc<PricingEngine>, bus: Arc<dyn EventBus>) -> Result<(), PricingError> {
    let mut stream = bus.subscribe(&[PRODUCT_EVENTS_TOPIC]).await?;
    let mut seen = SeenEvents::new(DEDUP_WINDOW);
    let metrics = PricingMetrics::new();

    tracing::info!(topic = PRODUCT_EVENTS_TOPIC, "Pricing consumer started");

    while let Some(result) = stream.next().await {
        match result {
            Ok(envelope) => handle_envelope(&engine, &metrics, &mut seen, envelope).await,
            Err(e) => {
                tracing::error!(error = %e, "Event stream error");
            }
        }
    }

    tracing::warn!("Pricing consumer stream ended");
    Ok(())
}

async fn handle_envelope(
    engine: &PricingEngine,
    metrics: &PricingMetrics,
    seen: &mut SeenEvents,
    envelope: EventEnvelope,
) {
    if envelope.event_type != ProductAdded::EVENT_TYPE {
        tracing::debug!(event_type = %envelope.event_type, "Ignoring unrelated event");
        return;
    }

    if !seen.insert(envelope.event_id) {
        tracing::debug!(event_id = %envelope.event_id, "Skipping duplicate delivery");
        metrics.event_skipped(ProductAdded::EVENT_TYPE);
        return;
    }

    let event: ProductAdded = match envelope.decode() {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(
                event_id = %envelope.event_id,
                error = %e,
                "Dropping undecodable ProductAdded event"
            );
            metrics.event_skipped(ProductAdded::EVENT_TYPE);
            return;
        }
    };

    match engine.add_price(event.id, event.price).await {
        Ok(()) => {
            metrics.event_consumed(ProductAdded::EVENT_TYPE);
            tracing::info!(
                product_id = %event.id,
                price = %event.price,
                "Price seeded from ProductAdded"
            );
        }
        Err(e) => {
            tracing::error!(
                product_id = %event.id,
                error = %e,
                "Failed to seed price from ProductAdded"
            );
            metrics.event_skipped(ProductAdded::EVENT_TYPE);
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::store::{InMemoryPriceStore, PriceStore};
    use rust_decimal_macros::dec;
    use shoply_bus::InMemoryEventBus;
    use std::time::Duration;
    use uuid::Uuid;

    async fn wait_for<F: Fn() -> bool>(condition: F) {
        for _ in 0..100 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn seeds_price_from_product_added() {
        let store = InMemoryPriceStore::new();
        let bus = Arc::new(InMemoryEventBus::new());
        let engine = Arc::new(PricingEngine::new(
            Arc::new(store.clone()),
            bus.clone() as Arc<dyn EventBus>,
        ));

        let consumer_bus: Arc<dyn EventBus> = bus.clone();
        let consumer = tokio::spawn(run(engine, consumer_bus));
        // Let the consumer subscribe before publishing.
        tokio::time::sleep(Duration::from_millis(10)).await;

        let product_id = Uuid::new_v4();
        let envelope = EventEnvelope::from_event(&ProductAdded {
            id: product_id,
            price: dec!(10),
        })
        .unwrap();
        bus.publish(PRODUCT_EVENTS_TOPIC, &envelope).await.unwrap();

        wait_for(|| store.price_count() == 1).await;
        let record = store.get_price(product_id).await.unwrap().unwrap();
        assert_eq!(record.price, dec!(10));
        assert_eq!(record.discounted_price, Some(dec!(10)));

        consumer.abort();
    }

    #[tokio::test]
    async fn duplicate_delivery_creates_one_record() {
        let store = InMemoryPriceStore::new();
        let bus = Arc::new(InMemoryEventBus::new());
        let engine = Arc::new(PricingEngine::new(
            Arc::new(store.clone()),
            bus.clone() as Arc<dyn EventBus>,
        ));

        let consumer = tokio::spawn(run(engine, bus.clone() as Arc<dyn EventBus>));
        tokio::time::sleep(Duration::from_millis(10)).await;

        let envelope = EventEnvelope::from_event(&ProductAdded {
            id: Uuid::new_v4(),
            price: dec!(25),
        })
        .unwrap();

        // Same envelope delivered twice, as the bus is allowed to do.
        bus.publish(PRODUCT_EVENTS_TOPIC, &envelope).await.unwrap();
        bus.publish(PRODUCT_EVENTS_TOPIC, &envelope).await.unwrap();

        wait_for(|| store.price_count() == 1).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(store.price_count(), 1);

        consumer.abort();
    }

    #[tokio::test]
    async fn unrelated_events_are_ignored() {
        let store = InMemoryPriceStore::new();
        let bus = Arc::new(InMemoryEventBus::new());
        let engine = Arc::new(PricingEngine::new(
            Arc::new(store.clone()),
            bus.clone() as Arc<dyn EventBus>,
        ));

        let consumer = tokio::spawn(run(engine, bus.clone() as Arc<dyn EventBus>));
        tokio::time::sleep(Duration::from_millis(10)).await;

        let envelope = EventEnvelope {
            event_id: Uuid::new_v4(),
            event_type: "SomethingElse.v1".to_string(),
            data: b"{}".to_vec(),
            occurred_at: chrono::Utc::now(),
        };
        bus.publish(PRODUCT_EVENTS_TOPIC, &envelope).await.unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(store.price_count(), 0);

        consumer.abort();
    }
}
