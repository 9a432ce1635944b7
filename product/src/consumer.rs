//! `PriceUpdated` consumer.
//!
//! Subscribes to `price-events` and keeps the denormalized price copy on
//! product rows in sync with the pricing service. Same failure policy as
//! every Shoply consumer: log, skip, keep reading.

use crate::engine::ProductEngine;
use crate::error::ProductError;
use crate::metrics::ProductMetrics;
use futures::StreamExt;
use shoply_core::bus::EventBus;
use shoply_core::contracts::{PRICE_EVENTS_TOPIC, PriceUpdated};
use shoply_core::dedup::SeenEvents;
use shoply_core::event::EventEnvelope;
use std::sync::Arc;

/// How many processed event ids the dedup window remembers.
const DEDUP_WINDOW: usize = 1024;

/// Run the consumer until the subscription stream ends.
///
/// # Errors
///
/// Returns [`ProductError::Bus`] only if the initial subscription cannot
/// be established; per-event failures never propagate.
pub async fn run(engine: Arc<ProductEngine>, bus: Arc<dyn EventBus>) -> Result<(), ProductError> {
    let mut stream = bus.subscribe(&[PRICE_EVENTS_TOPIC]).await?;
    let mut seen = SeenEvents::new(DEDUP_WINDOW);
    let metrics = ProductMetrics::new();

    tracing::info!(topic = PRICE_EVENTS_TOPIC, "Product consumer started");

    while let Some(result) = stream.next().await {
        match result {
            Ok(envelope) => handle_envelope(&engine, &metrics, &mut seen, envelope).await,
            Err(e) => {
                tracing::error!(error = %e, "Event stream error");
            }
        }
    }

    tracing::warn!("Product consumer stream ended");
    Ok(())
}

async fn handle_envelope(
    engine: &ProductEngine,
    metrics: &ProductMetrics,
    seen: &mut SeenEvents,
    envelope: EventEnvelope,
) {
    if envelope.event_type != PriceUpdated::EVENT_TYPE {
        tracing::debug!(event_type = %envelope.event_type, "Ignoring unrelated event");
        return;
    }

    if !seen.insert(envelope.event_id) {
        tracing::debug!(event_id = %envelope.event_id, "Skipping duplicate delivery");
        metrics.event_skipped(PriceUpdated::EVENT_TYPE);
        return;
    }

    let event: PriceUpdated = match envelope.decode() {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(
                event_id = %envelope.event_id,
                error = %e,
                "Dropping undecodable PriceUpdated event"
            );
            metrics.event_skipped(PriceUpdated::EVENT_TYPE);
            return;
        }
    };

    match engine
        .apply_price_update(event.product_id, event.new_price)
        .await
    {
        Ok(()) => metrics.event_consumed(PriceUpdated::EVENT_TYPE),
        Err(e) => {
            tracing::error!(
                product_id = %event.product_id,
                error = %e,
                "Failed to apply PriceUpdated"
            );
            metrics.event_skipped(PriceUpdated::EVENT_TYPE);
        }
    }
}
