//! The pricing engine: price lifecycle and discount calculation.

use crate::error::PricingError;
use crate::metrics::PricingMetrics;
use crate::models::{
    Discount, DiscountApplyRequest, PriceResponse, PriceUpdateRequest, ProductPrice,
};
use crate::store::PriceStore;
use chrono::Utc;
use rust_decimal::Decimal;
use shoply_core::bus::EventBus;
use shoply_core::contracts::{PRICE_EVENTS_TOPIC, PriceUpdated};
use shoply_core::event::EventEnvelope;
use std::sync::Arc;
use uuid::Uuid;

/// Fold a list of discounts over a base price.
///
/// Discounts compound sequentially in the order given (the store returns
/// them in creation order): a percentage discount subtracts that share of
/// the *running* price, a fixed discount subtracts a flat amount. The
/// result is clamped at zero — stacked discounts can never make a price
/// negative.
#[must_use]
pub fn apply_discounts(base: Decimal, discounts: &[Discount]) -> Decimal {
    let discounted = discounts.iter().fold(base, |running, discount| {
        match discount.kind {
            crate::models::DiscountKind::Percentage => {
                running - running * discount.value / Decimal::ONE_HUNDRED
            }
            crate::models::DiscountKind::Fixed => running - discount.value,
        }
    });
    discounted.max(Decimal::ZERO)
}

/// Owns price and discount state and the events that flow from it.
///
/// All handlers and consumers share one engine via `Arc`.
pub struct PricingEngine {
    store: Arc<dyn PriceStore>,
    bus: Arc<dyn EventBus>,
    metrics: PricingMetrics,
}

impl PricingEngine {
    /// Create an engine over a store and a bus.
    pub fn new(store: Arc<dyn PriceStore>, bus: Arc<dyn EventBus>) -> Self {
        Self {
            store,
            bus,
            metrics: PricingMetrics::new(),
        }
    }

    /// Create the initial price record for a product.
    ///
    /// Invoked when a `ProductAdded` event is consumed. The write is an
    /// upsert, so redelivered events land on the same record instead of
    /// failing on the primary key.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Database`] if the store rejects the write.
    pub async fn add_price(&self, product_id: Uuid, price: Decimal) -> Result<(), PricingError> {
        let record = ProductPrice {
            product_id,
            price,
            discounted_price: Some(price),
            last_updated: Utc::now(),
        };
        self.store.upsert_price(&record).await?;

        self.metrics.price_added();
        tracing::info!(product_id = %product_id, price = %price, "Price record created");
        Ok(())
    }

    /// The authoritative price of a product with all active discounts
    /// folded in.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::PriceNotFound`] when the product has no
    /// price record, or [`PricingError::Database`] on store failure.
    pub async fn get_price(&self, product_id: Uuid) -> Result<PriceResponse, PricingError> {
        let record = self
            .store
            .get_price(product_id)
            .await?
            .ok_or(PricingError::PriceNotFound(product_id))?;

        let active_discounts = self.store.active_discounts(product_id, Utc::now()).await?;
        let discounted_price = apply_discounts(record.price, &active_discounts);

        Ok(PriceResponse {
            product_id,
            current_price: record.price,
            discounted_price,
            active_discounts,
        })
    }

    /// Overwrite the base price of an existing record and announce the
    /// change.
    ///
    /// A missing record is a silent no-op: the price record is created by
    /// the `ProductAdded` flow, not here. Exactly one `PriceUpdated` event
    /// is published per successful update.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Database`] on store failure or
    /// [`PricingError::Publish`] if the event cannot be published.
    pub async fn update_price(&self, request: PriceUpdateRequest) -> Result<(), PricingError> {
        let updated_at = Utc::now();
        let touched = self
            .store
            .update_price(request.product_id, request.new_price, updated_at)
            .await?;

        if touched {
            self.metrics.record_price_amount(request.new_price);
            self.metrics.record_price_change_frequency(1);

            let event = PriceUpdated {
                product_id: request.product_id,
                new_price: request.new_price,
                updated_at,
            };
            let envelope = EventEnvelope::from_event(&event)?;
            self.bus.publish(PRICE_EVENTS_TOPIC, &envelope).await?;

            tracing::info!(
                product_id = %request.product_id,
                new_price = %request.new_price,
                "Price updated and PriceUpdated published"
            );
        } else {
            tracing::debug!(
                product_id = %request.product_id,
                "Price update for unknown product ignored"
            );
        }

        self.metrics.price_updated();
        Ok(())
    }

    /// Attach a new discount to a product.
    ///
    /// No validation of the date window or product existence happens here;
    /// a discount for an unknown product simply never matches a price
    /// lookup.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Database`] if the store rejects the write.
    pub async fn apply_discount(&self, request: DiscountApplyRequest) -> Result<(), PricingError> {
        let discount = Discount {
            discount_id: Uuid::new_v4(),
            product_id: request.product_id,
            kind: request.kind,
            value: request.value,
            starts_at: request.starts_at,
            ends_at: request.ends_at,
            is_active: true,
            created_at: Utc::now(),
        };
        self.store.add_discount(&discount).await?;

        self.metrics.discount_applied();
        self.metrics.active_discounts_increased();
        tracing::info!(
            discount_id = %discount.discount_id,
            product_id = %discount.product_id,
            kind = discount.kind.as_str(),
            value = %discount.value,
            "Discount applied"
        );
        Ok(())
    }
}
