//! Product service metric instruments.

use metrics::{counter, gauge, histogram};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Counters, gauges, and histograms the product service emits.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProductMetrics;

impl ProductMetrics {
    /// Create the instrument set.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// A product was created.
    pub fn product_added(&self) {
        counter!("products_added_total").increment(1);
    }

    /// A product was updated.
    pub fn product_updated(&self) {
        counter!("products_updated_total").increment(1);
    }

    /// A product was deleted.
    pub fn product_deleted(&self) {
        counter!("products_deleted_total").increment(1);
    }

    /// One more product is in the catalog.
    pub fn products_increased(&self) {
        gauge!("products_total").increment(1.0);
    }

    /// One fewer product is in the catalog.
    pub fn products_decreased(&self) {
        gauge!("products_total").decrement(1.0);
    }

    /// Record a product's price at write time.
    pub fn record_product_price(&self, price: Decimal) {
        histogram!("product_price").record(price.to_f64().unwrap_or(0.0));
    }

    /// An event was consumed and handled.
    pub fn event_consumed(&self, event_type: &'static str) {
        counter!("events_consumed_total", "event_type" => event_type).increment(1);
    }

    /// An event was skipped (duplicate or handler error).
    pub fn event_skipped(&self, event_type: &'static str) {
        counter!("events_skipped_total", "event_type" => event_type).increment(1);
    }
}
