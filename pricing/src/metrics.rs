//! Pricing service metric instruments.
//!
//! Thin wrapper over the `metrics` macros so engine code reads as business
//! logic. Series names are registered with descriptions in
//! `shoply-telemetry`.

use metrics::{counter, gauge, histogram};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Counters, gauges, and histograms the pricing service emits.
#[derive(Clone, Copy, Debug, Default)]
pub struct PricingMetrics;

impl PricingMetrics {
    /// Create the instrument set.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// A price record was created from a `ProductAdded` event.
    pub fn price_added(&self) {
        counter!("prices_added_total").increment(1);
    }

    /// A price update call completed (whether or not a row was touched).
    pub fn price_updated(&self) {
        counter!("prices_updated_total").increment(1);
    }

    /// A discount was applied to a product.
    pub fn discount_applied(&self) {
        counter!("discounts_applied_total").increment(1);
    }

    /// One more discount is live.
    pub fn active_discounts_increased(&self) {
        gauge!("active_discounts").increment(1.0);
    }

    /// Record the amount a price was set to.
    pub fn record_price_amount(&self, amount: Decimal) {
        histogram!("price_amount").record(amount.to_f64().unwrap_or(0.0));
    }

    /// Record how many price changes one update call carried.
    pub fn record_price_change_frequency(&self, changes: u32) {
        histogram!("price_change_frequency").record(f64::from(changes));
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
