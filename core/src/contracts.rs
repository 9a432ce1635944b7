//! Event contracts shared by the Shoply services.
//!
//! Exactly two message types cross the bus. Each is routed to one topic and
//! consumed by one service:
//!
//! | event | topic | published by | consumed by |
//! |---|---|---|---|
//! | [`ProductAdded`] | `product-events` | product | pricing |
//! | [`PriceUpdated`] | `price-events` | pricing | product |
//!
//! Payloads are JSON; see [`crate::event::EventEnvelope`] for the wire
//! framing. Changing a field here is a cross-service schema change — bump
//! the `.v1` suffix.

use crate::event::Event;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Topic carrying catalog lifecycle events.
pub const PRODUCT_EVENTS_TOPIC: &str = "product-events";

/// Topic carrying pricing lifecycle events.
pub const PRICE_EVENTS_TOPIC: &str = "price-events";

/// Consumer group used by the pricing service for `product-events`.
pub const PRICING_CONSUMER_GROUP: &str = "pricing-product-added";

/// Consumer group used by the product service for `price-events`.
pub const PRODUCT_CONSUMER_GROUP: &str = "product-price-updated";

/// A product was created in the catalog.
///
/// The pricing service reacts by creating the initial price record for the
/// product, seeded with the price the seller entered.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ProductAdded {
    /// Catalog id of the new product.
    pub id: Uuid,
    /// Price entered at creation time, used to seed the price record.
    pub price: Decimal,
}

impl Event for ProductAdded {
    fn event_type(&self) -> &'static str {
        Self::EVENT_TYPE
    }
}

impl ProductAdded {
    /// Stable type identifier, usable for consumer-side dispatch without an
    /// instance.
    pub const EVENT_TYPE: &'static str = "ProductAdded.v1";
}

/// A product's authoritative price changed.
///
/// The product service reacts by overwriting its denormalized price copy,
/// keeping product listings eventually consistent with pricing.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PriceUpdated {
    /// The product whose price changed.
    pub product_id: Uuid,
    /// The new authoritative base price.
    pub new_price: Decimal,
    /// When the pricing service applied the change.
    pub updated_at: DateTime<Utc>,
}

impl Event for PriceUpdated {
    fn event_type(&self) -> &'static str {
        Self::EVENT_TYPE
    }
}

impl PriceUpdated {
    /// Stable type identifier, usable for consumer-side dispatch without an
    /// instance.
    pub const EVENT_TYPE: &'static str = "PriceUpdated.v1";
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::event::EventEnvelope;
    use rust_decimal_macros::dec;

    #[test]
    fn product_added_roundtrip() {
        let event = ProductAdded {
            id: Uuid::new_v4(),
            price: dec!(19.99),
        };

        let envelope = EventEnvelope::from_event(&event).unwrap();
        assert_eq!(envelope.event_type, ProductAdded::EVENT_TYPE);

        let decoded: ProductAdded = envelope.decode().unwrap();
        assert_eq!(decoded, event);
    }

    #[test]
    fn price_updated_roundtrip() {
        let event = PriceUpdated {
            product_id: Uuid::new_v4(),
            new_price: dec!(42),
            updated_at: Utc::now(),
        };

        let envelope = EventEnvelope::from_event(&event).unwrap();
        let decoded: PriceUpdated = envelope.decode().unwrap();
        assert_eq!(decoded, event);
    }

    #[test]
    fn decimal_serializes_as_json_string() {
        // Pin the wire representation: rust_decimal serializes as a string,
        // which is what non-Rust consumers of the topics expect.
        let event = ProductAdded {
            id: Uuid::new_v4(),
            price: dec!(10.50),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["price"], "10.50");
    }
}
