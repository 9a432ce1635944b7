//! Domain types and HTTP DTOs for the pricing service.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The authoritative price record for a product.
///
/// Created when a `ProductAdded` event is consumed, mutated by price
/// updates, never independently deleted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductPrice {
    /// The product this price belongs to (unique).
    pub product_id: Uuid,
    /// Current base price.
    pub price: Decimal,
    /// Discounted price as stored at creation time. Reads recompute the
    /// effective discounted price from active discounts; this column keeps
    /// the last materialized value.
    pub discounted_price: Option<Decimal>,
    /// When the record was last written.
    pub last_updated: DateTime<Utc>,
}

/// How a discount reduces the price.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountKind {
    /// Subtract `value`% of the running price.
    Percentage,
    /// Subtract `value` as a flat amount.
    Fixed,
}

impl DiscountKind {
    /// Database string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Percentage => "percentage",
            Self::Fixed => "fixed",
        }
    }

    /// Parse from the database representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "percentage" => Some(Self::Percentage),
            "fixed" => Some(Self::Fixed),
            _ => None,
        }
    }
}

/// A discount attached to a product.
///
/// Immutable once created; `is_active` exists in the schema but no code
/// path toggles it, so deactivation happens by the window expiring.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Discount {
    /// Unique id of this discount.
    pub discount_id: Uuid,
    /// The product the discount applies to.
    pub product_id: Uuid,
    /// Percentage or fixed.
    pub kind: DiscountKind,
    /// Percent points or flat amount, depending on `kind`.
    pub value: Decimal,
    /// Start of the validity window (inclusive).
    pub starts_at: DateTime<Utc>,
    /// End of the validity window (inclusive).
    pub ends_at: DateTime<Utc>,
    /// Whether the discount participates in price calculation.
    pub is_active: bool,
    /// Creation time; defines the canonical order discounts compound in.
    pub created_at: DateTime<Utc>,
}

impl Discount {
    /// Whether the discount applies at `now`.
    #[must_use]
    pub fn applies_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.starts_at <= now && self.ends_at >= now
    }
}

/// Response for `GET /pricing/{product_id}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PriceResponse {
    /// The product looked up.
    pub product_id: Uuid,
    /// Current base price.
    pub current_price: Decimal,
    /// Base price after folding all active discounts, clamped at zero.
    pub discounted_price: Decimal,
    /// The discounts that were folded in, in application order.
    pub active_discounts: Vec<Discount>,
}

/// Request body for `PUT /pricing/update`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PriceUpdateRequest {
    /// The product whose price changes.
    pub product_id: Uuid,
    /// The new base price.
    pub new_price: Decimal,
}

/// Request body for `POST /pricing/apply-discount`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DiscountApplyRequest {
    /// The product the discount applies to.
    pub product_id: Uuid,
    /// Percentage or fixed.
    pub kind: DiscountKind,
    /// Percent points or flat amount, depending on `kind`.
    pub value: Decimal,
    /// Start of the validity window.
    pub starts_at: DateTime<Utc>,
    /// End of the validity window.
    pub ends_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn discount(starts: DateTime<Utc>, ends: DateTime<Utc>, active: bool) -> Discount {
        Discount {
            discount_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            kind: DiscountKind::Percentage,
            value: dec!(10),
            starts_at: starts,
            ends_at: ends,
            is_active: active,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn discount_kind_roundtrip() {
        assert_eq!(
            DiscountKind::parse(DiscountKind::Percentage.as_str()),
            Some(DiscountKind::Percentage)
        );
        assert_eq!(
            DiscountKind::parse(DiscountKind::Fixed.as_str()),
            Some(DiscountKind::Fixed)
        );
        assert_eq!(DiscountKind::parse("bogus"), None);
    }

    #[test]
    fn discount_kind_serializes_lowercase() {
        let json = serde_json::to_string(&DiscountKind::Percentage).unwrap();
        assert_eq!(json, "\"percentage\"");
    }

    #[test]
    fn applies_inside_window() {
        let now = Utc::now();
        let d = discount(now - Duration::days(1), now + Duration::days(1), true);
        assert!(d.applies_at(now));
    }

    #[test]
    fn does_not_apply_outside_window_or_inactive() {
        let now = Utc::now();
        let expired = discount(now - Duration::days(2), now - Duration::days(1), true);
        let future = discount(now + Duration::days(1), now + Duration::days(2), true);
        let inactive = discount(now - Duration::days(1), now + Duration::days(1), false);

        assert!(!expired.applies_at(now));
        assert!(!future.applies_at(now));
        assert!(!inactive.applies_at(now));
    }
}
