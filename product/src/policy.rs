//! Price-change discount policy.
//!
//! When a product's price is edited, the shop runs a promotional discount
//! on it. The rule itself — kind, size, duration — is a value handed to
//! the engine, not an inline constant, so deployments can change or
//! disable it without touching the update path.

use crate::client::{DiscountKind, DiscountRequest};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// The discount applied automatically after a price change.
#[derive(Clone, Debug, PartialEq)]
pub struct DiscountPolicy {
    /// Percentage or fixed.
    pub kind: DiscountKind,
    /// Percent points or flat amount.
    pub value: Decimal,
    /// How long the discount stays active from the moment of the change.
    pub duration: Duration,
}

impl DiscountPolicy {
    /// The default shop promotion: 10% off for 30 days.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            kind: DiscountKind::Percentage,
            value: Decimal::from(10),
            duration: Duration::days(30),
        }
    }

    /// Materialize the policy into a discount request starting at `now`.
    #[must_use]
    pub fn request_for(&self, product_id: Uuid, now: DateTime<Utc>) -> DiscountRequest {
        DiscountRequest {
            product_id,
            kind: self.kind,
            value: self.value,
            starts_at: now,
            ends_at: now + self.duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_policy_is_ten_percent_for_thirty_days() {
        let policy = DiscountPolicy::standard();
        assert_eq!(policy.kind, DiscountKind::Percentage);
        assert_eq!(policy.value, Decimal::from(10));
        assert_eq!(policy.duration, Duration::days(30));
    }

    #[test]
    fn request_window_starts_now() {
        let policy = DiscountPolicy::standard();
        let now = Utc::now();
        let product_id = Uuid::new_v4();

        let request = policy.request_for(product_id, now);

        assert_eq!(request.product_id, product_id);
        assert_eq!(request.starts_at, now);
        assert_eq!(request.ends_at, now + Duration::days(30));
    }
}
