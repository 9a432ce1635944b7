//! Domain types and HTTP DTOs for the product service.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A catalog entry.
///
/// `price` is a denormalized copy of the authoritative price owned by the
/// pricing service, kept current by the `PriceUpdated` consumer. Listings
/// read it; the detail endpoint fetches the authoritative value instead.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Unique catalog id.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Cached copy of the authoritative price.
    pub price: Decimal,
    /// The user who owns the listing.
    pub user_id: String,
}

/// Response for `GET /products/{id}`: the product composed with its
/// authoritative price.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProductWithPrice {
    /// Catalog id.
    pub product_id: Uuid,
    /// Display name.
    pub name: String,
    /// Authoritative base price from the pricing service.
    pub price: Decimal,
    /// Price after active discounts.
    pub discounted_price: Decimal,
}
