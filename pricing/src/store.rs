//! Price and discount persistence.
//!
//! [`PriceStore`] is the seam between the engine and storage:
//! [`PgPriceStore`] is the production implementation, [`InMemoryPriceStore`]
//! backs tests. Both uphold the same contract:
//!
//! - `upsert_price` absorbs duplicate `ProductAdded` deliveries
//! - `update_price` reports whether a row was actually touched
//! - `active_discounts` returns discounts whose window contains `now`,
//!   ordered by `created_at` — the canonical compounding order

use crate::error::PricingError;
use crate::models::{Discount, DiscountKind, ProductPrice};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Storage operations the pricing engine needs.
#[async_trait]
pub trait PriceStore: Send + Sync {
    /// Insert a price record, overwriting any existing record for the same
    /// product (idempotent under duplicate event delivery).
    async fn upsert_price(&self, price: &ProductPrice) -> Result<(), PricingError>;

    /// Load the price record for a product, if any.
    async fn get_price(&self, product_id: Uuid) -> Result<Option<ProductPrice>, PricingError>;

    /// Overwrite the base price of an existing record.
    ///
    /// Returns `false` when no record exists (the caller decides whether
    /// that is an error; the update path treats it as a silent no-op).
    async fn update_price(
        &self,
        product_id: Uuid,
        new_price: Decimal,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, PricingError>;

    /// Persist a new discount.
    async fn add_discount(&self, discount: &Discount) -> Result<(), PricingError>;

    /// Discounts for a product whose active window contains `now`,
    /// ordered by creation time ascending.
    async fn active_discounts(
        &self,
        product_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<Discount>, PricingError>;
}

/// PostgreSQL-backed [`PriceStore`].
#[derive(Clone)]
pub struct PgPriceStore {
    pool: PgPool,
}

impl PgPriceStore {
    /// Create a store over an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run the pricing schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Database`] when migration fails.
    pub async fn migrate(&self) -> Result<(), PricingError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| PricingError::Database(format!("migration failed: {e}")))?;
        Ok(())
    }

    fn row_to_discount(row: &PgRow) -> Result<Discount, PricingError> {
        let kind_str: String = row
            .try_get("kind")
            .map_err(|e| PricingError::Database(e.to_string()))?;
        let kind = DiscountKind::parse(&kind_str)
            .ok_or_else(|| PricingError::Database(format!("invalid discount kind: {kind_str}")))?;

        Ok(Discount {
            discount_id: row
                .try_get("discount_id")
                .map_err(|e| PricingError::Database(e.to_string()))?,
            product_id: row
                .try_get("product_id")
                .map_err(|e| PricingError::Database(e.to_string()))?,
            kind,
            value: row
                .try_get("value")
                .map_err(|e| PricingError::Database(e.to_string()))?,
            starts_at: row
                .try_get("starts_at")
                .map_err(|e| PricingError::Database(e.to_string()))?,
            ends_at: row
                .try_get("ends_at")
                .map_err(|e| PricingError::Database(e.to_string()))?,
            is_active: row
                .try_get("is_active")
                .map_err(|e| PricingError::Database(e.to_string()))?,
            created_at: row
                .try_get("created_at")
                .map_err(|e| PricingError::Database(e.to_string()))?,
        })
    }
}

#[async_trait]
impl PriceStore for PgPriceStore {
    async fn upsert_price(&self, price: &ProductPrice) -> Result<(), PricingError> {
        sqlx::query(
            r"
            INSERT INTO product_prices (product_id, price, discounted_price, last_updated)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (product_id) DO UPDATE SET
                price = EXCLUDED.price,
                discounted_price = EXCLUDED.discounted_price,
                last_updated = EXCLUDED.last_updated
            ",
        )
        .bind(price.product_id)
        .bind(price.price)
        .bind(price.discounted_price)
        .bind(price.last_updated)
        .execute(&self.pool)
        .await
        .map_err(|e| PricingError::Database(e.to_string()))?;

        Ok(())
    }

    async fn get_price(&self, product_id: Uuid) -> Result<Option<ProductPrice>, PricingError> {
        let row: Option<(Uuid, Decimal, Option<Decimal>, DateTime<Utc>)> = sqlx::query_as(
            r"
            SELECT product_id, price, discounted_price, last_updated
            FROM product_prices
            WHERE product_id = $1
            ",
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PricingError::Database(e.to_string()))?;

        Ok(row.map(
            |(product_id, price, discounted_price, last_updated)| ProductPrice {
                product_id,
                price,
                discounted_price,
                last_updated,
            },
        ))
    }

    async fn update_price(
        &self,
        product_id: Uuid,
        new_price: Decimal,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, PricingError> {
        let result = sqlx::query(
            r"
            UPDATE product_prices
            SET price = $2, last_updated = $3
            WHERE product_id = $1
            ",
        )
        .bind(product_id)
        .bind(new_price)
        .bind(updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| PricingError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn add_discount(&self, discount: &Discount) -> Result<(), PricingError> {
        sqlx::query(
            r"
            INSERT INTO discounts
                (discount_id, product_id, kind, value, starts_at, ends_at, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(discount.discount_id)
        .bind(discount.product_id)
        .bind(discount.kind.as_str())
        .bind(discount.value)
        .bind(discount.starts_at)
        .bind(discount.ends_at)
        .bind(discount.is_active)
        .bind(discount.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| PricingError::Database(e.to_string()))?;

        tracing::debug!(
            discount_id = %discount.discount_id,
            product_id = %discount.product_id,
            kind = discount.kind.as_str(),
            "Discount persisted"
        );

        Ok(())
    }

    async fn active_discounts(
        &self,
        product_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<Discount>, PricingError> {
        let rows = sqlx::query(
            r"
            SELECT discount_id, product_id, kind, value, starts_at, ends_at, is_active, created_at
            FROM discounts
            WHERE product_id = $1
              AND is_active
              AND starts_at <= $2
              AND ends_at >= $2
            ORDER BY created_at ASC
            ",
        )
        .bind(product_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PricingError::Database(e.to_string()))?;

        rows.iter().map(Self::row_to_discount).collect()
    }
}

/// In-memory [`PriceStore`] for tests.
///
/// Cloning shares the underlying maps, so a test can hand one clone to the
/// engine and keep one for assertions.
#[derive(Clone, Default)]
pub struct InMemoryPriceStore {
    prices: Arc<RwLock<HashMap<Uuid, ProductPrice>>>,
    discounts: Arc<RwLock<Vec<Discount>>>,
}

impl InMemoryPriceStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of price records (for test assertions).
    #[must_use]
    pub fn price_count(&self) -> usize {
        self.prices.read().map(|prices| prices.len()).unwrap_or(0)
    }

    /// Number of stored discounts, active or not (for test assertions).
    #[must_use]
    pub fn discount_count(&self) -> usize {
        self.discounts
            .read()
            .map(|discounts| discounts.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl PriceStore for InMemoryPriceStore {
    async fn upsert_price(&self, price: &ProductPrice) -> Result<(), PricingError> {
        let mut prices = self
            .prices
            .write()
            .map_err(|e| PricingError::Database(format!("lock poisoned: {e}")))?;
        prices.insert(price.product_id, price.clone());
        Ok(())
    }

    async fn get_price(&self, product_id: Uuid) -> Result<Option<ProductPrice>, PricingError> {
        let prices = self
            .prices
            .read()
            .map_err(|e| PricingError::Database(format!("lock poisoned: {e}")))?;
        Ok(prices.get(&product_id).cloned())
    }

    async fn update_price(
        &self,
        product_id: Uuid,
        new_price: Decimal,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, PricingError> {
        let mut prices = self
            .prices
            .write()
            .map_err(|e| PricingError::Database(format!("lock poisoned: {e}")))?;
        match prices.get_mut(&product_id) {
            Some(record) => {
                record.price = new_price;
                record.last_updated = updated_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn add_discount(&self, discount: &Discount) -> Result<(), PricingError> {
        let mut discounts = self
            .discounts
            .write()
            .map_err(|e| PricingError::Database(format!("lock poisoned: {e}")))?;
        discounts.push(discount.clone());
        Ok(())
    }

    async fn active_discounts(
        &self,
        product_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<Discount>, PricingError> {
        let discounts = self
            .discounts
            .read()
            .map_err(|e| PricingError::Database(format!("lock poisoned: {e}")))?;
        let mut matching: Vec<Discount> = discounts
            .iter()
            .filter(|d| d.product_id == product_id && d.applies_at(now))
            .cloned()
            .collect();
        matching.sort_by_key(|d| d.created_at);
        Ok(matching)
    }
}
