//! Product persistence.

use crate::error::ProductError;
use crate::models::Product;
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Storage operations the product engine needs.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// All products, unordered.
    async fn list(&self) -> Result<Vec<Product>, ProductError>;

    /// Load one product, if it exists.
    async fn get(&self, id: Uuid) -> Result<Option<Product>, ProductError>;

    /// Persist a new product.
    async fn insert(&self, product: &Product) -> Result<(), ProductError>;

    /// Overwrite an existing product. Returns `false` when absent.
    async fn update(&self, product: &Product) -> Result<bool, ProductError>;

    /// Overwrite only the cached price. Returns `false` when absent.
    async fn update_price(&self, id: Uuid, price: Decimal) -> Result<bool, ProductError>;

    /// Delete a product. Returns `false` when absent.
    async fn delete(&self, id: Uuid) -> Result<bool, ProductError>;
}

/// PostgreSQL-backed [`ProductStore`].
#[derive(Clone)]
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    /// Create a store over an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run the product schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`ProductError::Database`] when migration fails.
    pub async fn migrate(&self) -> Result<(), ProductError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| ProductError::Database(format!("migration failed: {e}")))?;
        Ok(())
    }
}

type ProductRow = (Uuid, String, Decimal, String);

fn row_to_product((id, name, price, user_id): ProductRow) -> Product {
    Product {
        id,
        name,
        price,
        user_id,
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn list(&self) -> Result<Vec<Product>, ProductError> {
        let rows: Vec<ProductRow> =
            sqlx::query_as("SELECT id, name, price, user_id FROM products")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| ProductError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(row_to_product).collect())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Product>, ProductError> {
        let row: Option<ProductRow> =
            sqlx::query_as("SELECT id, name, price, user_id FROM products WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| ProductError::Database(e.to_string()))?;

        Ok(row.map(row_to_product))
    }

    async fn insert(&self, product: &Product) -> Result<(), ProductError> {
        sqlx::query(
            r"
            INSERT INTO products (id, name, price, user_id)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(product.price)
        .bind(&product.user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| ProductError::Database(e.to_string()))?;

        Ok(())
    }

    async fn update(&self, product: &Product) -> Result<bool, ProductError> {
        let result = sqlx::query(
            r"
            UPDATE products
            SET name = $2, price = $3, user_id = $4
            WHERE id = $1
            ",
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(product.price)
        .bind(&product.user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| ProductError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_price(&self, id: Uuid, price: Decimal) -> Result<bool, ProductError> {
        let result = sqlx::query("UPDATE products SET price = $2 WHERE id = $1")
            .bind(id)
            .bind(price)
            .execute(&self.pool)
            .await
            .map_err(|e| ProductError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ProductError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| ProductError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}

/// In-memory [`ProductStore`] for tests.
#[derive(Clone, Default)]
pub struct InMemoryProductStore {
    products: Arc<RwLock<HashMap<Uuid, Product>>>,
}

impl InMemoryProductStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of products (for test assertions).
    #[must_use]
    pub fn count(&self) -> usize {
        self.products
            .read()
            .map(|products| products.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn list(&self) -> Result<Vec<Product>, ProductError> {
        let products = self
            .products
            .read()
            .map_err(|e| ProductError::Database(format!("lock poisoned: {e}")))?;
        Ok(products.values().cloned().collect())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Product>, ProductError> {
        let products = self
            .products
            .read()
            .map_err(|e| ProductError::Database(format!("lock poisoned: {e}")))?;
        Ok(products.get(&id).cloned())
    }

    async fn insert(&self, product: &Product) -> Result<(), ProductError> {
        let mut products = self
            .products
            .write()
            .map_err(|e| ProductError::Database(format!("lock poisoned: {e}")))?;
        products.insert(product.id, product.clone());
        Ok(())
    }

    async fn update(&self, product: &Product) -> Result<bool, ProductError> {
        let mut products = self
            .products
            .write()
            .map_err(|e| ProductError::Database(format!("lock poisoned: {e}")))?;
        match products.get_mut(&product.id) {
            Some(existing) => {
                *existing = product.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_price(&self, id: Uuid, price: Decimal) -> Result<bool, ProductError> {
        let mut products = self
            .products
            .write()
            .map_err(|e| ProductError::Database(format!("lock poisoned: {e}")))?;
        match products.get_mut(&id) {
            Some(existing) => {
                existing.price = price;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ProductError> {
        let mut products = self
            .products
            .write()
            .map_err(|e| ProductError::Database(format!("lock poisoned: {e}")))?;
        Ok(products.remove(&id).is_some())
    }
}
