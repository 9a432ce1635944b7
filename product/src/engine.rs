//! The product engine: catalog lifecycle and price composition.

use crate::client::PricingApi;
use crate::error::ProductError;
use crate::metrics::ProductMetrics;
use crate::models::{Product, ProductWithPrice};
use crate::policy::DiscountPolicy;
use crate::store::ProductStore;
use chrono::Utc;
use rust_decimal::Decimal;
use shoply_core::bus::EventBus;
use shoply_core::contracts::{PRODUCT_EVENTS_TOPIC, ProductAdded};
use shoply_core::event::EventEnvelope;
use std::sync::Arc;
use uuid::Uuid;

/// Owns catalog state; prices are composed in from the pricing service.
pub struct ProductEngine {
    store: Arc<dyn ProductStore>,
    bus: Arc<dyn EventBus>,
    pricing: Arc<dyn PricingApi>,
    policy: Option<DiscountPolicy>,
    metrics: ProductMetrics,
}

impl ProductEngine {
    /// Create an engine.
    ///
    /// `policy` is the discount applied automatically after a price edit;
    /// `None` disables the promotion.
    pub fn new(
        store: Arc<dyn ProductStore>,
        bus: Arc<dyn EventBus>,
        pricing: Arc<dyn PricingApi>,
        policy: Option<DiscountPolicy>,
    ) -> Self {
        Self {
            store,
            bus,
            pricing,
            policy,
            metrics: ProductMetrics::new(),
        }
    }

    /// All products, straight from the store.
    ///
    /// # Errors
    ///
    /// Returns [`ProductError::Database`] on store failure.
    pub async fn list(&self) -> Result<Vec<Product>, ProductError> {
        self.store.list().await
    }

    /// One product composed with its authoritative price.
    ///
    /// Fails with `NotFound` when either the product row or its price
    /// record is missing; the two stores are eventually consistent, so a
    /// freshly created product can briefly 404 here.
    ///
    /// # Errors
    ///
    /// [`ProductError::NotFound`], [`ProductError::PriceNotFound`],
    /// [`ProductError::PricingUnavailable`], or [`ProductError::Database`].
    pub async fn get(&self, id: Uuid) -> Result<ProductWithPrice, ProductError> {
        let product = self
            .store
            .get(id)
            .await?
            .ok_or(ProductError::NotFound(id))?;

        let quote = self.pricing.get_price(id).await?;

        Ok(ProductWithPrice {
            product_id: product.id,
            name: product.name,
            price: quote.current_price,
            discounted_price: quote.discounted_price,
        })
    }

    /// Persist a new product and announce it.
    ///
    /// # Errors
    ///
    /// Returns [`ProductError::Database`] on store failure or
    /// [`ProductError::Bus`] when the `ProductAdded` event cannot be
    /// published.
    pub async fn create(&self, product: Product) -> Result<Product, ProductError> {
        self.store.insert(&product).await?;

        let event = ProductAdded {
            id: product.id,
            price: product.price,
        };
        let envelope = EventEnvelope::from_event(&event)?;
        self.bus.publish(PRODUCT_EVENTS_TOPIC, &envelope).await?;

        self.metrics.product_added();
        self.metrics.products_increased();
        tracing::info!(
            product_id = %product.id,
            price = %product.price,
            "Product created and ProductAdded published"
        );
        Ok(product)
    }

    /// Overwrite a product.
    ///
    /// The path id must match the body id; a mismatch fails before any
    /// store access. When the edit changed the price, the configured
    /// [`DiscountPolicy`] fires a synchronous discount application against
    /// the pricing service.
    ///
    /// # Errors
    ///
    /// [`ProductError::IdMismatch`], [`ProductError::NotFound`],
    /// [`ProductError::PricingUnavailable`], or [`ProductError::Database`].
    pub async fn update(&self, id: Uuid, product: Product) -> Result<(), ProductError> {
        if id != product.id {
            return Err(ProductError::IdMismatch {
                path: id,
                body: product.id,
            });
        }

        let existing = self
            .store
            .get(id)
            .await?
            .ok_or(ProductError::NotFound(id))?;

        self.store.update(&product).await?;

        if product.price != existing.price {
            if let Some(policy) = &self.policy {
                let request = policy.request_for(product.id, Utc::now());
                self.pricing.apply_discount(request).await?;
                tracing::info!(
                    product_id = %product.id,
                    old_price = %existing.price,
                    new_price = %product.price,
                    "Price changed, promotion discount applied"
                );
            }
        }

        self.metrics.product_updated();
        self.metrics.record_product_price(product.price);
        Ok(())
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// [`ProductError::NotFound`] when absent, [`ProductError::Database`]
    /// on store failure.
    pub async fn delete(&self, id: Uuid) -> Result<(), ProductError> {
        let deleted = self.store.delete(id).await?;
        if !deleted {
            return Err(ProductError::NotFound(id));
        }

        self.metrics.product_deleted();
        self.metrics.products_decreased();
        tracing::info!(product_id = %id, "Product deleted");
        Ok(())
    }

    /// Overwrite the cached price copy from a `PriceUpdated` event.
    ///
    /// A missing product is a silent no-op: the event may refer to a
    /// product deleted since, or arrive before the local row exists.
    ///
    /// # Errors
    ///
    /// Returns [`ProductError::Database`] on store failure.
    pub async fn apply_price_update(
        &self,
        product_id: Uuid,
        new_price: Decimal,
    ) -> Result<(), ProductError> {
        let touched = self.store.update_price(product_id, new_price).await?;
        if touched {
            tracing::info!(
                product_id = %product_id,
                new_price = %new_price,
                "Cached price updated from PriceUpdated"
            );
        } else {
            tracing::debug!(
                product_id = %product_id,
                "PriceUpdated for unknown product ignored"
            );
        }
        Ok(())
    }
}
