//! # Shoply Pricing Service
//!
//! Owns price and discount state. Reacts to `ProductAdded` events by
//! creating the initial price record, serves authoritative
//! price-with-discounts lookups over HTTP, and announces every price
//! change as a `PriceUpdated` event.
//!
//! Module layout mirrors the request path: [`routes`] → [`engine`] →
//! [`store`], with [`consumer`] feeding the engine from the bus.

pub mod config;
pub mod consumer;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod models;
pub mod routes;
pub mod store;

pub use config::PricingConfig;
pub use engine::PricingEngine;
pub use error::PricingError;
pub use store::{InMemoryPriceStore, PgPriceStore, PriceStore};
