//! # Shoply Core
//!
//! Shared building blocks for the Shoply services:
//!
//! - [`event`]: the [`Event`](event::Event) trait and the JSON
//!   [`EventEnvelope`](event::EventEnvelope) wire format
//! - [`bus`]: the [`EventBus`](bus::EventBus) abstraction with
//!   at-least-once delivery semantics
//! - [`contracts`]: the event types that cross service boundaries
//! - [`dedup`]: duplicate-delivery detection for consumers
//!
//! Services depend on this crate for the *contract* between them; transport
//! implementations live in `shoply-bus`.

pub mod bus;
pub mod contracts;
pub mod dedup;
pub mod event;

pub use bus::{EventBus, EventBusError, EventStream};
pub use contracts::{PRICE_EVENTS_TOPIC, PRODUCT_EVENTS_TOPIC, PriceUpdated, ProductAdded};
pub use dedup::SeenEvents;
pub use event::{Event, EventEnvelope, EventError};
