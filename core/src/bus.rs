//! Event bus abstraction for cross-service choreography.
//!
//! Services never talk to each other's stores. State changes are announced
//! as events published to named topics; interested services subscribe and
//! react. The bus provides **at-least-once** delivery: a message may be
//! delivered more than once, so consumers must be idempotent (see
//! [`crate::dedup::SeenEvents`] and upsert-style writes).
//!
//! # Topic Naming Convention
//!
//! Topics follow the pattern `{aggregate}-events`:
//! - `product-events` — catalog lifecycle events
//! - `price-events` — pricing lifecycle events
//!
//! # Implementations
//!
//! - `KafkaEventBus` (in `shoply-bus`) — production transport with manual
//!   offset commits
//! - `InMemoryEventBus` (in `shoply-bus`) — for tests, synchronous fan-out
//!
//! # Example
//!
//! ```rust,ignore
//! use futures::StreamExt;
//!
//! let envelope = EventEnvelope::from_event(&ProductAdded { id, price })?;
//! bus.publish(PRODUCT_EVENTS_TOPIC, &envelope).await?;
//!
//! let mut stream = bus.subscribe(&[PRODUCT_EVENTS_TOPIC]).await?;
//! while let Some(result) = stream.next().await {
//!     match result {
//!         Ok(envelope) => handle(envelope),
//!         Err(e) => tracing::error!("stream error: {e}"),
//!     }
//! }
//! ```

use crate::event::EventEnvelope;
use futures::Stream;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors that can occur during event bus operations.
#[derive(Error, Debug, Clone)]
pub enum EventBusError {
    /// Failed to connect to the event bus.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Failed to publish an event to a topic.
    #[error("Publish failed for topic '{topic}': {reason}")]
    PublishFailed {
        /// The topic that failed.
        topic: String,
        /// The reason for failure.
        reason: String,
    },

    /// Failed to subscribe to topics.
    #[error("Subscription failed for topics {topics:?}: {reason}")]
    SubscriptionFailed {
        /// The topics that failed to subscribe.
        topics: Vec<String>,
        /// The reason for failure.
        reason: String,
    },

    /// Failed to deserialize a received message.
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    /// Network or transport error.
    #[error("Transport error: {0}")]
    TransportError(String),
}

/// Stream of envelopes from a subscription.
///
/// Each item is a `Result` so transport hiccups surface inline without
/// tearing the stream down; consumers log errors and keep reading.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<EventEnvelope, EventBusError>> + Send>>;

/// Trait for event bus implementations.
///
/// # Design Principles
///
/// - **Async-first**: all operations are non-blocking
/// - **At-least-once**: subscribers may receive duplicate envelopes and
///   must deduplicate by [`EventEnvelope::event_id`]
/// - **No ordering across topics**: only per-partition ordering is
///   provided by transports that support it
///
/// # Dyn Compatibility
///
/// Methods return explicit `Pin<Box<dyn Future>>` instead of `async fn` so
/// the bus can be held as `Arc<dyn EventBus>` by engines and consumers.
pub trait EventBus: Send + Sync {
    /// Publish an envelope to a topic.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::PublishFailed`] if delivery to the
    /// transport fails.
    fn publish(
        &self,
        topic: &str,
        envelope: &EventEnvelope,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>>;

    /// Subscribe to one or more topics and receive a stream of envelopes.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::SubscriptionFailed`] if the subscription
    /// cannot be established.
    fn subscribe(
        &self,
        topics: &[&str],
    ) -> Pin<Box<dyn Future<Output = Result<EventStream, EventBusError>> + Send + '_>>;
}
