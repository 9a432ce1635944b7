//! Event trait and wire format.
//!
//! Events are immutable facts exchanged between services over the message
//! bus. They are serialized as JSON so that every consumer (including
//! non-Rust tooling tapping the topics) can read them.
//!
//! # Example
//!
//! ```
//! use shoply_core::event::{Event, EventEnvelope};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Clone, Debug, Serialize, Deserialize)]
//! struct StockDepleted { sku: String }
//!
//! impl Event for StockDepleted {
//!     fn event_type(&self) -> &'static str { "StockDepleted.v1" }
//! }
//!
//! let envelope = EventEnvelope::from_event(&StockDepleted { sku: "A-1".into() }).unwrap();
//! assert_eq!(envelope.event_type, "StockDepleted.v1");
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Error types for event (de)serialization.
#[derive(Error, Debug)]
pub enum EventError {
    /// Failed to serialize an event to JSON.
    #[error("Failed to serialize event: {0}")]
    Serialization(String),

    /// Failed to deserialize an event from JSON.
    #[error("Failed to deserialize event: {0}")]
    Deserialization(String),

    /// The envelope carried a different event type than requested.
    #[error("Unexpected event type: expected {expected}, got {actual}")]
    UnexpectedType {
        /// The event type the caller asked for.
        expected: &'static str,
        /// The event type found in the envelope.
        actual: String,
    },
}

/// An event that can cross a service boundary.
///
/// # Event Naming Convention
///
/// [`Event::event_type`] returns a stable identifier with a version suffix
/// (`"ProductAdded.v1"`) so schemas can evolve without breaking consumers.
pub trait Event: Send + Sync + 'static {
    /// Stable type identifier for this event, used for routing and
    /// consumer-side dispatch.
    fn event_type(&self) -> &'static str;

    /// Serialize this event to its JSON wire representation.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Serialization`] if the event cannot be
    /// serialized (rare with plain data types).
    fn to_json(&self) -> Result<Vec<u8>, EventError>
    where
        Self: Serialize,
    {
        serde_json::to_vec(self).map_err(|e| EventError::Serialization(e.to_string()))
    }

    /// Deserialize an event from its JSON wire representation.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Deserialization`] if the bytes are not valid
    /// JSON for this event type.
    fn from_json(bytes: &[u8]) -> Result<Self, EventError>
    where
        Self: DeserializeOwned + Sized,
    {
        serde_json::from_slice(bytes).map_err(|e| EventError::Deserialization(e.to_string()))
    }
}

/// The wire format published to the bus.
///
/// The envelope carries the payload plus the metadata consumers need to
/// dispatch and deduplicate:
///
/// - `event_id` is generated once at publish time and is the deduplication
///   key under at-least-once delivery — redelivered messages keep their id.
/// - `occurred_at` is informational; consumers must not rely on cross-topic
///   ordering.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique id of this logical event, stable across redeliveries.
    pub event_id: Uuid,

    /// The event type identifier (e.g., `"ProductAdded.v1"`).
    pub event_type: String,

    /// JSON-encoded event payload.
    pub data: Vec<u8>,

    /// When the event was created by the publisher.
    pub occurred_at: DateTime<Utc>,
}

impl EventEnvelope {
    /// Wrap an event into an envelope, generating a fresh `event_id`.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Serialization`] if the payload cannot be
    /// serialized.
    pub fn from_event<E: Event + Serialize>(event: &E) -> Result<Self, EventError> {
        Ok(Self {
            event_id: Uuid::new_v4(),
            event_type: event.event_type().to_string(),
            data: event.to_json()?,
            occurred_at: Utc::now(),
        })
    }

    /// Decode the payload as a concrete event type.
    ///
    /// The caller is expected to have matched on [`Self::event_type`]
    /// first; decoding a mismatched type fails.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Deserialization`] if the payload is not valid
    /// JSON for `E`.
    pub fn decode<E: Event + DeserializeOwned>(&self) -> Result<E, EventError> {
        E::from_json(&self.data)
    }

    /// Serialize the whole envelope for transport.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Serialization`] on encoder failure.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EventError> {
        serde_json::to_vec(self).map_err(|e| EventError::Serialization(e.to_string()))
    }

    /// Deserialize an envelope received from transport.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Deserialization`] if the bytes are not a valid
    /// envelope.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EventError> {
        serde_json::from_slice(bytes).map_err(|e| EventError::Deserialization(e.to_string()))
    }
}

impl fmt::Display for EventEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "EventEnvelope {{ id: {}, type: {}, size: {} bytes }}",
            self.event_id,
            self.event_type,
            self.data.len()
        )
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
    struct TestEvent {
        id: String,
        value: i32,
    }

    impl Event for TestEvent {
        fn event_type(&self) -> &'static str {
            "TestEvent.v1"
        }
    }

    #[test]
    fn envelope_roundtrip() {
        let event = TestEvent {
            id: "t-1".to_string(),
            value: 42,
        };

        let envelope = EventEnvelope::from_event(&event).unwrap();
        assert_eq!(envelope.event_type, "TestEvent.v1");

        let bytes = envelope.to_bytes().unwrap();
        let restored = EventEnvelope::from_bytes(&bytes).unwrap();
        assert_eq!(restored.event_id, envelope.event_id);

        let decoded: TestEvent = restored.decode().unwrap();
        assert_eq!(decoded, event);
    }

    #[test]
    fn event_id_survives_reserialization() {
        let envelope = EventEnvelope::from_event(&TestEvent {
            id: "t-2".to_string(),
            value: 7,
        })
        .unwrap();

        let bytes = envelope.to_bytes().unwrap();
        let redelivered = EventEnvelope::from_bytes(&bytes).unwrap();

        // Redelivery of the same message keeps the dedup key stable.
        assert_eq!(redelivered.event_id, envelope.event_id);
    }

    #[test]
    fn payload_is_json() {
        let envelope = EventEnvelope::from_event(&TestEvent {
            id: "t-3".to_string(),
            value: 1,
        })
        .unwrap();

        let value: serde_json::Value = serde_json::from_slice(&envelope.data).unwrap();
        assert_eq!(value["id"], "t-3");
    }
}
