//! In-memory event bus for tests.
//!
//! Fan-out is synchronous per topic via `tokio::sync::broadcast`, so tests
//! can publish and then await consumer effects without a broker. The bus
//! still honors the [`EventBus`] contract: subscriptions opened before a
//! publish receive the envelope; late subscribers do not (matching the
//! default `"latest"` offset policy of the Kafka transport).

use futures::Stream;
use shoply_core::bus::{EventBus, EventBusError, EventStream};
use shoply_core::event::EventEnvelope;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 256;

/// In-memory [`EventBus`] implementation.
///
/// Cloning shares the underlying topics, so a test can hand one clone to
/// each engine and keep one for assertions.
///
/// # Example
///
/// ```
/// use shoply_bus::InMemoryEventBus;
/// use shoply_core::{EventBus, EventEnvelope};
/// use futures::StreamExt;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bus = InMemoryEventBus::new();
/// let mut stream = bus.subscribe(&["product-events"]).await?;
///
/// let envelope = EventEnvelope {
///     event_id: uuid::Uuid::new_v4(),
///     event_type: "ProductAdded.v1".into(),
///     data: b"{}".to_vec(),
///     occurred_at: chrono::Utc::now(),
/// };
/// bus.publish("product-events", &envelope).await?;
///
/// let received = stream.next().await.unwrap()?;
/// assert_eq!(received.event_id, envelope.event_id);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Default)]
pub struct InMemoryEventBus {
    topics: Arc<Mutex<HashMap<String, broadcast::Sender<EventEnvelope>>>>,
}

impl InMemoryEventBus {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn sender_for(&self, topic: &str) -> Result<broadcast::Sender<EventEnvelope>, EventBusError> {
        let mut topics = self
            .topics
            .lock()
            .map_err(|e| EventBusError::TransportError(format!("topics lock poisoned: {e}")))?;
        Ok(topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone())
    }

    /// Number of live subscribers across all topics (for test assertions).
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.topics
            .lock()
            .map(|topics| topics.values().map(broadcast::Sender::receiver_count).sum())
            .unwrap_or(0)
    }
}

impl EventBus for InMemoryEventBus {
    fn publish(
        &self,
        topic: &str,
        envelope: &EventEnvelope,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>> {
        let topic = topic.to_string();
        let envelope = envelope.clone();

        Box::pin(async move {
            let sender = self.sender_for(&topic)?;
            // A send error just means nobody is subscribed yet; publishing
            // into the void is valid bus behavior.
            let delivered = sender.send(envelope.clone()).unwrap_or(0);
            tracing::trace!(
                topic = %topic,
                event_type = %envelope.event_type,
                subscribers = delivered,
                "Event published (in-memory)"
            );
            Ok(())
        })
    }

    fn subscribe(
        &self,
        topics: &[&str],
    ) -> Pin<Box<dyn Future<Output = Result<EventStream, EventBusError>> + Send + '_>> {
        let topics: Vec<String> = topics.iter().map(|s| (*s).to_string()).collect();

        Box::pin(async move {
            let mut receivers = Vec::with_capacity(topics.len());
            for topic in &topics {
                receivers.push(self.sender_for(topic)?.subscribe());
            }

            let streams: Vec<_> = receivers.into_iter().map(receiver_stream).collect();
            let merged = futures::stream::select_all(streams);

            Ok(Box::pin(merged) as EventStream)
        })
    }
}

fn receiver_stream(
    mut rx: broadcast::Receiver<EventEnvelope>,
) -> Pin<Box<dyn Stream<Item = Result<EventEnvelope, EventBusError>> + Send>> {
    Box::pin(async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(envelope) => yield Ok(envelope),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    yield Err(EventBusError::TransportError(format!(
                        "subscriber lagged, {skipped} envelopes dropped"
                    )));
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use chrono::Utc;
    use futures::StreamExt;
    use uuid::Uuid;

    fn envelope(event_type: &str) -> EventEnvelope {
        EventEnvelope {
            event_id: Uuid::new_v4(),
            event_type: event_type.to_string(),
            data: b"{}".to_vec(),
            occurred_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn delivers_to_subscriber() {
        let bus = InMemoryEventBus::new();
        let mut stream = bus.subscribe(&["product-events"]).await.unwrap();

        let sent = envelope("ProductAdded.v1");
        bus.publish("product-events", &sent).await.unwrap();

        let received = stream.next().await.unwrap().unwrap();
        assert_eq!(received.event_id, sent.event_id);
    }

    #[tokio::test]
    async fn publish_without_subscribers_succeeds() {
        let bus = InMemoryEventBus::new();
        bus.publish("price-events", &envelope("PriceUpdated.v1"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn fans_out_to_multiple_subscribers() {
        let bus = InMemoryEventBus::new();
        let mut first = bus.subscribe(&["product-events"]).await.unwrap();
        let mut second = bus.subscribe(&["product-events"]).await.unwrap();
        assert_eq!(bus.subscriber_count(), 2);

        let sent = envelope("ProductAdded.v1");
        bus.publish("product-events", &sent).await.unwrap();

        assert_eq!(first.next().await.unwrap().unwrap().event_id, sent.event_id);
        assert_eq!(
            second.next().await.unwrap().unwrap().event_id,
            sent.event_id
        );
    }

    #[tokio::test]
    async fn merges_multiple_topics() {
        let bus = InMemoryEventBus::new();
        let mut stream = bus
            .subscribe(&["product-events", "price-events"])
            .await
            .unwrap();

        bus.publish("product-events", &envelope("ProductAdded.v1"))
            .await
            .unwrap();
        bus.publish("price-events", &envelope("PriceUpdated.v1"))
            .await
            .unwrap();

        let mut types = vec![
            stream.next().await.unwrap().unwrap().event_type,
            stream.next().await.unwrap().unwrap().event_type,
        ];
        types.sort();
        assert_eq!(types, vec!["PriceUpdated.v1", "ProductAdded.v1"]);
    }
}
