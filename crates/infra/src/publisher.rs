//! Fire-and-forget event emission.

use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use stockpile_events::{MessageBus, Topic};

/// Emits domain events to the bus after a committed write.
///
/// Emission is strictly best-effort: serialization or publish failures are
/// logged and swallowed, never surfaced to the mutation caller, and never
/// cause the committed write to be re-attempted or rolled back. Delivery is
/// at-least-once: callers must not assume the event reaches consumers
/// before `emit` returns, nor that it reaches them exactly once.
pub struct EventPublisher {
    bus: Arc<dyn MessageBus>,
}

impl EventPublisher {
    pub fn new(bus: Arc<dyn MessageBus>) -> Self {
        Self { bus }
    }

    pub fn emit<P: Serialize>(&self, topic: Topic, key: &str, payload: &P) {
        let value = match serde_json::to_value(payload) {
            Ok(v) => v,
            Err(e) => {
                warn!(topic = %topic, key, error = %e, "failed to serialize event payload; dropping");
                return;
            }
        };

        if let Err(e) = self.bus.publish(topic, key, value) {
            warn!(topic = %topic, key, error = %e, "event publish failed; dropping");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value as JsonValue;
    use stockpile_events::{BusError, BusMessage, InMemoryMessageBus, Subscription};

    struct RefusingBus;

    impl MessageBus for RefusingBus {
        fn publish(&self, _: Topic, _: &str, _: JsonValue) -> Result<(), BusError> {
            Err(BusError::Backend("broker unavailable".to_string()))
        }

        fn subscribe(&self, _: Topic, _: &str) -> Subscription<BusMessage> {
            let (_tx, rx) = std::sync::mpsc::channel();
            Subscription::new(rx)
        }
    }

    #[test]
    fn emit_delivers_serialized_payload() {
        let bus = Arc::new(InMemoryMessageBus::new());
        let sub = bus.subscribe(Topic::ProductEvents, "g");
        let publisher = EventPublisher::new(bus);

        #[derive(Serialize)]
        struct Payload {
            n: u32,
        }
        publisher.emit(Topic::ProductEvents, "product-created", &Payload { n: 7 });

        let msg = sub.try_recv().unwrap();
        assert_eq!(msg.key, "product-created");
        assert_eq!(msg.payload["n"], 7);
    }

    #[test]
    fn publish_failure_is_swallowed() {
        let publisher = EventPublisher::new(Arc::new(RefusingBus));
        // Must not panic or return anything; the failure is only logged.
        publisher.emit(Topic::InventoryEvents, "stock-updated", &serde_json::json!({}));
    }
}
