//! In-memory message bus for tests/dev.

use std::collections::HashMap;
use std::sync::{mpsc, Mutex};

use serde_json::Value as JsonValue;
use tracing::debug;

use crate::bus::{BusError, BusMessage, MessageBus, Subscription};
use crate::topic::Topic;

/// In-memory pub/sub bus.
///
/// - No IO / no async
/// - Best-effort fan-out per topic
/// - At-least-once acceptable (subscribers must be idempotent)
/// - Every subscription receives all of its topic's messages; consumer
///   groups are not deduplicated in-process
#[derive(Debug, Default)]
pub struct InMemoryMessageBus {
    subscribers: Mutex<HashMap<Topic, Vec<mpsc::Sender<BusMessage>>>>,
}

impl InMemoryMessageBus {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MessageBus for InMemoryMessageBus {
    fn publish(&self, topic: Topic, key: &str, payload: JsonValue) -> Result<(), BusError> {
        let message = BusMessage::new(topic, key, payload);

        let mut subs = self.subscribers.lock().map_err(|_| BusError::Closed)?;

        if let Some(senders) = subs.get_mut(&topic) {
            // Drop any dead subscribers while publishing.
            senders.retain(|tx| tx.send(message.clone()).is_ok());
        }

        Ok(())
    }

    fn subscribe(&self, topic: Topic, group_id: &str) -> Subscription<BusMessage> {
        let (tx, rx) = mpsc::channel();

        // If the lock is poisoned we still return a subscription; it just
        // won't receive messages until the process restarts.
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.entry(topic).or_default().push(tx);
        }
        debug!(topic = %topic, group = group_id, "subscription registered");

        Subscription::new(rx)
    }
}
