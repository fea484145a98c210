//! Redis pub/sub-backed message bus (optional).
//!
//! Note: Redis pub/sub is not durable (messages are dropped while a
//! subscriber is offline). For durable at-least-once consumption a broker
//! or Redis Streams would be used instead. This implementation is
//! intentionally minimal; handlers already tolerate redelivery and loss.

use std::sync::mpsc;
use std::thread;

use redis::Commands;
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::warn;

use stockpile_events::{BusError, BusMessage, MessageBus, Subscription, Topic};

#[derive(Debug, Error)]
pub enum RedisBusError {
    #[error("redis failure: {0}")]
    Redis(String),
}

/// Redis pub/sub bus. Each topic maps to one channel.
#[derive(Debug, Clone)]
pub struct RedisPubSubBus {
    client: redis::Client,
    namespace: String,
}

impl RedisPubSubBus {
    pub fn new(redis_url: impl AsRef<str>) -> Result<Self, RedisBusError> {
        let client = redis::Client::open(redis_url.as_ref())
            .map_err(|e| RedisBusError::Redis(e.to_string()))?;
        Ok(Self {
            client,
            namespace: "stockpile".to_string(),
        })
    }

    fn channel(&self, topic: Topic) -> String {
        format!("{}:{}", self.namespace, topic.as_str())
    }
}

impl MessageBus for RedisPubSubBus {
    fn publish(&self, topic: Topic, key: &str, payload: JsonValue) -> Result<(), BusError> {
        let message = BusMessage::new(topic, key, payload);
        let encoded = serde_json::to_string(&message)
            .map_err(|e| BusError::Serialize(e.to_string()))?;

        let mut conn = self
            .client
            .get_connection()
            .map_err(|e| BusError::Backend(e.to_string()))?;

        let _: i64 = conn
            .publish(self.channel(topic), encoded)
            .map_err(|e| BusError::Backend(e.to_string()))?;

        Ok(())
    }

    fn subscribe(&self, topic: Topic, group_id: &str) -> Subscription<BusMessage> {
        let (tx, rx) = mpsc::channel();

        let client = self.client.clone();
        let channel = self.channel(topic);
        let group = group_id.to_string();

        // Background thread that receives pub/sub messages and forwards
        // them. Redis pub/sub has no consumer groups; every subscriber
        // sees every message, so the group id is informational here.
        thread::spawn(move || {
            let mut conn = match client.get_connection() {
                Ok(c) => c,
                Err(e) => {
                    warn!(channel, group, error = %e, "redis subscribe connection failed");
                    return;
                }
            };

            let mut pubsub = conn.as_pubsub();
            if let Err(e) = pubsub.subscribe(&channel) {
                warn!(channel, group, error = %e, "redis channel subscribe failed");
                return;
            }

            loop {
                let msg = match pubsub.get_message() {
                    Ok(m) => m,
                    Err(_) => return,
                };

                let encoded: String = match msg.get_payload() {
                    Ok(p) => p,
                    Err(_) => continue,
                };

                let message: BusMessage = match serde_json::from_str(&encoded) {
                    Ok(m) => m,
                    Err(e) => {
                        warn!(channel, error = %e, "dropping undecodable bus message");
                        continue;
                    }
                };

                if tx.send(message).is_err() {
                    return;
                }
            }
        });

        Subscription::new(rx)
    }
}
