//! Message bus abstraction (mechanics only).

use std::sync::mpsc::Receiver;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::topic::Topic;

/// A message as it travels over the bus: topic, routing key, JSON payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusMessage {
    pub topic: Topic,
    /// Routing/partition key. Ordering is only preserved within a key.
    pub key: String,
    pub payload: JsonValue,
}

impl BusMessage {
    pub fn new(topic: Topic, key: impl Into<String>, payload: JsonValue) -> Self {
        Self {
            topic,
            key: key.into(),
            payload,
        }
    }
}

/// Bus-level failure. Publishing is best-effort for callers that treat
/// emission as fire-and-forget; they decide whether to surface this.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    #[error("bus backend failure: {0}")]
    Backend(String),

    #[error("failed to serialize message: {0}")]
    Serialize(String),

    /// The bus (or its internal state) is no longer usable.
    #[error("bus closed")]
    Closed,
}

/// A subscription to one topic.
///
/// Each subscription owns a receiving end of a channel; the bus
/// implementation feeds it a copy of every message published to the
/// subscribed topic. Subscriptions are designed for single-threaded
/// consumption, one worker loop per subscription.
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Block until the next message is available.
    pub fn recv(&self) -> Result<M, std::sync::mpsc::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a message without blocking.
    pub fn try_recv(&self) -> Result<M, std::sync::mpsc::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Block for up to `timeout` waiting for a message.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<M, std::sync::mpsc::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}

/// Topic-based publish/subscribe bus.
///
/// ## Delivery guarantees
///
/// At-least-once: messages may be delivered more than once and, across
/// different keys, in any order. Consumers must be idempotent.
///
/// ## Error handling
///
/// `publish` can fail (backend down, serialization). Callers on the
/// mutation path treat publication as strictly-after-commit and never let
/// a publish failure abort or roll back the committed write.
///
/// ## Thread safety
///
/// Implementations must be safe for concurrent publishes; the trait is
/// object-safe so wiring can choose a backend at runtime.
pub trait MessageBus: Send + Sync {
    fn publish(&self, topic: Topic, key: &str, payload: JsonValue) -> Result<(), BusError>;

    /// Subscribe to a topic as a member of `group_id`.
    ///
    /// Group semantics (one delivery per group) are the broker's job;
    /// in-process implementations treat every subscription as its own
    /// group and broadcast.
    fn subscribe(&self, topic: Topic, group_id: &str) -> Subscription<BusMessage>;
}
