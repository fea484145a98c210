//! Infrastructure message-bus implementations.
//!
//! The bus abstraction lives in `stockpile-events` as pure mechanics; this
//! module provides backend-specific implementations.

#[cfg(feature = "redis")]
pub mod redis_pubsub;

#[cfg(feature = "redis")]
pub use redis_pubsub::{RedisBusError, RedisPubSubBus};
