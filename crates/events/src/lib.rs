//! Message-bus mechanics and wire payload types.
//!
//! The bus abstraction here is intentionally **lightweight**:
//!
//! - **Transport-agnostic**: works with in-memory channels, Redis pub/sub,
//!   or a broker.
//! - **At-least-once delivery**: messages may arrive more than once;
//!   consumers must tolerate duplicates.
//! - **No ordering across keys**: ordering is only meaningful within a key.
//! - **No persistence**: the primary record store is the source of truth;
//!   the bus is for distribution.

pub mod bus;
pub mod in_memory_bus;
pub mod messages;
pub mod topic;

pub use bus::{BusError, BusMessage, MessageBus, Subscription};
pub use in_memory_bus::InMemoryMessageBus;
pub use messages::{
    keys, CartEvent, CartEventKind, MalformedCartEvent, ProductViewed, SearchPerformed,
    StockChange,
};
pub use topic::Topic;
