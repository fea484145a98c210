//! Named topics this service consumes from and publishes to.

use serde::{Deserialize, Serialize};

/// A bus topic.
///
/// Topics are a closed set: the service does not publish to arbitrary
/// destinations, and subscribing to an unknown topic is a wiring bug we
/// want to fail at compile time.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Topic {
    /// Inbound cart lifecycle stream (consumed, keyed by event type).
    CartEvents,
    /// Product lifecycle + view analytics (published).
    ProductEvents,
    /// Stock reservations and restorations (published).
    InventoryEvents,
    /// Search analytics (published).
    SearchEvents,
}

impl Topic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::CartEvents => "cart-events",
            Topic::ProductEvents => "product-events",
            Topic::InventoryEvents => "inventory-events",
            Topic::SearchEvents => "search-events",
        }
    }
}

impl core::fmt::Display for Topic {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
