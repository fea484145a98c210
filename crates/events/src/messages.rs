//! Wire payload types: the cart events this service consumes and the
//! product/inventory/search events it publishes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use stockpile_core::ProductId;

/// Routing keys used on the outbound topics.
pub mod keys {
    pub const PRODUCT_CREATED: &str = "product-created";
    pub const PRODUCT_UPDATED: &str = "product-updated";
    pub const PRODUCT_DELETED: &str = "product-deleted";
    pub const PRODUCT_VIEWED: &str = "product-viewed";
    pub const STOCK_UPDATED: &str = "stock-updated";
    pub const STOCK_RESTORED: &str = "stock-restored";
    pub const SEARCH_PERFORMED: &str = "search-performed";
}

/// Kind tag of an inbound cart event.
///
/// Unknown tags are preserved rather than dropped so the consumer can log
/// exactly what it ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartEventKind {
    ItemAdded,
    ItemUpdated,
    ItemRemoved,
    CheckoutInitiated,
    Unknown(String),
}

impl CartEventKind {
    fn from_tag(tag: &str) -> Self {
        match tag {
            "ITEM_ADDED" => Self::ItemAdded,
            "ITEM_UPDATED" => Self::ItemUpdated,
            "ITEM_REMOVED" => Self::ItemRemoved,
            "CHECKOUT_INITIATED" => Self::CheckoutInitiated,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// An inbound cart lifecycle event, already shape-checked.
///
/// The upstream producer is loose about numeric types (`userId` arrives as
/// a JSON number or a numeric string), so parsing goes through
/// [`CartEvent::from_payload`] instead of a derived `Deserialize`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartEvent {
    pub kind: CartEventKind,
    pub user_id: Option<i64>,
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A cart event payload that could not be interpreted. Isolated to the
/// single message; consumption continues.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("malformed cart event: {0}")]
pub struct MalformedCartEvent(pub String);

impl CartEvent {
    pub fn from_payload(payload: &JsonValue) -> Result<Self, MalformedCartEvent> {
        let obj = payload
            .as_object()
            .ok_or_else(|| MalformedCartEvent("payload is not an object".to_string()))?;

        let tag = obj
            .get("eventType")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| MalformedCartEvent("missing eventType".to_string()))?;
        let kind = CartEventKind::from_tag(tag);

        // userId is analytics-only; tolerate absence.
        let user_id = obj.get("userId").and_then(flexible_i64);

        let product_id = obj
            .get("productId")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| MalformedCartEvent("missing productId".to_string()))?
            .parse::<ProductId>()
            .map_err(|e| MalformedCartEvent(e.to_string()))?;

        let quantity = obj
            .get("quantity")
            .and_then(flexible_i64)
            .ok_or_else(|| MalformedCartEvent("missing or non-numeric quantity".to_string()))?;
        let quantity = u32::try_from(quantity)
            .map_err(|_| MalformedCartEvent(format!("quantity out of range: {quantity}")))?;

        Ok(Self {
            kind,
            user_id,
            product_id,
            quantity,
        })
    }
}

/// Accept a JSON number or a numeric string (the upstream cart service
/// emits both).
fn flexible_i64(value: &JsonValue) -> Option<i64> {
    match value {
        JsonValue::Number(n) => n.as_i64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Published on `inventory-events` after every committed stock mutation.
///
/// `quantity_changed` is signed: negative for a reservation, positive for
/// a restoration. Created at commit time, published once, then discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockChange {
    pub product_id: ProductId,
    pub current_stock: u32,
    pub quantity_changed: i64,
}

/// Published on `search-events` when a keyword search runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPerformed {
    pub keyword: String,
    pub user_id: Option<i64>,
    pub results_count: u64,
    pub timestamp: DateTime<Utc>,
}

/// Published on `product-events` when a product detail page is served.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductViewed {
    pub product_id: ProductId,
    pub user_id: Option<i64>,
    pub timestamp: DateTime<Utc>,
}
