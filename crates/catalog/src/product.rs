use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockpile_core::{CategoryId, DomainError, ProductId};

/// Longest accepted product description.
pub const MAX_DESCRIPTION_LEN: usize = 1000;

/// A catalog product.
///
/// The primary record store owns this entity; the search index holds a
/// denormalized copy that may lag behind. `stock_quantity` is unsigned, so a
/// negative count is unrepresentable; callers go through [`Product::try_reserve`]
/// rather than writing the field directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub brand: String,
    pub category_id: CategoryId,
    pub category_name: String,
    /// Exact price in the smallest currency unit (e.g. cents).
    pub price_cents: u64,
    pub stock_quantity: u32,
    pub image_url: Option<String>,
    /// Soft-delete flag; inactive products are excluded from all read paths.
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for creating or replacing a product's descriptive state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub brand: String,
    pub category_id: CategoryId,
    pub category_name: String,
    pub price_cents: u64,
    pub stock_quantity: u32,
    pub image_url: Option<String>,
}

impl ProductDraft {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if self.brand.trim().is_empty() {
            return Err(DomainError::validation("brand cannot be empty"));
        }
        if self.description.len() > MAX_DESCRIPTION_LEN {
            return Err(DomainError::validation(format!(
                "description exceeds {MAX_DESCRIPTION_LEN} characters"
            )));
        }
        Ok(())
    }
}

/// Outcome of a reservation attempt that asked for more than is on hand.
///
/// This is a normal result, not a failure: the caller decides whether to
/// report it upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsufficientStock {
    pub requested: u32,
    pub available: u32,
}

impl Product {
    /// Materialize a new product from a validated draft.
    ///
    /// The caller supplies the id (assigned by the primary store path) and
    /// the creation instant; `created_at` is set once and never changes.
    pub fn from_draft(id: ProductId, draft: ProductDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name,
            description: draft.description,
            brand: draft.brand,
            category_id: draft.category_id,
            category_name: draft.category_name,
            price_cents: draft.price_cents,
            stock_quantity: draft.stock_quantity,
            image_url: draft.image_url,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace descriptive state from a draft, preserving identity,
    /// activation and `created_at`.
    pub fn apply_draft(&mut self, draft: ProductDraft, now: DateTime<Utc>) {
        self.name = draft.name;
        self.description = draft.description;
        self.brand = draft.brand;
        self.category_id = draft.category_id;
        self.category_name = draft.category_name;
        self.price_cents = draft.price_cents;
        self.stock_quantity = draft.stock_quantity;
        self.image_url = draft.image_url;
        self.updated_at = now;
    }

    /// Soft-delete: the record stays in both stores but disappears from
    /// every read path.
    pub fn deactivate(&mut self, now: DateTime<Utc>) {
        self.active = false;
        self.updated_at = now;
    }

    /// Decrement stock if enough is on hand.
    ///
    /// Returns the remaining quantity on success. On insufficiency the
    /// product is left untouched. Callers must hold the per-product lock;
    /// this method alone does not make the read-modify-write atomic.
    pub fn try_reserve(
        &mut self,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> Result<u32, InsufficientStock> {
        if quantity > self.stock_quantity {
            return Err(InsufficientStock {
                requested: quantity,
                available: self.stock_quantity,
            });
        }
        self.stock_quantity -= quantity;
        self.updated_at = now;
        Ok(self.stock_quantity)
    }

    /// Increment stock unconditionally, returning the new quantity.
    ///
    /// There is no upper bound: a duplicated or misrouted restoration can
    /// inflate stock beyond its true value. Saturates instead of wrapping.
    pub fn restore(&mut self, quantity: u32, now: DateTime<Utc>) -> u32 {
        self.stock_quantity = self.stock_quantity.saturating_add(quantity);
        self.updated_at = now;
        self.stock_quantity
    }
}
