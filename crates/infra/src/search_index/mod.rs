//! Search index abstraction.
//!
//! The index is a query-optimized, eventually-consistent copy of catalog
//! data. Writes must be idempotent on `(id, updated_at)`: a push carrying a
//! stale `updated_at` must not overwrite a fresher entry, so concurrent and
//! retried pushes for the same product are commutative.

mod in_memory;

pub use in_memory::InMemorySearchIndex;

use thiserror::Error;

use stockpile_catalog::Product;
use stockpile_core::{CategoryId, Page, PageRequest, ProductId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error("index write failed: {0}")]
    Write(String),

    #[error("index query failed: {0}")]
    Query(String),
}

/// Criteria for one index query. All predicates are ANDed; the `active`
/// filter is implicit and always applied by implementations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchCriteria {
    /// Full-text keyword matched across name, description and brand, with
    /// name weighted above the other fields.
    pub keyword: Option<String>,
    pub category_id: Option<CategoryId>,
    /// Exact-term brand match.
    pub brand: Option<String>,
    pub min_price_cents: Option<u64>,
    pub max_price_cents: Option<u64>,
    /// Upper bound on stock quantity (low-stock listings).
    pub stock_at_most: Option<u32>,
    /// Excluded id (similar-products lookups exclude the reference).
    pub exclude: Option<ProductId>,
}

impl SearchCriteria {
    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    pub fn category(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn min_price_cents(mut self, cents: u64) -> Self {
        self.min_price_cents = Some(cents);
        self
    }

    pub fn max_price_cents(mut self, cents: u64) -> Self {
        self.max_price_cents = Some(cents);
        self
    }

    pub fn stock_at_most(mut self, quantity: u32) -> Self {
        self.stock_at_most = Some(quantity);
        self
    }

    pub fn excluding(mut self, id: ProductId) -> Self {
        self.exclude = Some(id);
        self
    }
}

/// Secondary, query-optimized product store.
pub trait SearchIndex: Send + Sync {
    /// Upsert a product snapshot, last-writer-wins by `updated_at`.
    fn put(&self, product: Product) -> Result<(), IndexError>;

    /// Run a query. Only active products are returned; keyword matches are
    /// ranked before the requested sort is applied.
    fn query(&self, criteria: &SearchCriteria, page: &PageRequest)
        -> Result<Page<Product>, IndexError>;
}
