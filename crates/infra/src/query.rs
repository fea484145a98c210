//! Catalog read queries against the search index, with a primary-store
//! fallback for the trivial "browse all" case.

use std::sync::Arc;

use thiserror::Error;

use stockpile_catalog::Product;
use stockpile_core::{CategoryId, Page, PageRequest, ProductId};

use crate::record_store::RecordStore;
use crate::search_index::{IndexError, SearchCriteria, SearchIndex};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The reference product of a similarity lookup does not exist.
    #[error("product not found")]
    NotFound,

    #[error(transparent)]
    Index(#[from] IndexError),
}

/// Builds and executes catalog queries.
///
/// The search index serves every filtered or ranked query; the primary
/// store serves plain active listings (no reason to pay an index
/// round-trip to browse everything) and resolves reference products.
/// Index results may lag the primary store; that staleness is accepted.
pub struct SearchQueryEngine {
    store: Arc<dyn RecordStore>,
    index: Arc<dyn SearchIndex>,
}

impl SearchQueryEngine {
    pub fn new(store: Arc<dyn RecordStore>, index: Arc<dyn SearchIndex>) -> Self {
        Self { store, index }
    }

    /// Keyword search. An empty or absent keyword degrades to the plain
    /// active listing from the primary store.
    pub fn search(
        &self,
        keyword: Option<&str>,
        page: &PageRequest,
    ) -> Result<Page<Product>, QueryError> {
        match normalized(keyword) {
            None => Ok(self.store.list_active(page)),
            Some(keyword) => {
                let criteria = SearchCriteria::default().keyword(keyword);
                Ok(self.index.query(&criteria, page)?)
            }
        }
    }

    /// Keyword + category + price window, all optional.
    pub fn advanced_search(
        &self,
        keyword: Option<&str>,
        category_id: Option<CategoryId>,
        min_price_cents: Option<u64>,
        max_price_cents: Option<u64>,
        page: &PageRequest,
    ) -> Result<Page<Product>, QueryError> {
        let mut criteria = SearchCriteria::default();
        if let Some(keyword) = normalized(keyword) {
            criteria = criteria.keyword(keyword);
        }
        if let Some(category_id) = category_id {
            criteria = criteria.category(category_id);
        }
        if let Some(min) = min_price_cents {
            criteria = criteria.min_price_cents(min);
        }
        if let Some(max) = max_price_cents {
            criteria = criteria.max_price_cents(max);
        }

        if criteria == SearchCriteria::default() {
            // Nothing to filter on: same shortcut as a blank search.
            return Ok(self.store.list_active(page));
        }
        Ok(self.index.query(&criteria, page)?)
    }

    pub fn by_category(
        &self,
        category_id: CategoryId,
        page: &PageRequest,
    ) -> Result<Page<Product>, QueryError> {
        Ok(self
            .index
            .query(&SearchCriteria::default().category(category_id), page)?)
    }

    pub fn by_brand(&self, brand: &str, page: &PageRequest) -> Result<Page<Product>, QueryError> {
        Ok(self
            .index
            .query(&SearchCriteria::default().brand(brand), page)?)
    }

    pub fn by_price_range(
        &self,
        min_price_cents: u64,
        max_price_cents: u64,
        page: &PageRequest,
    ) -> Result<Page<Product>, QueryError> {
        let criteria = SearchCriteria::default()
            .min_price_cents(min_price_cents)
            .max_price_cents(max_price_cents);
        Ok(self.index.query(&criteria, page)?)
    }

    /// Products sharing the reference product's brand and category,
    /// excluding the reference itself.
    pub fn similar(
        &self,
        product_id: ProductId,
        page: &PageRequest,
    ) -> Result<Page<Product>, QueryError> {
        let reference = self.store.get(&product_id).ok_or(QueryError::NotFound)?;

        let criteria = SearchCriteria::default()
            .brand(reference.brand)
            .category(reference.category_id)
            .excluding(product_id);
        Ok(self.index.query(&criteria, page)?)
    }

    /// Active products at or below the stock threshold.
    pub fn low_stock(
        &self,
        threshold: u32,
        page: &PageRequest,
    ) -> Result<Page<Product>, QueryError> {
        Ok(self
            .index
            .query(&SearchCriteria::default().stock_at_most(threshold), page)?)
    }

    pub fn brands(&self) -> Vec<String> {
        self.store.brands()
    }
}

fn normalized(keyword: Option<&str>) -> Option<String> {
    keyword
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
}
