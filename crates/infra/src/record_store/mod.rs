//! Primary record store abstraction.
//!
//! The record store is the transactional system of record for product data.
//! This module defines the contract the rest of the service depends on plus
//! an in-memory implementation for dev/tests; a Postgres adapter lives
//! behind the `postgres` feature.

mod in_memory;
#[cfg(feature = "postgres")]
mod postgres;

pub use in_memory::InMemoryRecordStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresRecordStore;

use thiserror::Error;

use stockpile_catalog::Product;
use stockpile_core::{Page, PageRequest, ProductId, SortBy, SortDirection};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordStoreError {
    #[error("record store backend failure: {0}")]
    Backend(String),
}

/// Transactional store for product records.
///
/// Reads return snapshots; `put` replaces the whole record. Atomicity of a
/// read-modify-write sequence is the caller's responsibility (see the
/// stock ledger's per-product locking).
pub trait RecordStore: Send + Sync {
    fn get(&self, id: &ProductId) -> Option<Product>;

    /// Fetch many records at once; unknown ids are skipped.
    fn get_many(&self, ids: &[ProductId]) -> Vec<Product>;

    fn put(&self, product: Product) -> Result<(), RecordStoreError>;

    /// Page through active products only.
    fn list_active(&self, page: &PageRequest) -> Page<Product>;

    /// Distinct brands across active products, sorted.
    fn brands(&self) -> Vec<String>;
}

/// Order a product set by the requested sort, then slice out one page.
///
/// Shared by the in-memory store and index, which both filter first and
/// paginate in memory.
pub(crate) fn order_and_paginate(mut items: Vec<Product>, page: &PageRequest) -> Page<Product> {
    sort_products(&mut items, page.sort_by, page.direction);

    let total_items = items.len() as u64;
    let items = items
        .into_iter()
        .skip(page.offset())
        .take(page.size as usize)
        .collect();

    Page {
        items,
        page: page.page,
        size: page.size,
        total_items,
    }
}

pub(crate) fn sort_products(items: &mut [Product], sort_by: SortBy, direction: SortDirection) {
    items.sort_by(|a, b| compare_products(a, b, sort_by, direction));
}

pub(crate) fn compare_products(
    a: &Product,
    b: &Product,
    sort_by: SortBy,
    direction: SortDirection,
) -> core::cmp::Ordering {
    let ordering = match sort_by {
        SortBy::CreatedAt => a.created_at.cmp(&b.created_at),
        SortBy::Price => a.price_cents.cmp(&b.price_cents),
        SortBy::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortBy::StockQuantity => a.stock_quantity.cmp(&b.stock_quantity),
    };
    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}
