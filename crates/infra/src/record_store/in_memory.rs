//! In-memory record store for tests/dev.

use std::collections::HashMap;
use std::sync::RwLock;

use stockpile_catalog::Product;
use stockpile_core::{Page, PageRequest, ProductId};

use super::{order_and_paginate, RecordStore, RecordStoreError};

/// In-memory product store.
///
/// A `RwLock<HashMap>` stands in for the transactional table. Individual
/// operations are atomic; multi-step sequences still need the caller's
/// per-product lock.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    inner: RwLock<HashMap<ProductId, Product>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records, active or not. Test/diagnostic helper.
    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordStore for InMemoryRecordStore {
    fn get(&self, id: &ProductId) -> Option<Product> {
        let map = self.inner.read().ok()?;
        map.get(id).cloned()
    }

    fn get_many(&self, ids: &[ProductId]) -> Vec<Product> {
        let map = match self.inner.read() {
            Ok(m) => m,
            Err(_) => return vec![],
        };
        ids.iter().filter_map(|id| map.get(id).cloned()).collect()
    }

    fn put(&self, product: Product) -> Result<(), RecordStoreError> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| RecordStoreError::Backend("store lock poisoned".to_string()))?;
        map.insert(product.id, product);
        Ok(())
    }

    fn list_active(&self, page: &PageRequest) -> Page<Product> {
        let map = match self.inner.read() {
            Ok(m) => m,
            Err(_) => return Page::empty(page),
        };
        let active: Vec<Product> = map.values().filter(|p| p.active).cloned().collect();
        order_and_paginate(active, page)
    }

    fn brands(&self) -> Vec<String> {
        let map = match self.inner.read() {
            Ok(m) => m,
            Err(_) => return vec![],
        };
        let mut brands: Vec<String> = map
            .values()
            .filter(|p| p.active)
            .map(|p| p.brand.clone())
            .collect();
        brands.sort();
        brands.dedup();
        brands
    }
}
