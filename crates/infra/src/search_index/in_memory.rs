//! In-memory search index for tests/dev.

use std::collections::HashMap;
use std::sync::RwLock;

use stockpile_catalog::Product;
use stockpile_core::{Page, PageRequest, ProductId};

use crate::record_store::{compare_products, order_and_paginate};

use super::{IndexError, SearchCriteria, SearchIndex};

/// Relative weight of a name hit versus a description/brand hit.
const NAME_WEIGHT: u32 = 2;

/// In-memory search index.
///
/// Keyword matching is case-insensitive token containment with name hits
/// weighted double, a stand-in for an engine-side best-fields multi-match.
/// Ranking beyond "matches sort before the requested order" is not part of
/// the index contract.
#[derive(Debug, Default)]
pub struct InMemorySearchIndex {
    docs: RwLock<HashMap<ProductId, Product>>,
}

impl InMemorySearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of one indexed document. Test/diagnostic helper.
    pub fn get(&self, id: &ProductId) -> Option<Product> {
        self.docs.read().ok()?.get(id).cloned()
    }
}

impl SearchIndex for InMemorySearchIndex {
    fn put(&self, product: Product) -> Result<(), IndexError> {
        let mut docs = self
            .docs
            .write()
            .map_err(|_| IndexError::Write("index lock poisoned".to_string()))?;

        // Last-writer-wins by business timestamp, not arrival order: a
        // stale snapshot (retry, concurrent push) must not clobber a
        // fresher entry.
        if let Some(existing) = docs.get(&product.id) {
            if existing.updated_at > product.updated_at {
                return Ok(());
            }
        }
        docs.insert(product.id, product);
        Ok(())
    }

    fn query(
        &self,
        criteria: &SearchCriteria,
        page: &PageRequest,
    ) -> Result<Page<Product>, IndexError> {
        let docs = self
            .docs
            .read()
            .map_err(|_| IndexError::Query("index lock poisoned".to_string()))?;

        let keyword = criteria
            .keyword
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty());

        let mut scored: Vec<(u32, Product)> = docs
            .values()
            .filter(|p| p.active)
            .filter(|p| matches_filters(p, criteria))
            .filter_map(|p| match keyword {
                None => Some((0, p.clone())),
                Some(k) => {
                    let score = keyword_score(p, k);
                    (score > 0).then(|| (score, p.clone()))
                }
            })
            .collect();

        if keyword.is_some() {
            // Score ranks the result; the requested sort breaks ties
            // between equally-scored matches (both sorts are stable).
            scored.sort_by(|a, b| compare_products(&a.1, &b.1, page.sort_by, page.direction));
            scored.sort_by(|a, b| b.0.cmp(&a.0));
            let total_items = scored.len() as u64;
            let items = scored
                .into_iter()
                .map(|(_, p)| p)
                .skip(page.offset())
                .take(page.size as usize)
                .collect();
            return Ok(Page {
                items,
                page: page.page,
                size: page.size,
                total_items,
            });
        }

        let items: Vec<Product> = scored.into_iter().map(|(_, p)| p).collect();
        Ok(order_and_paginate(items, page))
    }
}

fn matches_filters(product: &Product, criteria: &SearchCriteria) -> bool {
    if let Some(category_id) = criteria.category_id {
        if product.category_id != category_id {
            return false;
        }
    }
    if let Some(brand) = &criteria.brand {
        if !product.brand.eq_ignore_ascii_case(brand) {
            return false;
        }
    }
    if let Some(min) = criteria.min_price_cents {
        if product.price_cents < min {
            return false;
        }
    }
    if let Some(max) = criteria.max_price_cents {
        if product.price_cents > max {
            return false;
        }
    }
    if let Some(at_most) = criteria.stock_at_most {
        if product.stock_quantity > at_most {
            return false;
        }
    }
    if let Some(excluded) = criteria.exclude {
        if product.id == excluded {
            return false;
        }
    }
    true
}

/// Token-containment score: name hits count double.
fn keyword_score(product: &Product, keyword: &str) -> u32 {
    let name = product.name.to_lowercase();
    let description = product.description.to_lowercase();
    let brand = product.brand.to_lowercase();

    keyword
        .split_whitespace()
        .map(|token| {
            let token = token.to_lowercase();
            let mut score = 0;
            if name.contains(&token) {
                score += NAME_WEIGHT;
            }
            if description.contains(&token) {
                score += 1;
            }
            if brand.contains(&token) {
                score += 1;
            }
            score
        })
        .sum()
}
