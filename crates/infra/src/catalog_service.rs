//! Product CRUD orchestration: primary-store commit, index propagation,
//! event emission.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::info;

use stockpile_catalog::{Product, ProductDraft};
use stockpile_core::{DomainError, ProductId};
use stockpile_events::{keys, Topic};

use crate::publisher::EventPublisher;
use crate::record_store::{RecordStore, RecordStoreError};
use crate::sync::SyncPropagator;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] RecordStoreError),
}

/// Write-side orchestration for product records.
///
/// Every mutation follows the same shape: validate, commit to the primary
/// store, then best-effort index push and event emission. The index and
/// bus steps can fail without affecting the committed write.
pub struct CatalogService {
    store: Arc<dyn RecordStore>,
    sync: Arc<SyncPropagator>,
    publisher: Arc<EventPublisher>,
}

impl CatalogService {
    pub fn new(
        store: Arc<dyn RecordStore>,
        sync: Arc<SyncPropagator>,
        publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            store,
            sync,
            publisher,
        }
    }

    pub fn create(&self, draft: ProductDraft) -> Result<Product, CatalogServiceError> {
        draft.validate()?;

        let product = Product::from_draft(ProductId::new(), draft, Utc::now());
        self.store.put(product.clone())?;

        self.sync.push(&product);
        self.publisher
            .emit(Topic::ProductEvents, keys::PRODUCT_CREATED, &product);
        info!(product_id = %product.id, "product created");

        Ok(product)
    }

    pub fn update(
        &self,
        id: ProductId,
        draft: ProductDraft,
    ) -> Result<Product, CatalogServiceError> {
        draft.validate()?;

        let mut product = self
            .store
            .get(&id)
            .ok_or(CatalogServiceError::Domain(DomainError::NotFound))?;
        product.apply_draft(draft, Utc::now());
        self.store.put(product.clone())?;

        self.sync.push(&product);
        self.publisher
            .emit(Topic::ProductEvents, keys::PRODUCT_UPDATED, &product);
        info!(product_id = %product.id, "product updated");

        Ok(product)
    }

    /// Soft delete: the record stays, but disappears from all read paths.
    pub fn delete(&self, id: ProductId) -> Result<(), CatalogServiceError> {
        let mut product = self
            .store
            .get(&id)
            .ok_or(CatalogServiceError::Domain(DomainError::NotFound))?;
        product.deactivate(Utc::now());
        self.store.put(product.clone())?;

        self.sync.push(&product);
        self.publisher
            .emit(Topic::ProductEvents, keys::PRODUCT_DELETED, &product);
        info!(product_id = %product.id, "product soft-deleted");

        Ok(())
    }

    pub fn get(&self, id: &ProductId) -> Option<Product> {
        self.store.get(id)
    }

    /// Batch lookup for cart/order services; unknown ids are skipped.
    pub fn get_many(&self, ids: &[ProductId]) -> Vec<Product> {
        self.store.get_many(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockpile_core::CategoryId;
    use stockpile_events::{BusMessage, InMemoryMessageBus, MessageBus, Subscription};

    use crate::record_store::InMemoryRecordStore;
    use crate::search_index::InMemorySearchIndex;

    struct Fixture {
        service: CatalogService,
        store: Arc<InMemoryRecordStore>,
        index: Arc<InMemorySearchIndex>,
        product_events: Subscription<BusMessage>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryRecordStore::new());
        let index = Arc::new(InMemorySearchIndex::new());
        let bus = Arc::new(InMemoryMessageBus::new());
        let product_events = bus.subscribe(Topic::ProductEvents, "test");
        let service = CatalogService::new(
            store.clone(),
            Arc::new(SyncPropagator::new(index.clone())),
            Arc::new(EventPublisher::new(bus)),
        );
        Fixture {
            service,
            store,
            index,
            product_events,
        }
    }

    fn draft() -> ProductDraft {
        ProductDraft {
            name: "Widget".to_string(),
            description: "A widget".to_string(),
            brand: "Acme".to_string(),
            category_id: CategoryId::new(),
            category_name: "Electronics".to_string(),
            price_cents: 1500,
            stock_quantity: 8,
            image_url: None,
        }
    }

    #[test]
    fn create_commits_syncs_and_emits() {
        let f = fixture();

        let product = f.service.create(draft()).unwrap();

        assert!(f.store.get(&product.id).is_some());
        assert!(f.index.get(&product.id).is_some());
        let msg = f.product_events.try_recv().unwrap();
        assert_eq!(msg.key, keys::PRODUCT_CREATED);
    }

    #[test]
    fn create_rejects_invalid_draft_without_side_effects() {
        let f = fixture();

        let bad = ProductDraft {
            name: "  ".to_string(),
            ..draft()
        };
        let err = f.service.create(bad).unwrap_err();
        assert!(matches!(
            err,
            CatalogServiceError::Domain(DomainError::Validation(_))
        ));
        assert!(f.store.is_empty());
        assert!(f.product_events.try_recv().is_err());
    }

    #[test]
    fn update_preserves_created_at_and_bumps_updated_at() {
        let f = fixture();
        let created = f.service.create(draft()).unwrap();

        let renamed = ProductDraft {
            name: "Widget v2".to_string(),
            ..draft()
        };
        let updated = f.service.update(created.id, renamed).unwrap();

        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(updated.name, "Widget v2");
        assert_eq!(f.store.get(&created.id).unwrap().name, "Widget v2");
    }

    #[test]
    fn update_unknown_id_is_not_found() {
        let f = fixture();
        let err = f.service.update(ProductId::new(), draft()).unwrap_err();
        assert_eq!(err, CatalogServiceError::Domain(DomainError::NotFound));
    }

    #[test]
    fn delete_is_soft_and_removes_from_read_paths() {
        let f = fixture();
        let product = f.service.create(draft()).unwrap();

        f.service.delete(product.id).unwrap();

        let stored = f.store.get(&product.id).unwrap();
        assert!(!stored.active);
        // Indexed copy is deactivated too, so search drops it.
        assert!(!f.index.get(&product.id).unwrap().active);

        let _ = f.product_events.try_recv(); // created
        let msg = f.product_events.try_recv().unwrap();
        assert_eq!(msg.key, keys::PRODUCT_DELETED);
    }

    #[test]
    fn get_many_skips_unknown_ids() {
        let f = fixture();
        let a = f.service.create(draft()).unwrap();
        let b = f.service.create(draft()).unwrap();

        let got = f.service.get_many(&[a.id, ProductId::new(), b.id]);
        assert_eq!(got.len(), 2);
    }
}
