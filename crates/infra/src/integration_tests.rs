//! Integration tests for the full mutation pipeline.
//!
//! Tests: mutation → RecordStore → SyncPropagator → SearchIndex
//!                              → EventPublisher → MessageBus
//! and:   cart-events → CartEventConsumer → StockLedger → (same pipeline)
//!
//! Verifies:
//! - committed mutations reach the index and the bus
//! - index failures never taint a committed mutation
//! - one bad message never stops the consumer

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use chrono::Utc;
    use serde_json::json;

    use stockpile_catalog::{Product, ProductDraft};
    use stockpile_core::{CategoryId, Page, PageRequest, ProductId};
    use stockpile_events::{keys, InMemoryMessageBus, MessageBus, StockChange, Topic};

    use crate::catalog_service::CatalogService;
    use crate::consumer::CartEventConsumer;
    use crate::publisher::EventPublisher;
    use crate::query::SearchQueryEngine;
    use crate::record_store::{InMemoryRecordStore, RecordStore};
    use crate::search_index::{IndexError, InMemorySearchIndex, SearchCriteria, SearchIndex};
    use crate::stock_ledger::{ReserveOutcome, StockLedger};
    use crate::sync::SyncPropagator;

    struct Stack {
        store: Arc<InMemoryRecordStore>,
        index: Arc<InMemorySearchIndex>,
        bus: Arc<InMemoryMessageBus>,
        ledger: Arc<StockLedger>,
        catalog: CatalogService,
        queries: SearchQueryEngine,
    }

    fn stack() -> Stack {
        let store = Arc::new(InMemoryRecordStore::new());
        let index = Arc::new(InMemorySearchIndex::new());
        let bus = Arc::new(InMemoryMessageBus::new());
        let sync = Arc::new(SyncPropagator::new(index.clone()));
        let publisher = Arc::new(EventPublisher::new(bus.clone()));
        let ledger = Arc::new(StockLedger::new(store.clone(), sync.clone(), publisher.clone()));
        let catalog = CatalogService::new(store.clone(), sync, publisher);
        let queries = SearchQueryEngine::new(store.clone(), index.clone());
        Stack {
            store,
            index,
            bus,
            ledger,
            catalog,
            queries,
        }
    }

    fn draft(stock: u32) -> ProductDraft {
        ProductDraft {
            name: "Wireless headphones".to_string(),
            description: "Over-ear".to_string(),
            brand: "Acme".to_string(),
            category_id: CategoryId::new(),
            category_name: "Electronics".to_string(),
            price_cents: 19_999,
            stock_quantity: stock,
            image_url: None,
        }
    }

    #[test]
    fn created_product_is_immediately_searchable() {
        let s = stack();
        let product = s.catalog.create(draft(5)).unwrap();

        let page = s
            .queries
            .search(Some("wireless"), &PageRequest::default())
            .unwrap();
        assert_eq!(page.total_items, 1);
        assert_eq!(page.items[0].id, product.id);
    }

    #[test]
    fn reservation_flows_through_store_index_and_bus() {
        let s = stack();
        let sub = s.bus.subscribe(Topic::InventoryEvents, "test");
        let product = s.catalog.create(draft(10)).unwrap();

        let outcome = s.ledger.reserve(product.id, 6).unwrap();
        assert_eq!(outcome, ReserveOutcome::Reserved { remaining: 4 });

        assert_eq!(s.store.get(&product.id).unwrap().stock_quantity, 4);
        assert_eq!(s.index.get(&product.id).unwrap().stock_quantity, 4);

        let msg = sub.try_recv().unwrap();
        let change: StockChange = serde_json::from_value(msg.payload).unwrap();
        assert_eq!(change.current_stock, 4);
        assert_eq!(change.quantity_changed, -6);
    }

    #[test]
    fn soft_deleted_product_vanishes_from_search_but_not_storage() {
        let s = stack();
        let product = s.catalog.create(draft(5)).unwrap();

        s.catalog.delete(product.id).unwrap();

        let page = s
            .queries
            .search(Some("wireless"), &PageRequest::default())
            .unwrap();
        assert_eq!(page.total_items, 0);
        assert!(s.store.get(&product.id).is_some());
    }

    /// Index double whose writes can be switched off.
    struct SwitchableIndex {
        healthy: AtomicBool,
        inner: InMemorySearchIndex,
    }

    impl SwitchableIndex {
        fn new() -> Self {
            Self {
                healthy: AtomicBool::new(true),
                inner: InMemorySearchIndex::new(),
            }
        }
    }

    impl SearchIndex for SwitchableIndex {
        fn put(&self, p: Product) -> Result<(), IndexError> {
            if self.healthy.load(Ordering::SeqCst) {
                self.inner.put(p)
            } else {
                Err(IndexError::Write("index offline".to_string()))
            }
        }

        fn query(
            &self,
            c: &SearchCriteria,
            page: &PageRequest,
        ) -> Result<Page<Product>, IndexError> {
            self.inner.query(c, page)
        }
    }

    #[test]
    fn index_outage_does_not_fail_the_reservation_and_heals_via_retry() {
        let index = Arc::new(SwitchableIndex::new());
        let store = Arc::new(InMemoryRecordStore::new());
        let bus = Arc::new(InMemoryMessageBus::new());
        let sync = Arc::new(SyncPropagator::new(index.clone()));
        let publisher = Arc::new(EventPublisher::new(bus.clone()));
        let ledger = StockLedger::new(store.clone(), sync.clone(), publisher);

        let product = Product::from_draft(ProductId::new(), draft(10), Utc::now());
        let id = product.id;
        store.put(product.clone()).unwrap();
        index.put(product).unwrap();

        index.healthy.store(false, Ordering::SeqCst);
        let outcome = ledger.reserve(id, 6).unwrap();
        assert_eq!(outcome, ReserveOutcome::Reserved { remaining: 4 });

        // Primary store committed, index still stale.
        assert_eq!(store.get(&id).unwrap().stock_quantity, 4);
        assert_eq!(index.inner.get(&id).unwrap().stock_quantity, 10);
        assert_eq!(sync.pending_retries(), 1);

        // Index comes back; a retry pass converges the copies.
        index.healthy.store(true, Ordering::SeqCst);
        sync.process_due(Instant::now() + Duration::from_secs(3600));
        assert_eq!(index.inner.get(&id).unwrap().stock_quantity, 4);
        assert!(sync.dead_letters().is_empty());
    }

    #[test]
    fn cart_stream_drives_the_ledger_end_to_end() {
        let s = stack();
        let inventory_sub = s.bus.subscribe(Topic::InventoryEvents, "test");
        let product = s.catalog.create(draft(3)).unwrap();

        let handle = CartEventConsumer::spawn(s.bus.as_ref(), s.ledger.clone());

        s.bus
            .publish(
                Topic::CartEvents,
                "ITEM_ADDED",
                json!({
                    "eventType": "ITEM_ADDED",
                    "userId": "7",
                    "productId": product.id.to_string(),
                    "quantity": 3,
                }),
            )
            .unwrap();

        let deadline = Instant::now() + Duration::from_secs(2);
        while s.store.get(&product.id).unwrap().stock_quantity != 0 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        handle.shutdown();

        assert_eq!(s.store.get(&product.id).unwrap().stock_quantity, 0);

        let msg = inventory_sub.try_recv().unwrap();
        assert_eq!(msg.key, keys::STOCK_UPDATED);
        let change: StockChange = serde_json::from_value(msg.payload).unwrap();
        assert_eq!(change.product_id, product.id);
        assert_eq!(change.current_stock, 0);
        assert_eq!(change.quantity_changed, -3);
    }

    #[test]
    fn poison_message_does_not_block_later_reservations() {
        let s = stack();
        let product = s.catalog.create(draft(5)).unwrap();

        let handle = CartEventConsumer::spawn(s.bus.as_ref(), s.ledger.clone());

        s.bus
            .publish(Topic::CartEvents, "ITEM_ADDED", json!([1, 2, 3]))
            .unwrap();
        s.bus
            .publish(
                Topic::CartEvents,
                "ITEM_ADDED",
                json!({
                    "eventType": "ITEM_ADDED",
                    "userId": 1,
                    "productId": product.id.to_string(),
                    "quantity": 2,
                }),
            )
            .unwrap();

        let deadline = Instant::now() + Duration::from_secs(2);
        while s.store.get(&product.id).unwrap().stock_quantity != 3 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        handle.shutdown();

        assert_eq!(s.store.get(&product.id).unwrap().stock_quantity, 3);
    }

    #[test]
    fn update_propagates_new_price_to_search() {
        let s = stack();
        let product = s.catalog.create(draft(5)).unwrap();

        let mut cheaper = draft(5);
        cheaper.price_cents = 999;
        s.catalog.update(product.id, cheaper).unwrap();

        let page = s
            .queries
            .by_price_range(0, 1000, &PageRequest::default())
            .unwrap();
        assert_eq!(page.total_items, 1);
        assert_eq!(page.items[0].price_cents, 999);
    }
}
