//! Infrastructure wiring for the HTTP app.

use std::sync::Arc;

use stockpile_events::{InMemoryMessageBus, MessageBus};
use stockpile_infra::{
    sync::spawn_retry_worker, CartEventConsumer, CatalogService, CategoryDirectory,
    EventPublisher, InMemoryRecordStore, InMemorySearchIndex, SearchAnalytics, SearchQueryEngine,
    StockLedger, SyncPropagator, WorkerHandle,
};

#[cfg(feature = "redis")]
use stockpile_infra::bus::RedisPubSubBus;

/// All components a request handler can reach, plus the background worker
/// handles keeping the consumer and retrier alive for the app's lifetime.
pub struct AppServices {
    pub catalog: CatalogService,
    pub ledger: Arc<StockLedger>,
    pub queries: SearchQueryEngine,
    pub analytics: SearchAnalytics,
    pub categories: Arc<CategoryDirectory>,
    pub sync: Arc<SyncPropagator>,
    _workers: Vec<WorkerHandle>,
}

/// Wire the full stack.
///
/// Defaults to in-memory store/index/bus (dev/test). With the `redis`
/// feature enabled and `REDIS_URL` set, the bus rides on Redis pub/sub
/// instead, so cart events can arrive from outside the process.
pub fn build_services() -> AppServices {
    let bus = build_bus();

    let store = Arc::new(InMemoryRecordStore::new());
    let index = Arc::new(InMemorySearchIndex::new());

    let sync = Arc::new(SyncPropagator::new(index.clone()));
    let publisher = Arc::new(EventPublisher::new(bus.clone()));
    let ledger = Arc::new(StockLedger::new(store.clone(), sync.clone(), publisher.clone()));

    let catalog = CatalogService::new(store.clone(), sync.clone(), publisher.clone());
    let queries = SearchQueryEngine::new(store, index);
    let analytics = SearchAnalytics::new(publisher);

    let categories = Arc::new(CategoryDirectory::new());
    categories.seed_defaults();

    let workers = vec![
        CartEventConsumer::spawn(bus.as_ref(), ledger.clone()),
        spawn_retry_worker(sync.clone()),
    ];

    AppServices {
        catalog,
        ledger,
        queries,
        analytics,
        categories,
        sync,
        _workers: workers,
    }
}

fn build_bus() -> Arc<dyn MessageBus> {
    #[cfg(feature = "redis")]
    if let Ok(url) = std::env::var("REDIS_URL") {
        match RedisPubSubBus::new(&url) {
            Ok(bus) => {
                tracing::info!("using redis pub/sub message bus");
                return Arc::new(bus);
            }
            Err(e) => {
                tracing::warn!(error = %e, "redis bus unavailable; falling back to in-memory");
            }
        }
    }

    Arc::new(InMemoryMessageBus::new())
}
