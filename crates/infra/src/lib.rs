//! Infrastructure layer: stores, bus adapters, and the mutation/sync/consume
//! pipeline around the catalog domain.
//!
//! Data flow:
//!
//! ```text
//! admin mutation ──► StockLedger / CatalogService ──► RecordStore (commit)
//!                                                        │
//!                                              SyncPropagator ──► SearchIndex
//!                                                        │
//!                                              EventPublisher ──► MessageBus
//!
//! cart-events ──► CartEventConsumer ──► StockLedger (same pipeline)
//! read queries ──► SearchQueryEngine ──► SearchIndex (or RecordStore fallback)
//! ```
//!
//! The two stores are never updated atomically as a pair: the record store
//! commit is authoritative, the index write is best-effort and eventually
//! consistent.

pub mod analytics;
pub mod bus;
pub mod catalog_service;
pub mod categories;
pub mod consumer;
pub mod publisher;
pub mod query;
pub mod record_store;
pub mod search_index;
pub mod stock_ledger;
pub mod sync;
pub mod worker;

#[cfg(test)]
mod integration_tests;

pub use analytics::SearchAnalytics;
pub use catalog_service::{CatalogService, CatalogServiceError};
pub use categories::CategoryDirectory;
pub use consumer::CartEventConsumer;
pub use publisher::EventPublisher;
pub use query::{QueryError, SearchQueryEngine};
pub use record_store::{InMemoryRecordStore, RecordStore, RecordStoreError};
pub use search_index::{InMemorySearchIndex, IndexError, SearchCriteria, SearchIndex};
pub use stock_ledger::{ReserveOutcome, StockLedger, StockLedgerError};
pub use sync::SyncPropagator;
pub use worker::WorkerHandle;
