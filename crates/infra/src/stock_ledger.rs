//! Authoritative stock mutation with per-product mutual exclusion.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info};

use stockpile_core::ProductId;
use stockpile_events::{keys, StockChange, Topic};

use crate::publisher::EventPublisher;
use crate::record_store::{RecordStore, RecordStoreError};
use crate::sync::SyncPropagator;

/// Result of a reservation attempt. Insufficiency is a normal outcome,
/// not an error; the caller decides whether to report it upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReserveOutcome {
    Reserved { remaining: u32 },
    Insufficient { available: u32 },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StockLedgerError {
    /// Unknown product id. Surfaced to the immediate caller, not retried.
    #[error("product not found")]
    NotFound,

    /// Zero quantities are rejected before any read.
    #[error("quantity must be positive")]
    InvalidQuantity,

    #[error(transparent)]
    Store(#[from] RecordStoreError),
}

/// Owns the read-modify-write of a product's stock quantity against the
/// primary record store.
///
/// ## Concurrency
///
/// Request handlers and the cart-event consumer mutate stock concurrently.
/// Each mutation takes a per-product lock bracketing read, check and write,
/// so two concurrent reservations can never both observe sufficient stock
/// and drive the quantity negative. Locks are scoped to a single product;
/// there is no ordering hazard because no operation takes two.
///
/// ## After a committed write
///
/// Exactly one index push and one event emission follow each successful
/// write. Both are best-effort: their failure never rolls back the
/// committed mutation.
pub struct StockLedger {
    store: Arc<dyn RecordStore>,
    sync: Arc<SyncPropagator>,
    publisher: Arc<EventPublisher>,
    locks: Mutex<HashMap<ProductId, Arc<Mutex<()>>>>,
}

impl StockLedger {
    pub fn new(
        store: Arc<dyn RecordStore>,
        sync: Arc<SyncPropagator>,
        publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            store,
            sync,
            publisher,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Reserve `quantity` units: decrement only if enough is on hand.
    ///
    /// Emits `stock-updated` with a negative delta on success.
    pub fn reserve(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<ReserveOutcome, StockLedgerError> {
        if quantity == 0 {
            return Err(StockLedgerError::InvalidQuantity);
        }

        let lock = self.lock_for(product_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut product = self.store.get(&product_id).ok_or(StockLedgerError::NotFound)?;

        match product.try_reserve(quantity, Utc::now()) {
            Err(insufficient) => {
                debug!(
                    product_id = %product_id,
                    requested = quantity,
                    available = insufficient.available,
                    "reservation refused: insufficient stock"
                );
                Ok(ReserveOutcome::Insufficient {
                    available: insufficient.available,
                })
            }
            Ok(remaining) => {
                self.store.put(product.clone())?;
                self.sync.push(&product);
                self.publisher.emit(
                    Topic::InventoryEvents,
                    keys::STOCK_UPDATED,
                    &StockChange {
                        product_id,
                        current_stock: remaining,
                        quantity_changed: -(quantity as i64),
                    },
                );
                info!(product_id = %product_id, quantity, remaining, "stock reserved");
                Ok(ReserveOutcome::Reserved { remaining })
            }
        }
    }

    /// Restore `quantity` units unconditionally, returning the new total.
    ///
    /// Compensates a removed cart item or a cancelled reservation. There is
    /// no upper bound, so a duplicated restoration inflates stock. Emits
    /// `stock-restored` with a positive delta.
    pub fn restore(&self, product_id: ProductId, quantity: u32) -> Result<u32, StockLedgerError> {
        if quantity == 0 {
            return Err(StockLedgerError::InvalidQuantity);
        }

        let lock = self.lock_for(product_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut product = self.store.get(&product_id).ok_or(StockLedgerError::NotFound)?;

        let current = product.restore(quantity, Utc::now());
        self.store.put(product.clone())?;
        self.sync.push(&product);
        self.publisher.emit(
            Topic::InventoryEvents,
            keys::STOCK_RESTORED,
            &StockChange {
                product_id,
                current_stock: current,
                quantity_changed: quantity as i64,
            },
        );
        info!(product_id = %product_id, quantity, current, "stock restored");
        Ok(current)
    }

    /// Fetch or create the lock for one product.
    ///
    /// The map lock is held only for the lookup; the returned per-product
    /// lock brackets the actual read-modify-write. The map grows with the
    /// set of mutated products, which is bounded by catalog size.
    fn lock_for(&self, product_id: ProductId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(product_id).or_default().clone()
    }
}
