//! Best-effort propagation of committed product snapshots into the search
//! index.

use std::collections::VecDeque;
use std::sync::mpsc;
use std::sync::Arc;
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use stockpile_catalog::Product;

use crate::search_index::SearchIndex;
use crate::worker::WorkerHandle;

/// Retry budget before a snapshot is parked for manual reconciliation.
const MAX_ATTEMPTS: u32 = 5;
/// First retry delay; doubles per attempt.
const BASE_BACKOFF: Duration = Duration::from_millis(50);
/// Retry worker poll interval.
const TICK: Duration = Duration::from_millis(50);

#[derive(Debug)]
struct RetryEntry {
    product: Product,
    /// Attempts already made (the inline push counts as the first).
    attempts: u32,
    due_at: Instant,
}

/// Pushes post-mutation product snapshots into the search index.
///
/// `push` never fails from the caller's perspective: an index write failure
/// must not undo or taint the already-committed record-store mutation. The
/// failed snapshot is queued; a background worker retries with exponential
/// backoff and parks the snapshot in a dead-letter list once the attempt
/// budget is exhausted.
///
/// Same-product pushes may run or retry in any order: the index's
/// last-writer-wins-by-`updated_at` contract makes them commutative.
pub struct SyncPropagator {
    index: Arc<dyn SearchIndex>,
    queue: Mutex<VecDeque<RetryEntry>>,
    dead: Mutex<Vec<Product>>,
}

impl SyncPropagator {
    pub fn new(index: Arc<dyn SearchIndex>) -> Self {
        Self {
            index,
            queue: Mutex::new(VecDeque::new()),
            dead: Mutex::new(Vec::new()),
        }
    }

    /// Propagate one committed snapshot. Best-effort, never errors.
    pub fn push(&self, product: &Product) {
        match self.index.put(product.clone()) {
            Ok(()) => debug!(product_id = %product.id, "index updated"),
            Err(e) => {
                warn!(product_id = %product.id, error = %e, "index write failed; queueing for retry");
                self.enqueue(product.clone(), 1);
            }
        }
    }

    /// Snapshots that exhausted their retry budget, awaiting manual
    /// reconciliation.
    pub fn dead_letters(&self) -> Vec<Product> {
        self.dead.lock().map(|d| d.clone()).unwrap_or_default()
    }

    /// Number of snapshots waiting for a retry.
    pub fn pending_retries(&self) -> usize {
        self.queue.lock().map(|q| q.len()).unwrap_or(0)
    }

    /// Retry every queued snapshot that is due at `now`.
    ///
    /// Called by the background worker each tick; exposed so tests can
    /// drive retries deterministically by passing a future instant.
    pub fn process_due(&self, now: Instant) {
        let due: Vec<RetryEntry> = {
            let mut queue = match self.queue.lock() {
                Ok(q) => q,
                Err(_) => return,
            };
            let mut still_waiting = VecDeque::new();
            let mut due = Vec::new();
            while let Some(entry) = queue.pop_front() {
                if entry.due_at <= now {
                    due.push(entry);
                } else {
                    still_waiting.push_back(entry);
                }
            }
            *queue = still_waiting;
            due
        };

        for entry in due {
            match self.index.put(entry.product.clone()) {
                Ok(()) => {
                    debug!(product_id = %entry.product.id, attempts = entry.attempts + 1, "index retry succeeded")
                }
                Err(e) if entry.attempts + 1 >= MAX_ATTEMPTS => {
                    warn!(
                        product_id = %entry.product.id,
                        attempts = entry.attempts + 1,
                        error = %e,
                        "index write exhausted retries; parking for reconciliation"
                    );
                    if let Ok(mut dead) = self.dead.lock() {
                        dead.push(entry.product);
                    }
                }
                Err(e) => {
                    debug!(product_id = %entry.product.id, attempts = entry.attempts + 1, error = %e, "index retry failed");
                    self.enqueue(entry.product, entry.attempts + 1);
                }
            }
        }
    }

    fn enqueue(&self, product: Product, attempts: u32) {
        let backoff = BASE_BACKOFF * 2u32.saturating_pow(attempts.saturating_sub(1));
        if let Ok(mut queue) = self.queue.lock() {
            queue.push_back(RetryEntry {
                product,
                attempts,
                due_at: Instant::now() + backoff,
            });
        }
    }
}

/// Spawn the background retry worker.
pub fn spawn_retry_worker(sync: Arc<SyncPropagator>) -> WorkerHandle {
    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

    let join = thread::Builder::new()
        .name("index-sync-retry".to_string())
        .spawn(move || loop {
            match shutdown_rx.recv_timeout(TICK) {
                Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
                Err(mpsc::RecvTimeoutError::Timeout) => sync.process_due(Instant::now()),
            }
        })
        .expect("failed to spawn index sync retry thread");

    WorkerHandle::new(shutdown_tx, join)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use stockpile_catalog::ProductDraft;
    use stockpile_core::{CategoryId, Page, PageRequest, ProductId};

    use crate::search_index::{IndexError, InMemorySearchIndex, SearchCriteria};

    fn product() -> Product {
        Product::from_draft(
            ProductId::new(),
            ProductDraft {
                name: "Widget".to_string(),
                description: String::new(),
                brand: "Acme".to_string(),
                category_id: CategoryId::new(),
                category_name: "Electronics".to_string(),
                price_cents: 100,
                stock_quantity: 5,
                image_url: None,
            },
            Utc::now(),
        )
    }

    /// Index double that fails until `healthy` is flipped.
    struct FlakyIndex {
        healthy: AtomicBool,
        writes: AtomicU32,
        inner: InMemorySearchIndex,
    }

    impl FlakyIndex {
        fn new(healthy: bool) -> Self {
            Self {
                healthy: AtomicBool::new(healthy),
                writes: AtomicU32::new(0),
                inner: InMemorySearchIndex::new(),
            }
        }
    }

    impl SearchIndex for FlakyIndex {
        fn put(&self, p: Product) -> Result<(), IndexError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
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

    fn far_future() -> Instant {
        Instant::now() + Duration::from_secs(3600)
    }

    #[test]
    fn successful_push_writes_through() {
        let index = Arc::new(InMemorySearchIndex::new());
        let sync = SyncPropagator::new(index.clone());
        let p = product();

        sync.push(&p);

        assert_eq!(index.get(&p.id).unwrap().id, p.id);
        assert_eq!(sync.pending_retries(), 0);
    }

    #[test]
    fn failed_push_is_queued_then_retried_to_success() {
        let index = Arc::new(FlakyIndex::new(false));
        let sync = SyncPropagator::new(index.clone());
        let p = product();

        sync.push(&p);
        assert_eq!(sync.pending_retries(), 1);

        index.healthy.store(true, Ordering::SeqCst);
        sync.process_due(far_future());

        assert_eq!(sync.pending_retries(), 0);
        assert!(sync.dead_letters().is_empty());
        assert!(index.inner.get(&p.id).is_some());
    }

    #[test]
    fn exhausted_retries_park_the_snapshot() {
        let index = Arc::new(FlakyIndex::new(false));
        let sync = SyncPropagator::new(index.clone());
        let p = product();

        sync.push(&p);
        for _ in 0..MAX_ATTEMPTS {
            sync.process_due(far_future());
        }

        assert_eq!(sync.pending_retries(), 0);
        let dead = sync.dead_letters();
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].id, p.id);
        // Inline push + (MAX_ATTEMPTS - 1) retries before parking.
        assert_eq!(index.writes.load(Ordering::SeqCst), MAX_ATTEMPTS);
    }

    #[test]
    fn entries_are_not_retried_before_their_backoff() {
        let index = Arc::new(FlakyIndex::new(false));
        let sync = SyncPropagator::new(index.clone());

        sync.push(&product());
        let writes_after_push = index.writes.load(Ordering::SeqCst);

        // Immediately due check: backoff has not elapsed yet.
        sync.process_due(Instant::now());
        assert_eq!(index.writes.load(Ordering::SeqCst), writes_after_push);
        assert_eq!(sync.pending_retries(), 1);
    }
}
