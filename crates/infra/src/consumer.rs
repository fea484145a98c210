//! Cart event consumption: translates upstream cart lifecycle events into
//! stock mutations.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use stockpile_events::{BusMessage, CartEvent, CartEventKind, MessageBus, Topic};

use crate::stock_ledger::{ReserveOutcome, StockLedger, StockLedgerError};
use crate::worker::WorkerHandle;

/// Consumer group this service joins on the cart topic.
pub const GROUP_ID: &str = "catalog-service-group";

const TICK: Duration = Duration::from_millis(250);

/// Subscribes to `cart-events` and drives the stock ledger.
///
/// Every message is handled inside its own failure boundary: a malformed
/// payload, a refused reservation or even a panic in the handler is logged
/// and the loop moves on. Nothing a single message does can stop the
/// subscription. Messages are considered consumed regardless of whether the
/// mapped ledger call succeeded; no compensation event is sent back to the
/// cart stream on a refused reservation, only a warning.
///
/// Redelivery is the broker's job; handlers tolerate it. A redelivered
/// `ITEM_ADDED` reserves again; the upstream producer keys messages so
/// duplicates are rare, and restorations compensate.
pub struct CartEventConsumer;

impl CartEventConsumer {
    /// Spawn the consumer worker thread.
    pub fn spawn(bus: &dyn MessageBus, ledger: Arc<StockLedger>) -> WorkerHandle {
        let subscription = bus.subscribe(Topic::CartEvents, GROUP_ID);
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let join = thread::Builder::new()
            .name("cart-event-consumer".to_string())
            .spawn(move || loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                match subscription.recv_timeout(TICK) {
                    Ok(message) => {
                        // One message, one failure boundary.
                        let outcome = catch_unwind(AssertUnwindSafe(|| {
                            handle_cart_message(&ledger, &message)
                        }));
                        if outcome.is_err() {
                            warn!(key = %message.key, "cart event handler panicked; message dropped");
                        }
                    }
                    Err(mpsc::RecvTimeoutError::Timeout) => continue,
                    Err(mpsc::RecvTimeoutError::Disconnected) => break,
                }
            })
            .expect("failed to spawn cart event consumer thread");

        WorkerHandle::new(shutdown_tx, join)
    }
}

/// Handle one cart message. Never returns an error: every failure mode is
/// logged and the message counts as consumed.
pub fn handle_cart_message(ledger: &StockLedger, message: &BusMessage) {
    let event = match CartEvent::from_payload(&message.payload) {
        Ok(event) => event,
        Err(e) => {
            warn!(key = %message.key, error = %e, "discarding unreadable cart event");
            return;
        }
    };

    match event.kind {
        CartEventKind::ItemAdded => match ledger.reserve(event.product_id, event.quantity) {
            Ok(ReserveOutcome::Reserved { remaining }) => {
                info!(
                    product_id = %event.product_id,
                    quantity = event.quantity,
                    remaining,
                    "stock reserved for cart item"
                );
            }
            Ok(ReserveOutcome::Insufficient { available }) => {
                warn!(
                    product_id = %event.product_id,
                    quantity = event.quantity,
                    available,
                    "failed to reserve stock for cart item"
                );
            }
            Err(e) => log_ledger_error(&event, e, "reserve"),
        },
        CartEventKind::ItemRemoved => match ledger.restore(event.product_id, event.quantity) {
            Ok(current) => {
                info!(
                    product_id = %event.product_id,
                    quantity = event.quantity,
                    current,
                    "stock restored for removed cart item"
                );
            }
            Err(e) => log_ledger_error(&event, e, "restore"),
        },
        CartEventKind::ItemUpdated => {
            // The payload carries only the new quantity, not the previously
            // reserved one, so no correct delta can be derived here. Stock
            // is left unchanged.
            debug!(product_id = %event.product_id, "cart item updated; no stock mutation");
        }
        CartEventKind::CheckoutInitiated => {
            info!(user_id = ?event.user_id, total_items = event.quantity, "checkout initiated");
        }
        CartEventKind::Unknown(tag) => {
            warn!(event_type = %tag, "unknown cart event type; discarding");
        }
    }
}

fn log_ledger_error(event: &CartEvent, error: StockLedgerError, operation: &str) {
    warn!(
        product_id = %event.product_id,
        quantity = event.quantity,
        operation,
        error = %error,
        "cart event stock mutation failed"
    );
}
