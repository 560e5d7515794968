use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

/// Events emitted by the order lifecycle engine after a transition commits.
/// These are observability signals, not part of the unit of work: a failed
/// send never rolls anything back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Order lifecycle events
    OrderCreated(Uuid),
    OrderUpdated(Uuid),
    OrderCompleted(Uuid),
    OrderCancelled(Uuid),
    OrderResumed(Uuid),

    // Ledger events
    StockReserved {
        order_id: Uuid,
        product_id: Uuid,
        warehouse_id: Uuid,
        quantity: i32,
    },
    StockReturned {
        order_id: Uuid,
        product_id: Uuid,
        warehouse_id: Uuid,
        quantity: i32,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Drains the event channel, logging each event. Spawned once at startup.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::OrderCreated(id) => info!(order_id = %id, "order created"),
            Event::OrderUpdated(id) => info!(order_id = %id, "order updated"),
            Event::OrderCompleted(id) => info!(order_id = %id, "order completed"),
            Event::OrderCancelled(id) => info!(order_id = %id, "order cancelled"),
            Event::OrderResumed(id) => info!(order_id = %id, "order resumed"),
            Event::StockReserved {
                order_id,
                product_id,
                warehouse_id,
                quantity,
            } => debug!(
                %order_id, %product_id, %warehouse_id, quantity,
                "stock reserved"
            ),
            Event::StockReturned {
                order_id,
                product_id,
                warehouse_id,
                quantity,
                reason,
            } => debug!(
                %order_id, %product_id, %warehouse_id, quantity, reason,
                "stock returned"
            ),
        }
    }
    debug!("event channel closed; processor exiting");
}
