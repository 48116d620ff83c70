use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Notifications emitted after successful mutations. Consumers must never
/// affect the request that produced the event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Catalog
    ProductCreated(Uuid),
    ProductUpdated(Uuid),
    ProductDeleted(Uuid),
    CategoryCreated(Uuid),
    CategoryUpdated(Uuid),
    CategoryDeleted(Uuid),

    // Carts
    CartCreated(Uuid),
    CartItemAdded { cart_id: Uuid, product_id: Uuid },
    CartItemUpdated { cart_id: Uuid, item_id: Uuid },
    CartItemRemoved { cart_id: Uuid, item_id: Uuid },
    CartCleared(Uuid),
    CartCheckedOut { cart_id: Uuid, order_id: Uuid },

    // Orders
    OrderCreated(Uuid),
    OrderItemsReplaced(Uuid),
    OrderStatusChanged {
        order_id: Uuid,
        old_status: String,
        new_status: String,
    },
    OrderCancelled {
        order_id: Uuid,
        motivo: String,
    },
    OrderDeleted(Uuid),

    // Quotations
    QuotationCreated(Uuid),
    QuotationUpdated(Uuid),
    QuotationResolved {
        quotation_id: Uuid,
        outcome: String,
    },
    QuotationConverted {
        quotation_id: Uuid,
        order_id: Uuid,
    },
    QuotationDeleted(Uuid),

    // Directory
    ClientCreated(Uuid),
    ClientUpdated(Uuid),
    ClientDeleted(Uuid),
    SupplierCreated(Uuid),
    SupplierUpdated(Uuid),
    SupplierDeleted(Uuid),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Fire-and-forget send. A full or closed channel drops the event with a
    /// warning; the originating request already committed and must succeed.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("Event dropped: {}", e);
        }
    }
}

/// Consumes the event channel for the life of the process. Today the
/// consumer only logs; it is the single seam where side effects
/// (notifications, webhooks) would attach.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            } => {
                info!(%order_id, %old_status, %new_status, "Order status changed");
            }
            Event::OrderCancelled { order_id, motivo } => {
                info!(%order_id, motivo = %motivo, "Order cancelled");
            }
            Event::QuotationConverted {
                quotation_id,
                order_id,
            } => {
                info!(%quotation_id, %order_id, "Quotation converted into order");
            }
            Event::CartCheckedOut { cart_id, order_id } => {
                info!(%cart_id, %order_id, "Cart checked out");
            }
            other => {
                info!("Event: {:?}", other);
            }
        }
    }

    info!("Event channel closed, stopping event processing loop");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_or_log_swallows_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);
        // Must not panic or error out
        sender.send_or_log(Event::OrderCreated(Uuid::new_v4())).await;
    }

    #[tokio::test]
    async fn events_reach_the_consumer() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);
        let order_id = Uuid::new_v4();

        sender
            .send(Event::OrderCreated(order_id))
            .await
            .expect("send");

        match rx.recv().await {
            Some(Event::OrderCreated(id)) => assert_eq!(id, order_id),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
