use serde_json::{json, Value};
use uuid::Uuid;

use super::order::{Order, OrderStatus};

/// Published once the order row is committed.
#[derive(Debug, Clone)]
pub struct OrderCreated {
    pub order: Order,
}

/// State changes recorded in the outbox alongside the write that caused them.
#[derive(Debug, Clone)]
pub enum OrderEvent {
    Created(OrderCreated),
    PaymentCaptured {
        order_id: Uuid,
        payment_id: String,
        confirmed: bool,
    },
    StatusChanged {
        order_id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
    },
    VendorSettled {
        source_id: String,
        lines: u64,
    },
}

impl OrderEvent {
    pub fn aggregate_type(&self) -> &'static str {
        match self {
            OrderEvent::VendorSettled { .. } => "Vendor",
            _ => "Order",
        }
    }

    pub fn aggregate_id(&self) -> String {
        match self {
            OrderEvent::Created(e) => e.order.id.to_string(),
            OrderEvent::PaymentCaptured { order_id, .. }
            | OrderEvent::StatusChanged { order_id, .. } => order_id.to_string(),
            OrderEvent::VendorSettled { source_id, .. } => source_id.clone(),
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::Created(_) => "OrderCreated",
            OrderEvent::PaymentCaptured { .. } => "PaymentCaptured",
            OrderEvent::StatusChanged { .. } => "OrderStatusChanged",
            OrderEvent::VendorSettled { .. } => "VendorSettled",
        }
    }

    pub fn payload(&self) -> Value {
        match self {
            OrderEvent::Created(OrderCreated { order }) => {
                let lines: Vec<Value> = order
                    .items
                    .iter()
                    .map(|l| {
                        json!({
                            "product_id": l.product_id,
                            "name": l.name,
                            "quantity": l.quantity,
                            "price": l.price.to_string(),
                            "source": l.source,
                            "source_id": l.source_id,
                        })
                    })
                    .collect();
                json!({
                    "order_id": order.id,
                    "user_id": order.user_id,
                    "status": order.status,
                    "payment_method": order.payment_method,
                    "total_amount": order.total_amount.to_string(),
                    "lines": lines,
                })
            }
            OrderEvent::PaymentCaptured {
                order_id,
                payment_id,
                confirmed,
            } => json!({
                "order_id": order_id,
                "payment_id": payment_id,
                "confirmed": confirmed,
            }),
            OrderEvent::StatusChanged { order_id, from, to } => json!({
                "order_id": order_id,
                "from": from,
                "to": to,
            }),
            OrderEvent::VendorSettled { source_id, lines } => json!({
                "source_id": source_id,
                "lines": lines,
            }),
        }
    }
}
