use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use bigdecimal::{BigDecimal, Zero};
use log::{info, warn};

use crate::domain::errors::DomainError;
use crate::domain::events::OrderCreated;
use crate::domain::order::{Order, OrderLine};
use crate::domain::ports::{Email, Mailer, OrderEventHandler, UserDirectory, VendorDirectory};
use crate::domain::vendor::{Vendor, VendorKind, VendorRef};

/// Appends each new order to the placing user's history.
pub struct OrderHistoryRecorder {
    users: Arc<dyn UserDirectory>,
}

impl OrderHistoryRecorder {
    pub fn new(users: Arc<dyn UserDirectory>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl OrderEventHandler for OrderHistoryRecorder {
    fn name(&self) -> &'static str {
        "order history"
    }

    async fn on_order_created(&self, event: &OrderCreated) -> Result<(), DomainError> {
        self.users
            .append_order_history(event.order.user_id, event.order.id)
            .await
    }
}

/// Emails every store with lines in a new order, showing only its own lines.
pub struct VendorNotifier {
    vendors: Arc<dyn VendorDirectory>,
    mailer: Arc<dyn Mailer>,
}

impl VendorNotifier {
    pub fn new(vendors: Arc<dyn VendorDirectory>, mailer: Arc<dyn Mailer>) -> Self {
        Self { vendors, mailer }
    }

    async fn notify_store(
        &self,
        order: &Order,
        source_id: &str,
        lines: &[&OrderLine],
    ) -> Result<(), DomainError> {
        let vendor = VendorRef::parse(VendorKind::Store, source_id);
        let Some(store) = self.vendors.resolve(&vendor).await? else {
            warn!("Store {source_id} not found, skipping notification for order {}", order.id);
            return Ok(());
        };
        let Some(email) = store_email(order, &store, lines) else {
            warn!("Store {} has no contact email", store.name);
            return Ok(());
        };
        self.mailer.send(email).await?;
        info!("Notified store {} about order {}", store.name, order.id);
        Ok(())
    }
}

#[async_trait]
impl OrderEventHandler for VendorNotifier {
    fn name(&self) -> &'static str {
        "vendor notification"
    }

    async fn on_order_created(&self, event: &OrderCreated) -> Result<(), DomainError> {
        let order = &event.order;
        for (source_id, lines) in lines_by_store(order) {
            if let Err(e) = self.notify_store(order, source_id, &lines).await {
                warn!("Could not notify store {source_id} about order {}: {e}", order.id);
            }
        }
        Ok(())
    }
}

/// Store lines of `order` grouped by `source_id`. Vending lines are skipped.
pub fn lines_by_store(order: &Order) -> BTreeMap<&str, Vec<&OrderLine>> {
    let mut groups: BTreeMap<&str, Vec<&OrderLine>> = BTreeMap::new();
    for line in order.items.iter().filter(|l| l.source_model == VendorKind::Store) {
        groups.entry(line.source_id.as_str()).or_default().push(line);
    }
    groups
}

pub fn store_email(order: &Order, store: &Vendor, lines: &[&OrderLine]) -> Option<Email> {
    let to = store.email.as_deref().filter(|e| !e.trim().is_empty())?;

    let mut body = String::new();
    let _ = writeln!(body, "New order {} for {}", order.id, store.name);
    let _ = writeln!(body);
    let mut total = BigDecimal::zero();
    for line in lines {
        let subtotal = line.subtotal();
        let _ = writeln!(
            body,
            "{} x {} @ ₹{} = ₹{}",
            line.quantity, line.name, line.price, subtotal
        );
        total += subtotal;
    }
    let _ = writeln!(body, "Total: ₹{total}");
    let _ = writeln!(body);
    let _ = writeln!(body, "Customer: {} ({})", order.user_name, order.user_phone);
    match &order.room_number {
        Some(room) => {
            let _ = writeln!(body, "Deliver to: {}, room {}", order.address, room);
        }
        None => {
            let _ = writeln!(body, "Deliver to: {}", order.address);
        }
    }
    let _ = writeln!(body, "Payment: {}", order.payment_method);

    Some(Email {
        to: to.to_string(),
        subject: format!("New order #{}", short_id(order)),
        body,
    })
}

fn short_id(order: &Order) -> String {
    order.id.simple().to_string()[..8].to_uppercase()
}
