//! Process-local adapters for every port.
//!
//! They keep the same conditional-write semantics as the Postgres adapters
//! so the services can be exercised without a database.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::events::{OrderCreated, OrderEvent};
use crate::domain::order::{
    GatewayOrder, GatewayOrderRequest, NewOrder, Order, OrderStatus, PaymentStatus,
};
use crate::domain::ports::{
    Email, Mailer, OrderRepository, PaymentGateway, PaymentOutcome, TransitionOutcome,
    UserDirectory, UserProfile, VendorDirectory,
};
use crate::domain::settlement::SettlementLine;
use crate::domain::vendor::{Vendor, VendorKind};

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, DomainError> {
    mutex
        .lock()
        .map_err(|_| DomainError::Internal("in-memory store poisoned".to_string()))
}

fn newest_first(mut orders: Vec<Order>) -> Vec<Order> {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    orders
}

#[derive(Default)]
struct OrderStore {
    orders: Vec<Order>,
    outbox: Vec<OrderEvent>,
}

#[derive(Default)]
pub struct InMemoryOrderRepository {
    store: Mutex<OrderStore>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every event written so far, oldest first.
    pub fn outbox(&self) -> Vec<OrderEvent> {
        self.store
            .lock()
            .map(|s| s.outbox.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn create(&self, new: NewOrder) -> Result<Order, DomainError> {
        let mut store = lock(&self.store)?;
        // Keeps creation order visible for orders placed within the same tick.
        let now = store
            .orders
            .last()
            .map(|o| o.created_at + Duration::microseconds(1))
            .filter(|t| *t > Utc::now())
            .unwrap_or_else(Utc::now);
        let order = Order {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            items: new
                .items
                .into_iter()
                .map(|mut l| {
                    l.is_settled = false;
                    l
                })
                .collect(),
            total_amount: new.total_amount,
            user_name: new.customer.name,
            user_phone: new.customer.phone,
            address: new.address,
            room_number: new.room_number,
            payment_method: new.payment_method,
            payment_status: PaymentStatus::Pending,
            razorpay_order_id: new.razorpay_order_id,
            razorpay_payment_id: None,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        store.orders.push(order.clone());
        store.outbox.push(OrderEvent::Created(OrderCreated {
            order: order.clone(),
        }));
        Ok(order)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError> {
        let store = lock(&self.store)?;
        Ok(store.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, DomainError> {
        let store = lock(&self.store)?;
        Ok(newest_first(
            store
                .orders
                .iter()
                .filter(|o| o.user_id == user_id)
                .cloned()
                .collect(),
        ))
    }

    async fn list_for_vendor(&self, source_id: &str) -> Result<Vec<Order>, DomainError> {
        let store = lock(&self.store)?;
        Ok(newest_first(
            store
                .orders
                .iter()
                .filter(|o| o.has_vendor(source_id))
                .cloned()
                .collect(),
        ))
    }

    async fn record_payment(
        &self,
        id: Uuid,
        payment_id: &str,
    ) -> Result<PaymentOutcome, DomainError> {
        let mut store = lock(&self.store)?;
        let Some(order) = store.orders.iter_mut().find(|o| o.id == id) else {
            return Ok(PaymentOutcome::NotFound);
        };
        if order.payment_status != PaymentStatus::Pending {
            return Ok(PaymentOutcome::NotPending {
                payment_status: order.payment_status,
                payment_id: order.razorpay_payment_id.clone(),
            });
        }
        let confirmed = order.status == OrderStatus::Pending;
        order.payment_status = PaymentStatus::Completed;
        order.razorpay_payment_id = Some(payment_id.to_string());
        if confirmed {
            order.status = OrderStatus::Confirmed;
        }
        order.updated_at = Utc::now();
        store.outbox.push(OrderEvent::PaymentCaptured {
            order_id: id,
            payment_id: payment_id.to_string(),
            confirmed,
        });
        Ok(PaymentOutcome::Captured { confirmed })
    }

    async fn transition_status(
        &self,
        id: Uuid,
        from: &[OrderStatus],
        to: OrderStatus,
    ) -> Result<TransitionOutcome, DomainError> {
        let mut store = lock(&self.store)?;
        let Some(order) = store.orders.iter_mut().find(|o| o.id == id) else {
            return Ok(TransitionOutcome::NotFound);
        };
        let current = order.status;
        if !from.contains(&current) {
            return Ok(TransitionOutcome::Rejected { current });
        }
        order.status = to;
        order.updated_at = Utc::now();
        store.outbox.push(OrderEvent::StatusChanged {
            order_id: id,
            from: current,
            to,
        });
        Ok(TransitionOutcome::Applied { from: current })
    }

    async fn settlement_lines(&self) -> Result<Vec<SettlementLine>, DomainError> {
        let store = lock(&self.store)?;
        Ok(store
            .orders
            .iter()
            .filter(|o| o.status != OrderStatus::Cancelled)
            .flat_map(|o| o.items.iter())
            .map(|l| SettlementLine {
                source: l.source,
                source_id: l.source_id.clone(),
                price: l.price.clone(),
                quantity: l.quantity,
                is_settled: l.is_settled,
            })
            .collect())
    }

    async fn settle_vendor(&self, source_id: &str) -> Result<u64, DomainError> {
        let mut store = lock(&self.store)?;
        let mut settled = 0u64;
        for line in store
            .orders
            .iter_mut()
            .flat_map(|o| o.items.iter_mut())
            .filter(|l| l.source_id == source_id && !l.is_settled)
        {
            line.is_settled = true;
            settled += 1;
        }
        if settled > 0 {
            store.outbox.push(OrderEvent::VendorSettled {
                source_id: source_id.to_string(),
                lines: settled,
            });
        }
        Ok(settled)
    }
}

/// Users and vendors held in memory.
#[derive(Default)]
pub struct InMemoryDirectory {
    users: Mutex<HashMap<Uuid, UserProfile>>,
    vendors: Mutex<Vec<Vendor>>,
    history: Mutex<Vec<(Uuid, Uuid)>>,
    unavailable: AtomicBool,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, user: UserProfile) -> Self {
        if let Ok(mut users) = self.users.lock() {
            users.insert(user.id, user);
        }
        self
    }

    pub fn with_vendor(self, vendor: Vendor) -> Self {
        if let Ok(mut vendors) = self.vendors.lock() {
            vendors.push(vendor);
        }
        self
    }

    /// Makes every lookup and write fail until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Order ids appended for `user_id`, oldest first.
    pub fn history_of(&self, user_id: Uuid) -> Vec<Uuid> {
        self.history
            .lock()
            .map(|h| {
                h.iter()
                    .filter(|(user, _)| *user == user_id)
                    .map(|(_, order)| *order)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn check_available(&self) -> Result<(), DomainError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DomainError::Internal("directory unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for InMemoryDirectory {
    async fn find_user(&self, id: Uuid) -> Result<Option<UserProfile>, DomainError> {
        self.check_available()?;
        Ok(lock(&self.users)?.get(&id).cloned())
    }

    async fn append_order_history(&self, user_id: Uuid, order_id: Uuid) -> Result<(), DomainError> {
        self.check_available()?;
        let mut history = lock(&self.history)?;
        if !history.contains(&(user_id, order_id)) {
            history.push((user_id, order_id));
        }
        Ok(())
    }
}

#[async_trait]
impl VendorDirectory for InMemoryDirectory {
    async fn find_by_id(&self, kind: VendorKind, id: Uuid) -> Result<Option<Vendor>, DomainError> {
        self.check_available()?;
        Ok(lock(&self.vendors)?
            .iter()
            .find(|v| v.kind == kind && v.id == id)
            .cloned())
    }

    async fn find_by_code(
        &self,
        kind: VendorKind,
        code: &str,
    ) -> Result<Option<Vendor>, DomainError> {
        self.check_available()?;
        Ok(lock(&self.vendors)?
            .iter()
            .find(|v| v.kind == kind && v.code.as_deref() == Some(code))
            .cloned())
    }
}

/// Keeps sent mail for inspection. Addresses in `failing` are refused.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<Email>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_for(self, address: &str) -> Self {
        if let Ok(mut failing) = self.failing.lock() {
            failing.insert(address.to_string());
        }
        self
    }

    pub fn sent(&self) -> Vec<Email> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: Email) -> Result<(), DomainError> {
        if lock(&self.failing)?.contains(&email.to) {
            return Err(DomainError::Internal(format!("mailbox {} refused", email.to)));
        }
        lock(&self.sent)?.push(email);
        Ok(())
    }
}

/// Payment gateway that answers locally with `order_gw_<n>` ids.
#[derive(Default)]
pub struct StaticGateway {
    counter: AtomicU64,
    failing: AtomicBool,
    requests: Mutex<Vec<GatewayOrderRequest>>,
}

impl StaticGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<GatewayOrderRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl PaymentGateway for StaticGateway {
    async fn create_order(
        &self,
        request: GatewayOrderRequest,
    ) -> Result<GatewayOrder, DomainError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DomainError::Gateway("gateway unavailable".to_string()));
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let order = GatewayOrder {
            id: format!("order_gw_{n}"),
            amount: request.amount,
            currency: request.currency.clone(),
            receipt: Some(request.receipt.clone()),
            status: "created".to_string(),
        };
        lock(&self.requests)?.push(request);
        Ok(order)
    }
}
