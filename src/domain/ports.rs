use async_trait::async_trait;
use uuid::Uuid;

use super::errors::DomainError;
use super::events::OrderCreated;
use super::order::{GatewayOrder, GatewayOrderRequest, NewOrder, Order, OrderStatus, PaymentStatus};
use super::settlement::SettlementLine;
use super::vendor::{Vendor, VendorKey, VendorKind, VendorRef};

/// Result of a conditional status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    Applied { from: OrderStatus },
    Rejected { current: OrderStatus },
    NotFound,
}

/// Result of recording a verified payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    /// Payment stored. `confirmed` is false when the order had already left
    /// `PENDING` (e.g. it was cancelled while the customer was paying).
    Captured { confirmed: bool },
    /// The order's payment was no longer `PENDING`.
    NotPending {
        payment_status: PaymentStatus,
        payment_id: Option<String>,
    },
    NotFound,
}

/// Persistence for orders. Every mutating call is a single atomic unit and
/// writes its outbox event in the same transaction.
#[async_trait]
pub trait OrderRepository: Send + Sync + 'static {
    async fn create(&self, order: NewOrder) -> Result<Order, DomainError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError>;
    /// Newest first.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, DomainError>;
    /// Orders with at least one line from `source_id`, newest first.
    async fn list_for_vendor(&self, source_id: &str) -> Result<Vec<Order>, DomainError>;
    /// Marks the payment completed if it is still pending, and confirms the
    /// order if it is still pending.
    async fn record_payment(&self, id: Uuid, payment_id: &str)
        -> Result<PaymentOutcome, DomainError>;
    /// Sets `to` only if the current status is one of `from`.
    async fn transition_status(
        &self,
        id: Uuid,
        from: &[OrderStatus],
        to: OrderStatus,
    ) -> Result<TransitionOutcome, DomainError>;
    /// Lines of every order that is not cancelled.
    async fn settlement_lines(&self) -> Result<Vec<SettlementLine>, DomainError>;
    /// Flips every unsettled line of `source_id` in one conditional update and
    /// returns the number of lines changed.
    async fn settle_vendor(&self, source_id: &str) -> Result<u64, DomainError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[async_trait]
pub trait UserDirectory: Send + Sync + 'static {
    async fn find_user(&self, id: Uuid) -> Result<Option<UserProfile>, DomainError>;
    async fn append_order_history(&self, user_id: Uuid, order_id: Uuid) -> Result<(), DomainError>;
}

#[async_trait]
pub trait VendorDirectory: Send + Sync + 'static {
    async fn find_by_id(&self, kind: VendorKind, id: Uuid) -> Result<Option<Vendor>, DomainError>;
    async fn find_by_code(&self, kind: VendorKind, code: &str)
        -> Result<Option<Vendor>, DomainError>;

    /// Resolves a line's vendor by database id, falling back to the short
    /// code when the id lookup misses.
    async fn resolve(&self, vendor: &VendorRef) -> Result<Option<Vendor>, DomainError> {
        match &vendor.key {
            VendorKey::Id(id) => match self.find_by_id(vendor.kind, *id).await? {
                Some(found) => Ok(Some(found)),
                None => self.find_by_code(vendor.kind, &id.to_string()).await,
            },
            VendorKey::Code(code) => self.find_by_code(vendor.kind, code).await,
        }
    }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync + 'static {
    async fn create_order(&self, request: GatewayOrderRequest) -> Result<GatewayOrder, DomainError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    async fn send(&self, email: Email) -> Result<(), DomainError>;
}

/// Consumer of committed orders. Failures never affect the order itself.
#[async_trait]
pub trait OrderEventHandler: Send + Sync + 'static {
    fn name(&self) -> &'static str;
    async fn on_order_created(&self, event: &OrderCreated) -> Result<(), DomainError>;
}
