//! Order lifecycle against the in-memory adapters: checkout, payment
//! callbacks, fulfilment and vendor settlement.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use uuid::Uuid;

use campus_orders::application::notifier::{OrderHistoryRecorder, VendorNotifier};
use campus_orders::application::order_service::OrderService;
use campus_orders::application::payment_service::{PaymentService, Verification};
use campus_orders::application::settlement_service::SettlementService;
use campus_orders::application::status_service::StatusService;
use campus_orders::config::Secret;
use campus_orders::domain::errors::DomainError;
use campus_orders::domain::events::OrderCreated;
use campus_orders::domain::order::{
    Checkout, GatewayOrder, GatewayOrderRequest, ItemModel, LineSource, OrderLine, OrderStatus,
    PaymentMethod, PaymentStatus,
};
use campus_orders::domain::ports::{OrderEventHandler, PaymentGateway, UserProfile};
use campus_orders::domain::signature::payment_signature;
use campus_orders::domain::status::TransitionPolicy;
use campus_orders::domain::vendor::{Vendor, VendorKind};
use campus_orders::infrastructure::in_memory::{
    InMemoryDirectory, InMemoryOrderRepository, RecordingMailer, StaticGateway,
};

const SECRET: &str = "test_secret";
const CANTEEN_EMAIL: &str = "canteen@campus.test";
const JUICE_EMAIL: &str = "juice@campus.test";

struct Harness {
    repo: Arc<InMemoryOrderRepository>,
    directory: Arc<InMemoryDirectory>,
    mailer: Arc<RecordingMailer>,
    gateway: Arc<StaticGateway>,
    orders: OrderService,
    payments: PaymentService,
    statuses: StatusService,
    settlements: SettlementService,
    user: Uuid,
    juice_bar: Uuid,
}

impl Harness {
    fn new() -> Self {
        Self::build(TransitionPolicy::default(), RecordingMailer::new())
    }

    fn build(policy: TransitionPolicy, mailer: RecordingMailer) -> Self {
        let user = Uuid::new_v4();
        let juice_bar = Uuid::new_v4();
        let directory = Arc::new(
            InMemoryDirectory::new()
                .with_user(UserProfile {
                    id: user,
                    name: "Asha Rao".to_string(),
                    phone: Some("9876543210".to_string()),
                    email: Some("asha@campus.test".to_string()),
                })
                .with_vendor(Vendor {
                    kind: VendorKind::Store,
                    id: Uuid::new_v4(),
                    code: Some("2".to_string()),
                    name: "Night Canteen".to_string(),
                    email: Some(CANTEEN_EMAIL.to_string()),
                })
                .with_vendor(Vendor {
                    kind: VendorKind::Store,
                    id: juice_bar,
                    code: None,
                    name: "Juice Bar".to_string(),
                    email: Some(JUICE_EMAIL.to_string()),
                })
                .with_vendor(Vendor {
                    kind: VendorKind::VendingMachine,
                    id: Uuid::new_v4(),
                    code: Some("69".to_string()),
                    name: "Library Vending".to_string(),
                    email: None,
                }),
        );
        let repo = Arc::new(InMemoryOrderRepository::new());
        let mailer = Arc::new(mailer);
        let gateway = Arc::new(StaticGateway::new());

        let orders = OrderService::new(repo.clone(), directory.clone(), gateway.clone())
            .with_handler(Arc::new(OrderHistoryRecorder::new(directory.clone())))
            .with_handler(Arc::new(VendorNotifier::new(directory.clone(), mailer.clone())));
        let payments = PaymentService::new(repo.clone(), Some(Secret::new(SECRET.to_string())));
        let statuses = StatusService::new(repo.clone(), policy);
        let settlements = SettlementService::new(repo.clone(), directory.clone());

        Self {
            repo,
            directory,
            mailer,
            gateway,
            orders,
            payments,
            statuses,
            settlements,
            user,
            juice_bar,
        }
    }

    fn checkout(&self, method: PaymentMethod, items: Vec<OrderLine>, total: &str) -> Checkout {
        Checkout {
            user_id: self.user,
            items,
            total_amount: dec(total),
            payment_method: method,
            address: "Hostel B".to_string(),
            room_number: Some("204".to_string()),
        }
    }

    async fn place(&self, method: PaymentMethod, items: Vec<OrderLine>, total: &str) -> Uuid {
        self.orders
            .create_order(self.checkout(method, items, total))
            .await
            .unwrap()
            .order_id
    }

    async fn status_of(&self, id: Uuid) -> (OrderStatus, PaymentStatus) {
        let order = self.orders.get_order(id).await.unwrap();
        (order.status, order.payment_status)
    }
}

fn dec(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).unwrap()
}

fn store_line(source_id: &str, name: &str, price: &str, quantity: i32) -> OrderLine {
    OrderLine {
        product_id: format!("{name}-sku"),
        item_model: ItemModel::Product,
        name: name.to_string(),
        price: dec(price),
        quantity,
        source: LineSource::Store,
        source_id: source_id.to_string(),
        source_model: VendorKind::Store,
        is_settled: false,
    }
}

fn vending_line(source_id: &str, price: &str, quantity: i32) -> OrderLine {
    OrderLine {
        product_id: "chips-sku".to_string(),
        item_model: ItemModel::VendingItem,
        name: "Chips".to_string(),
        price: dec(price),
        quantity,
        source: LineSource::Vending,
        source_id: source_id.to_string(),
        source_model: VendorKind::VendingMachine,
        is_settled: false,
    }
}

fn canteen_cart() -> Vec<OrderLine> {
    vec![
        store_line("2", "Masala Dosa", "30", 1),
        store_line("2", "Chai", "20", 2),
    ]
}

// ── Checkout ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn cod_orders_start_pending_without_a_gateway_order() {
    let h = Harness::new();
    let placed = h
        .orders
        .create_order(h.checkout(PaymentMethod::Cod, canteen_cart(), "70"))
        .await
        .unwrap();
    assert!(placed.gateway_order.is_none());

    let order = h.orders.get_order(placed.order_id).await.unwrap();
    assert_eq!(order.payment_method, PaymentMethod::Cod);
    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert_eq!(order.status, OrderStatus::Pending);
    assert!(order.razorpay_order_id.is_none());
    assert_eq!(order.user_name, "Asha Rao");
    assert_eq!(order.user_phone, "9876543210");
    assert!(h.gateway.requests().is_empty());
}

#[tokio::test]
async fn online_orders_open_a_gateway_order_in_paise() {
    let h = Harness::new();
    let placed = h
        .orders
        .create_order(h.checkout(PaymentMethod::Online, canteen_cart(), "70"))
        .await
        .unwrap();

    let gateway_order = placed.gateway_order.unwrap();
    assert_eq!(gateway_order.amount, 7000);
    assert_eq!(gateway_order.currency, "INR");

    let requests = h.gateway.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].receipt.starts_with("receipt_"));

    let order = h.orders.get_order(placed.order_id).await.unwrap();
    assert_eq!(order.razorpay_order_id.as_deref(), Some(gateway_order.id.as_str()));
    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert_eq!(order.status, OrderStatus::Pending);
}

#[tokio::test]
async fn gateway_failure_leaves_no_order_behind() {
    let h = Harness::new();
    h.gateway.set_failing(true);

    let err = h
        .orders
        .create_order(h.checkout(PaymentMethod::Online, canteen_cart(), "70"))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Gateway(_)));
    assert!(h.orders.list_user_orders(h.user).await.unwrap().is_empty());
    assert!(h.repo.outbox().is_empty());
    assert!(h.mailer.sent().is_empty());
}

struct HangingGateway;

#[async_trait]
impl PaymentGateway for HangingGateway {
    async fn create_order(
        &self,
        _request: GatewayOrderRequest,
    ) -> Result<GatewayOrder, DomainError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Err(DomainError::Gateway("unreachable".to_string()))
    }
}

#[tokio::test]
async fn hung_gateway_times_out() {
    let repo = Arc::new(InMemoryOrderRepository::new());
    let service = OrderService::new(
        repo.clone(),
        Arc::new(InMemoryDirectory::new()),
        Arc::new(HangingGateway),
    )
    .with_gateway_timeout(Duration::from_millis(50));

    let checkout = Checkout {
        user_id: Uuid::new_v4(),
        items: canteen_cart(),
        total_amount: dec("70"),
        payment_method: PaymentMethod::Online,
        address: "Hostel A".to_string(),
        room_number: None,
    };
    let err = service.create_order(checkout).await.unwrap_err();
    assert!(matches!(err, DomainError::Gateway(msg) if msg.contains("no response")));
    assert!(repo.outbox().is_empty());
}

#[tokio::test]
async fn invalid_carts_are_rejected_before_any_side_effect() {
    let h = Harness::new();
    let cases = vec![
        h.checkout(PaymentMethod::Online, vec![], "70"),
        h.checkout(PaymentMethod::Online, vec![store_line("2", "Chai", "20", 0)], "20"),
        h.checkout(PaymentMethod::Online, vec![store_line("2", "Chai", "-1", 1)], "20"),
        h.checkout(PaymentMethod::Online, canteen_cart(), "0"),
    ];
    for checkout in cases {
        let err = h.orders.create_order(checkout).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)), "got {err:?}");
    }
    assert!(h.gateway.requests().is_empty());
    assert!(h.repo.outbox().is_empty());
}

#[tokio::test]
async fn total_mismatch_is_accepted() {
    let h = Harness::new();
    let id = h.place(PaymentMethod::Cod, canteen_cart(), "75").await;
    let order = h.orders.get_order(id).await.unwrap();
    assert_eq!(order.total_amount, dec("75"));
}

#[tokio::test]
async fn unknown_user_gets_an_unknown_snapshot() {
    let h = Harness::new();
    let mut checkout = h.checkout(PaymentMethod::Cod, canteen_cart(), "70");
    checkout.user_id = Uuid::new_v4();
    let placed = h.orders.create_order(checkout).await.unwrap();

    let order = h.orders.get_order(placed.order_id).await.unwrap();
    assert_eq!(order.user_name, "Unknown");
    assert_eq!(order.user_phone, "Unknown");
}

#[tokio::test]
async fn get_order_reports_unknown_ids() {
    let h = Harness::new();
    let err = h.orders.get_order(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, DomainError::OrderNotFound));
}

// ── Post-commit handlers ─────────────────────────────────────────────────────

#[tokio::test]
async fn new_orders_are_appended_to_the_user_history() {
    let h = Harness::new();
    let first = h.place(PaymentMethod::Cod, canteen_cart(), "70").await;
    let second = h.place(PaymentMethod::Cod, canteen_cart(), "70").await;
    assert_eq!(h.directory.history_of(h.user), vec![first, second]);

    let listed: Vec<Uuid> = h
        .orders
        .list_user_orders(h.user)
        .await
        .unwrap()
        .iter()
        .map(|o| o.id)
        .collect();
    assert_eq!(listed, vec![second, first]);
}

#[tokio::test]
async fn each_store_is_mailed_only_its_own_lines() {
    let h = Harness::new();
    let juice = h.juice_bar.to_string();
    let items = vec![
        store_line("2", "Masala Dosa", "30", 1),
        store_line(&juice, "Mango Shake", "45", 1),
        store_line("2", "Chai", "20", 2),
        vending_line("69", "10", 1),
    ];
    h.place(PaymentMethod::Cod, items, "125").await;

    let sent = h.mailer.sent();
    assert_eq!(sent.len(), 2);

    let canteen = sent.iter().find(|m| m.to == CANTEEN_EMAIL).unwrap();
    assert!(canteen.body.contains("Masala Dosa"));
    assert!(canteen.body.contains("Chai"));
    assert!(!canteen.body.contains("Mango Shake"));
    assert!(canteen.body.contains("Total: ₹70"));

    let juice_mail = sent.iter().find(|m| m.to == JUICE_EMAIL).unwrap();
    assert!(juice_mail.body.contains("Mango Shake"));
    assert!(!juice_mail.body.contains("Chips"));
}

#[tokio::test]
async fn mail_failure_for_one_store_does_not_stop_the_others() {
    let h = Harness::build(
        TransitionPolicy::default(),
        RecordingMailer::new().fail_for(CANTEEN_EMAIL),
    );
    let juice = h.juice_bar.to_string();
    let items = vec![
        store_line("2", "Chai", "20", 1),
        store_line(&juice, "Mango Shake", "45", 1),
    ];
    let id = h.place(PaymentMethod::Cod, items, "65").await;

    let sent = h.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, JUICE_EMAIL);
    assert!(h.orders.get_order(id).await.is_ok());
}

#[tokio::test]
async fn directory_outage_does_not_fail_checkout() {
    let h = Harness::new();
    h.directory.set_unavailable(true);

    let placed = h
        .orders
        .create_order(h.checkout(PaymentMethod::Cod, canteen_cart(), "70"))
        .await
        .unwrap();
    let order = h.orders.get_order(placed.order_id).await.unwrap();
    assert_eq!(order.user_name, "Unknown");
    assert!(h.mailer.sent().is_empty());
}

struct FailingHandler;

#[async_trait]
impl OrderEventHandler for FailingHandler {
    fn name(&self) -> &'static str {
        "always failing"
    }

    async fn on_order_created(&self, _event: &OrderCreated) -> Result<(), DomainError> {
        Err(DomainError::Internal("boom".to_string()))
    }
}

#[tokio::test]
async fn failing_handlers_never_fail_the_order() {
    let repo = Arc::new(InMemoryOrderRepository::new());
    let service = OrderService::new(
        repo.clone(),
        Arc::new(InMemoryDirectory::new()),
        Arc::new(StaticGateway::new()),
    )
    .with_handler(Arc::new(FailingHandler));

    let checkout = Checkout {
        user_id: Uuid::new_v4(),
        items: canteen_cart(),
        total_amount: dec("70"),
        payment_method: PaymentMethod::Cod,
        address: "Hostel A".to_string(),
        room_number: None,
    };
    let placed = service.create_order(checkout).await.unwrap();
    assert!(service.get_order(placed.order_id).await.is_ok());
}

/// Stands in for a mail relay that accepts the connection and never answers.
struct StalledHandler;

#[async_trait]
impl OrderEventHandler for StalledHandler {
    fn name(&self) -> &'static str {
        "stalled"
    }

    async fn on_order_created(&self, _event: &OrderCreated) -> Result<(), DomainError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(())
    }
}

#[tokio::test]
async fn stalled_handlers_do_not_hold_up_checkout() {
    let repo = Arc::new(InMemoryOrderRepository::new());
    let directory = Arc::new(InMemoryDirectory::new());
    let service = OrderService::new(
        repo.clone(),
        directory.clone(),
        Arc::new(StaticGateway::new()),
    )
    .with_handler(Arc::new(StalledHandler))
    .with_handler(Arc::new(OrderHistoryRecorder::new(directory.clone())))
    .with_handler_timeout(Duration::from_millis(50));

    let user_id = Uuid::new_v4();
    let checkout = Checkout {
        user_id,
        items: canteen_cart(),
        total_amount: dec("70"),
        payment_method: PaymentMethod::Cod,
        address: "Hostel A".to_string(),
        room_number: None,
    };
    let placed = tokio::time::timeout(Duration::from_secs(2), service.create_order(checkout))
        .await
        .expect("checkout should not wait on a stalled handler")
        .unwrap();

    assert_eq!(repo.outbox().len(), 1);
    // Handlers after the stalled one still run.
    assert_eq!(directory.history_of(user_id), vec![placed.order_id]);
}

// ── Payment verification ─────────────────────────────────────────────────────

async fn online_order(h: &Harness) -> (Uuid, String) {
    let placed = h
        .orders
        .create_order(h.checkout(PaymentMethod::Online, canteen_cart(), "70"))
        .await
        .unwrap();
    (placed.order_id, placed.gateway_order.unwrap().id)
}

#[tokio::test]
async fn genuine_callback_captures_and_confirms() {
    let h = Harness::new();
    let (id, gateway_id) = online_order(&h).await;
    let signature = payment_signature(SECRET, &gateway_id, "pay_001").unwrap();

    let outcome = h.payments.verify_payment(id, "pay_001", &signature).await.unwrap();
    assert_eq!(outcome, Verification::Captured);

    let order = h.orders.get_order(id).await.unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Completed);
    assert_eq!(order.status, OrderStatus::Confirmed);
    assert_eq!(order.razorpay_payment_id.as_deref(), Some("pay_001"));
}

#[tokio::test]
async fn forged_signature_leaves_the_order_untouched() {
    let h = Harness::new();
    let (id, gateway_id) = online_order(&h).await;
    let mut forged = payment_signature(SECRET, &gateway_id, "pay_001").unwrap();
    let last = forged.pop().unwrap();
    forged.push(if last == '0' { '1' } else { '0' });

    let err = h.payments.verify_payment(id, "pay_001", &forged).await.unwrap_err();
    assert!(matches!(err, DomainError::InvalidSignature));
    assert_eq!(h.status_of(id).await, (OrderStatus::Pending, PaymentStatus::Pending));
}

#[tokio::test]
async fn signature_for_another_payment_is_rejected() {
    let h = Harness::new();
    let (id, gateway_id) = online_order(&h).await;
    let signature = payment_signature(SECRET, &gateway_id, "pay_001").unwrap();

    let err = h.payments.verify_payment(id, "pay_002", &signature).await.unwrap_err();
    assert!(matches!(err, DomainError::InvalidSignature));
}

#[tokio::test]
async fn repeated_callback_is_idempotent() {
    let h = Harness::new();
    let (id, gateway_id) = online_order(&h).await;
    let signature = payment_signature(SECRET, &gateway_id, "pay_001").unwrap();

    h.payments.verify_payment(id, "pay_001", &signature).await.unwrap();
    let again = h.payments.verify_payment(id, "pay_001", &signature).await.unwrap();
    assert_eq!(again, Verification::AlreadyCaptured);
    assert_eq!(h.status_of(id).await, (OrderStatus::Confirmed, PaymentStatus::Completed));

    let captured = h
        .repo
        .outbox()
        .iter()
        .filter(|e| e.event_type() == "PaymentCaptured")
        .count();
    assert_eq!(captured, 1);
}

#[tokio::test]
async fn second_payment_for_a_paid_order_is_refused() {
    let h = Harness::new();
    let (id, gateway_id) = online_order(&h).await;
    let first = payment_signature(SECRET, &gateway_id, "pay_001").unwrap();
    let second = payment_signature(SECRET, &gateway_id, "pay_002").unwrap();

    h.payments.verify_payment(id, "pay_001", &first).await.unwrap();
    let err = h.payments.verify_payment(id, "pay_002", &second).await.unwrap_err();
    assert!(matches!(err, DomainError::PaymentAlreadyRecorded));

    let order = h.orders.get_order(id).await.unwrap();
    assert_eq!(order.razorpay_payment_id.as_deref(), Some("pay_001"));
}

#[tokio::test]
async fn cod_orders_cannot_be_verified() {
    let h = Harness::new();
    let id = h.place(PaymentMethod::Cod, canteen_cart(), "70").await;
    let err = h.payments.verify_payment(id, "pay_001", "deadbeef").await.unwrap_err();
    assert!(matches!(err, DomainError::InvalidInput(_)));
}

#[tokio::test]
async fn missing_secret_never_passes_verification() {
    let h = Harness::new();
    let (id, gateway_id) = online_order(&h).await;
    let signature = payment_signature(SECRET, &gateway_id, "pay_001").unwrap();
    let unconfigured = PaymentService::new(h.repo.clone(), None);

    let err = unconfigured
        .verify_payment(id, "pay_001", &signature)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Configuration(_)));
    assert_eq!(h.status_of(id).await, (OrderStatus::Pending, PaymentStatus::Pending));
}

#[tokio::test]
async fn payment_on_a_cancelled_order_is_recorded_without_reopening_it() {
    let h = Harness::new();
    let (id, gateway_id) = online_order(&h).await;
    h.statuses.cancel_order(id).await.unwrap();

    let signature = payment_signature(SECRET, &gateway_id, "pay_001").unwrap();
    h.payments.verify_payment(id, "pay_001", &signature).await.unwrap();
    assert_eq!(h.status_of(id).await, (OrderStatus::Cancelled, PaymentStatus::Completed));
}

#[tokio::test]
async fn verifying_an_unknown_order_fails() {
    let h = Harness::new();
    let err = h
        .payments
        .verify_payment(Uuid::new_v4(), "pay_001", "deadbeef")
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::OrderNotFound));
}

// ── Status machine ───────────────────────────────────────────────────────────

async fn order_at(h: &Harness, status: OrderStatus) -> Uuid {
    let id = h.place(PaymentMethod::Cod, canteen_cart(), "70").await;
    match status {
        OrderStatus::Pending => {}
        OrderStatus::Cancelled => h.statuses.cancel_order(id).await.unwrap(),
        other => h.statuses.advance_status(id, other).await.unwrap(),
    }
    id
}

#[tokio::test]
async fn cancel_succeeds_only_before_preparation() {
    let h = Harness::new();
    for status in OrderStatus::ALL.iter().copied() {
        let id = order_at(&h, status).await;
        let result = h.statuses.cancel_order(id).await;
        if status.is_cancellable() {
            assert!(result.is_ok(), "cancel from {status}");
            assert_eq!(h.status_of(id).await.0, OrderStatus::Cancelled);
        } else {
            let err = result.unwrap_err();
            let refused = matches!(
                &err,
                DomainError::InvalidTransition(msg) if msg.contains("cannot be cancelled")
            );
            assert!(refused, "cancel from {status}: {err:?}");
            assert_eq!(h.status_of(id).await.0, status);
        }
    }
}

#[tokio::test]
async fn terminal_orders_never_advance() {
    let h = Harness::new();
    for terminal in [OrderStatus::Cancelled, OrderStatus::Delivered] {
        let id = order_at(&h, terminal).await;
        for target in campus_orders::domain::status::FULFILMENT_SEQUENCE {
            let err = h.statuses.advance_status(id, target).await.unwrap_err();
            assert!(
                matches!(err, DomainError::InvalidTransition(_)),
                "{terminal} -> {target}"
            );
        }
        assert_eq!(h.status_of(id).await.0, terminal);
    }
}

#[tokio::test]
async fn cancelled_is_not_an_advance_target() {
    let h = Harness::new();
    let id = order_at(&h, OrderStatus::Pending).await;
    let err = h
        .statuses
        .advance_status(id, OrderStatus::Cancelled)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::InvalidInput(_)));
    assert_eq!(h.status_of(id).await.0, OrderStatus::Pending);
}

#[tokio::test]
async fn permissive_policy_allows_skipping_stages() {
    let h = Harness::new();
    let id = order_at(&h, OrderStatus::Pending).await;
    h.statuses.advance_status(id, OrderStatus::Delivered).await.unwrap();
    assert_eq!(h.status_of(id).await.0, OrderStatus::Delivered);
}

#[tokio::test]
async fn strict_policy_requires_the_next_stage() {
    let h = Harness::build(TransitionPolicy::Strict, RecordingMailer::new());
    let id = order_at(&h, OrderStatus::Pending).await;

    let err = h
        .statuses
        .advance_status(id, OrderStatus::Delivered)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Cannot move order from PENDING to DELIVERED");

    for next in [
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Delivered,
    ] {
        h.statuses.advance_status(id, next).await.unwrap();
    }
    assert_eq!(h.status_of(id).await.0, OrderStatus::Delivered);
}

#[tokio::test]
async fn status_changes_on_unknown_orders_fail() {
    let h = Harness::new();
    let missing = Uuid::new_v4();
    assert!(matches!(
        h.statuses.cancel_order(missing).await,
        Err(DomainError::OrderNotFound)
    ));
    assert!(matches!(
        h.statuses.advance_status(missing, OrderStatus::Ready).await,
        Err(DomainError::OrderNotFound)
    ));
}

/// Pending, cancelled, then an attempt to deliver.
#[tokio::test]
async fn cancelled_order_cannot_be_delivered() {
    let h = Harness::new();
    let id = h.place(PaymentMethod::Cod, canteen_cart(), "70").await;
    h.statuses.cancel_order(id).await.unwrap();
    assert_eq!(h.status_of(id).await.0, OrderStatus::Cancelled);

    let err = h
        .statuses
        .advance_status(id, OrderStatus::Delivered)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::InvalidTransition(_)));
}

// ── Settlement ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn new_cod_order_shows_up_as_unsettled_revenue() {
    let h = Harness::new();
    h.place(PaymentMethod::Cod, canteen_cart(), "70").await;

    let stats = h.settlements.vendor_stats().await.unwrap();
    let canteen = stats.find("2").unwrap();
    assert_eq!(canteen.name, "Night Canteen");
    assert_eq!(canteen.unsettled_amount, dec("70"));
    assert_eq!(canteen.settled_amount, dec("0"));
    assert_eq!(canteen.total_revenue, dec("70"));
    assert!(stats.vending_stats.is_empty());
}

#[tokio::test]
async fn settling_one_vendor_leaves_the_other_untouched() {
    let h = Harness::new();
    let juice = h.juice_bar.to_string();
    h.place(PaymentMethod::Cod, canteen_cart(), "70").await;
    h.place(
        PaymentMethod::Cod,
        vec![store_line(&juice, "Mango Shake", "45", 2)],
        "90",
    )
    .await;
    // An order mixing both vendors.
    let mixed = h
        .place(
            PaymentMethod::Cod,
            vec![
                store_line("2", "Chai", "20", 1),
                store_line(&juice, "Lime Soda", "25", 1),
            ],
            "45",
        )
        .await;

    assert_eq!(h.settlements.settle_vendor("2").await.unwrap(), 3);

    let stats = h.settlements.vendor_stats().await.unwrap();
    let canteen = stats.find("2").unwrap();
    assert_eq!(canteen.settled_amount, dec("90"));
    assert_eq!(canteen.unsettled_amount, dec("0"));

    let juice_bar = stats.find(&juice).unwrap();
    assert_eq!(juice_bar.name, "Juice Bar");
    assert_eq!(juice_bar.settled_amount, dec("0"));
    assert_eq!(juice_bar.unsettled_amount, dec("115"));

    let mixed = h.orders.get_order(mixed).await.unwrap();
    for line in &mixed.items {
        assert_eq!(line.is_settled, line.source_id == "2");
    }
}

#[tokio::test]
async fn settling_twice_is_a_no_op() {
    let h = Harness::new();
    h.place(PaymentMethod::Cod, canteen_cart(), "70").await;

    assert_eq!(h.settlements.settle_vendor("2").await.unwrap(), 2);
    let before = h.settlements.vendor_stats().await.unwrap();
    assert_eq!(h.settlements.settle_vendor("2").await.unwrap(), 0);
    assert_eq!(h.settlements.vendor_stats().await.unwrap(), before);
}

#[tokio::test]
async fn cancelled_orders_contribute_nothing() {
    let h = Harness::new();
    h.place(PaymentMethod::Cod, canteen_cart(), "70").await;
    let cancelled = h
        .place(PaymentMethod::Cod, vec![store_line("2", "Thali", "120", 1)], "120")
        .await;
    h.statuses.cancel_order(cancelled).await.unwrap();

    let stats = h.settlements.vendor_stats().await.unwrap();
    assert_eq!(stats.find("2").unwrap().total_revenue, dec("70"));
}

#[tokio::test]
async fn stats_split_stores_from_vending_and_name_unknown_vendors() {
    let h = Harness::new();
    h.place(
        PaymentMethod::Cod,
        vec![
            vending_line("69", "10", 3),
            store_line("404", "Ghost Item", "5", 1),
            store_line("2", "Chai", "20", 1),
        ],
        "55",
    )
    .await;

    let stats = h.settlements.vendor_stats().await.unwrap();
    assert_eq!(stats.store_stats.len(), 2);
    assert_eq!(stats.vending_stats.len(), 1);
    assert_eq!(stats.vending_stats[0].name, "Library Vending");
    assert_eq!(stats.vending_stats[0].unsettled_amount, dec("30"));
    assert_eq!(stats.find("404").unwrap().name, "Unknown");

    for stat in stats.store_stats.iter().chain(stats.vending_stats.iter()) {
        assert_eq!(stat.total_revenue, &stat.settled_amount + &stat.unsettled_amount);
    }
}

#[tokio::test]
async fn report_survives_a_directory_outage() {
    let h = Harness::new();
    h.place(PaymentMethod::Cod, canteen_cart(), "70").await;
    h.directory.set_unavailable(true);

    let stats = h.settlements.vendor_stats().await.unwrap();
    assert_eq!(stats.find("2").unwrap().name, "Unknown");
}

#[tokio::test]
async fn blank_vendor_ids_are_rejected() {
    let h = Harness::new();
    assert!(matches!(
        h.settlements.settle_vendor("  ").await,
        Err(DomainError::InvalidInput(_))
    ));
}

#[tokio::test]
async fn vendor_listing_returns_orders_containing_its_lines() {
    let h = Harness::new();
    let juice = h.juice_bar.to_string();
    let canteen_only = h.place(PaymentMethod::Cod, canteen_cart(), "70").await;
    let mixed = h
        .place(
            PaymentMethod::Cod,
            vec![
                store_line("2", "Chai", "20", 1),
                store_line(&juice, "Lime Soda", "25", 1),
            ],
            "45",
        )
        .await;

    let ids: Vec<Uuid> = h
        .orders
        .list_vendor_orders("2")
        .await
        .unwrap()
        .iter()
        .map(|o| o.id)
        .collect();
    assert_eq!(ids, vec![mixed, canteen_only]);
    assert_eq!(h.orders.list_vendor_orders(&juice).await.unwrap().len(), 1);
}
