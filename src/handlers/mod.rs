pub mod admin;
pub mod dto;
pub mod orders;
pub mod payments;

use std::sync::Arc;

use actix_web::{error, web};
use utoipa::OpenApi;

use crate::application::order_service::OrderService;
use crate::application::payment_service::PaymentService;
use crate::application::settlement_service::SettlementService;
use crate::application::status_service::StatusService;
use crate::errors::AppError;

/// Services shared by every worker.
#[derive(Clone)]
pub struct AppState {
    pub orders: Arc<OrderService>,
    pub payments: Arc<PaymentService>,
    pub statuses: Arc<StatusService>,
    pub settlements: Arc<SettlementService>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        orders::create_order,
        orders::get_order,
        orders::cancel_order,
        orders::advance_status,
        orders::list_user_orders,
        orders::list_vendor_orders,
        payments::verify_payment,
        admin::vendor_stats,
        admin::settle_vendor,
    ),
    components(schemas(
        dto::CreateOrderRequest,
        dto::OrderItemRequest,
        dto::CreateOrderResponse,
        dto::GatewayOrderResponse,
        dto::OrderResponse,
        dto::OrderItemResponse,
        dto::OrderEnvelope,
        dto::OrderListResponse,
        dto::AdvanceStatusRequest,
        dto::VerifyPaymentRequest,
        dto::VerifyPaymentResponse,
        dto::VendorStatsResponse,
        dto::StatItem,
        dto::SettleVendorResponse,
        dto::Ack,
    )),
    tags(
        (name = "orders", description = "Checkout and fulfilment"),
        (name = "payments", description = "Online payment callbacks"),
        (name = "admin", description = "Vendor settlement"),
    )
)]
pub struct ApiDoc;

/// Registers every route plus JSON and path extractor errors in the
/// `{ success, error }` shape.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _| {
        let message = match &err {
            error::JsonPayloadError::Deserialize(e) => format!("Invalid request body: {e}"),
            other => other.to_string(),
        };
        AppError::BadRequest(message).into()
    }))
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _| AppError::BadRequest(format!("Invalid path: {err}")).into()),
    )
    .service(
        web::scope("/orders")
            .route("", web::post().to(orders::create_order))
            .route("/{id}", web::get().to(orders::get_order))
            .route("/{id}/verify-payment", web::post().to(payments::verify_payment))
            .route("/{id}/cancel", web::post().to(orders::cancel_order))
            .route("/{id}/status", web::post().to(orders::advance_status)),
    )
    .route("/users/{user_id}/orders", web::get().to(orders::list_user_orders))
    .route("/vendors/{source_id}/orders", web::get().to(orders::list_vendor_orders))
    .service(
        web::scope("/admin")
            .route("/vendor-stats", web::get().to(admin::vendor_stats))
            .route("/vendors/{source_id}/settle", web::post().to(admin::settle_vendor)),
    );
}
