use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::domain::order::OrderStatus;
use crate::errors::AppError;
use crate::handlers::dto::{
    Ack, AdvanceStatusRequest, CreateOrderRequest, CreateOrderResponse, GatewayOrderResponse,
    OrderEnvelope, OrderListResponse, OrderResponse,
};
use crate::handlers::AppState;

/// POST /orders
///
/// Places an order. ONLINE checkouts also open a Razorpay order whose id the
/// client hands to the checkout widget.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order placed", body = CreateOrderResponse),
        (status = 400, description = "Invalid cart"),
        (status = 502, description = "Payment gateway unavailable"),
        (status = 500, description = "Gateway credentials missing or internal error"),
    ),
    tag = "orders"
)]
pub async fn create_order(
    state: web::Data<AppState>,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let placed = state.orders.create_order(body.into_inner().into()).await?;
    Ok(HttpResponse::Created().json(CreateOrderResponse {
        success: true,
        order_id: placed.order_id,
        razorpay_order: placed.gateway_order.map(GatewayOrderResponse::from),
    }))
}

/// GET /orders/{id}
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order found", body = OrderEnvelope),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order = state.orders.get_order(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(OrderEnvelope {
        success: true,
        order: OrderResponse::from(order),
    }))
}

/// POST /orders/{id}/cancel
#[utoipa::path(
    post,
    path = "/orders/{id}/cancel",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order cancelled", body = Ack),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order is past the cancellable stages"),
    ),
    tag = "orders"
)]
pub async fn cancel_order(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    state.statuses.cancel_order(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(Ack::ok()))
}

/// POST /orders/{id}/status
///
/// Moves an order along the fulfilment sequence. Cancellation has its own
/// route.
#[utoipa::path(
    post,
    path = "/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = AdvanceStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = Ack),
        (status = 400, description = "Unknown or non-fulfilment status"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Transition not allowed"),
    ),
    tag = "orders"
)]
pub async fn advance_status(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<AdvanceStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let target: OrderStatus = body.status.trim().parse()?;
    state.statuses.advance_status(path.into_inner(), target).await?;
    Ok(HttpResponse::Ok().json(Ack::ok()))
}

/// GET /users/{userId}/orders
#[utoipa::path(
    get,
    path = "/users/{userId}/orders",
    params(("userId" = Uuid, Path, description = "User id")),
    responses((status = 200, description = "Orders, newest first", body = OrderListResponse)),
    tag = "orders"
)]
pub async fn list_user_orders(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let orders = state.orders.list_user_orders(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(OrderListResponse::new(orders)))
}

/// GET /vendors/{sourceId}/orders
///
/// Whole orders are returned, including lines of other vendors.
#[utoipa::path(
    get,
    path = "/vendors/{sourceId}/orders",
    params((
        "sourceId" = String,
        Path,
        description = "Store or vending machine id as stored on order lines"
    )),
    responses((status = 200, description = "Orders, newest first", body = OrderListResponse)),
    tag = "orders"
)]
pub async fn list_vendor_orders(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let orders = state.orders.list_vendor_orders(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(OrderListResponse::new(orders)))
}
