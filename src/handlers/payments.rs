use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::application::payment_service::Verification;
use crate::errors::AppError;
use crate::handlers::dto::{VerifyPaymentRequest, VerifyPaymentResponse};
use crate::handlers::AppState;

/// POST /orders/{id}/verify-payment
///
/// Called by the checkout page with the ids and signature Razorpay returned.
/// Repeating a successful callback is accepted.
#[utoipa::path(
    post,
    path = "/orders/{id}/verify-payment",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = VerifyPaymentRequest,
    responses(
        (
            status = 200,
            description = "Payment captured and order confirmed",
            body = VerifyPaymentResponse
        ),
        (status = 400, description = "Invalid signature, or not an online order"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "A different payment is already recorded"),
        (status = 500, description = "Signing secret not configured"),
    ),
    tag = "payments"
)]
pub async fn verify_payment(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<VerifyPaymentRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let verification = state
        .payments
        .verify_payment(path.into_inner(), &body.payment_id, &body.signature)
        .await?;
    Ok(HttpResponse::Ok().json(VerifyPaymentResponse {
        success: true,
        already_captured: verification == Verification::AlreadyCaptured,
    }))
}
