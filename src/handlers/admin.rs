use actix_web::{web, HttpResponse};

use crate::errors::AppError;
use crate::handlers::dto::{SettleVendorResponse, VendorStatsResponse};
use crate::handlers::AppState;

/// GET /admin/vendor-stats
///
/// Revenue per vendor across all orders that were not cancelled.
#[utoipa::path(
    get,
    path = "/admin/vendor-stats",
    responses((status = 200, description = "Per-vendor totals", body = VendorStatsResponse)),
    tag = "admin"
)]
pub async fn vendor_stats(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let stats = state.settlements.vendor_stats().await?;
    Ok(HttpResponse::Ok().json(VendorStatsResponse::from(stats)))
}

/// POST /admin/vendors/{sourceId}/settle
#[utoipa::path(
    post,
    path = "/admin/vendors/{sourceId}/settle",
    params(("sourceId" = String, Path, description = "Vendor id as stored on order lines")),
    responses(
        (
            status = 200,
            description = "Outstanding lines marked as paid out",
            body = SettleVendorResponse
        ),
        (status = 400, description = "Blank vendor id"),
    ),
    tag = "admin"
)]
pub async fn settle_vendor(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let settled_lines = state.settlements.settle_vendor(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(SettleVendorResponse {
        success: true,
        settled_lines,
    }))
}
