use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::order::{
    Checkout, GatewayOrder, ItemModel, LineSource, Order, OrderLine, OrderStatus, PaymentMethod,
    PaymentStatus,
};
use crate::domain::settlement::{VendorStat, VendorStats};
use crate::domain::vendor::VendorKind;

// ── Requests ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: String,
    pub item_model: ItemModel,
    pub name: String,
    /// Unit price in rupees, e.g. "29.50". Numbers are accepted too.
    #[serde(deserialize_with = "deserialize_money")]
    #[schema(value_type = String, example = "29.50")]
    pub price: BigDecimal,
    pub quantity: i32,
    pub source: LineSource,
    pub source_id: String,
    pub source_model: VendorKind,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub user_id: Uuid,
    pub items: Vec<OrderItemRequest>,
    #[serde(deserialize_with = "deserialize_money")]
    #[schema(value_type = String, example = "70.00")]
    pub total_amount: BigDecimal,
    pub payment_method: PaymentMethod,
    pub address: String,
    #[serde(default)]
    pub room_number: Option<String>,
}

/// Reads an amount from a JSON string or number.
///
/// Numbers are parsed from their shortest decimal text, so `19.99` stays
/// `19.99` rather than the nearest binary double.
fn deserialize_money<'de, D>(deserializer: D) -> Result<BigDecimal, D::Error>
where
    D: Deserializer<'de>,
{
    let text = match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        other => {
            return Err(de::Error::custom(format!(
                "expected a decimal amount, got {other}"
            )))
        }
    };
    BigDecimal::from_str(text.trim()).map_err(de::Error::custom)
}

impl From<CreateOrderRequest> for Checkout {
    fn from(req: CreateOrderRequest) -> Self {
        Checkout {
            user_id: req.user_id,
            items: req
                .items
                .into_iter()
                .map(|i| OrderLine {
                    product_id: i.product_id,
                    item_model: i.item_model,
                    name: i.name,
                    price: i.price,
                    quantity: i.quantity,
                    source: i.source,
                    source_id: i.source_id,
                    source_model: i.source_model,
                    is_settled: false,
                })
                .collect(),
            total_amount: req.total_amount,
            payment_method: req.payment_method,
            address: req.address,
            room_number: req.room_number.filter(|r| !r.trim().is_empty()),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AdvanceStatusRequest {
    /// One of PENDING, CONFIRMED, PREPARING, READY, DELIVERED.
    pub status: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequest {
    pub payment_id: String,
    pub signature: String,
}

// ── Responses ────────────────────────────────────────────────────────────────

/// Body of successful calls that return nothing else.
#[derive(Debug, Serialize, ToSchema)]
pub struct Ack {
    pub success: bool,
}

impl Ack {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GatewayOrderResponse {
    pub id: String,
    /// Amount in paise.
    pub amount: i64,
    pub currency: String,
    pub receipt: Option<String>,
    pub status: String,
}

impl From<GatewayOrder> for GatewayOrderResponse {
    fn from(g: GatewayOrder) -> Self {
        Self {
            id: g.id,
            amount: g.amount,
            currency: g.currency,
            receipt: g.receipt,
            status: g.status,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub success: bool,
    pub order_id: Uuid,
    /// Null for cash-on-delivery orders.
    pub razorpay_order: Option<GatewayOrderResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub product_id: String,
    pub item_model: ItemModel,
    pub name: String,
    #[schema(value_type = String)]
    pub price: BigDecimal,
    pub quantity: i32,
    pub source: LineSource,
    pub source_id: String,
    pub source_model: VendorKind,
    pub is_settled: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub items: Vec<OrderItemResponse>,
    #[schema(value_type = String)]
    pub total_amount: BigDecimal,
    pub user_name: String,
    pub user_phone: String,
    pub address: String,
    pub room_number: Option<String>,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub razorpay_order_id: Option<String>,
    pub razorpay_payment_id: Option<String>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Order> for OrderResponse {
    fn from(o: Order) -> Self {
        Self {
            id: o.id,
            user_id: o.user_id,
            items: o
                .items
                .into_iter()
                .map(|l| OrderItemResponse {
                    product_id: l.product_id,
                    item_model: l.item_model,
                    name: l.name,
                    price: l.price,
                    quantity: l.quantity,
                    source: l.source,
                    source_id: l.source_id,
                    source_model: l.source_model,
                    is_settled: l.is_settled,
                })
                .collect(),
            total_amount: o.total_amount,
            user_name: o.user_name,
            user_phone: o.user_phone,
            address: o.address,
            room_number: o.room_number,
            payment_method: o.payment_method,
            payment_status: o.payment_status,
            razorpay_order_id: o.razorpay_order_id,
            razorpay_payment_id: o.razorpay_payment_id,
            status: o.status,
            created_at: o.created_at,
            updated_at: o.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderEnvelope {
    pub success: bool,
    pub order: OrderResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderListResponse {
    pub success: bool,
    pub orders: Vec<OrderResponse>,
}

impl OrderListResponse {
    pub fn new(orders: Vec<Order>) -> Self {
        Self {
            success: true,
            orders: orders.into_iter().map(OrderResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentResponse {
    pub success: bool,
    /// True when this payment had been recorded by an earlier callback.
    pub already_captured: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatItem {
    pub id: String,
    pub name: String,
    #[schema(value_type = String)]
    pub total_revenue: BigDecimal,
    #[schema(value_type = String)]
    pub settled_amount: BigDecimal,
    #[schema(value_type = String)]
    pub unsettled_amount: BigDecimal,
}

impl From<VendorStat> for StatItem {
    fn from(s: VendorStat) -> Self {
        Self {
            id: s.id,
            name: s.name,
            total_revenue: s.total_revenue,
            settled_amount: s.settled_amount,
            unsettled_amount: s.unsettled_amount,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VendorStatsResponse {
    pub success: bool,
    pub store_stats: Vec<StatItem>,
    pub vending_stats: Vec<StatItem>,
}

impl From<VendorStats> for VendorStatsResponse {
    fn from(stats: VendorStats) -> Self {
        Self {
            success: true,
            store_stats: stats.store_stats.into_iter().map(StatItem::from).collect(),
            vending_stats: stats.vending_stats.into_iter().map(StatItem::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettleVendorResponse {
    pub success: bool,
    pub settled_lines: u64,
}
