use bigdecimal::{BigDecimal, ToPrimitive, Zero};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;
use super::vendor::{VendorKind, VendorRef};

/// Name and phone recorded on an order when the user profile is unavailable.
pub const UNKNOWN_CUSTOMER: &str = "Unknown";

string_enum! {
    PaymentMethod {
        Cod => "COD",
        Online => "ONLINE",
    }
}

string_enum! {
    PaymentStatus {
        Pending => "PENDING",
        Completed => "COMPLETED",
        Failed => "FAILED",
    }
}

string_enum! {
    OrderStatus {
        Pending => "PENDING",
        Confirmed => "CONFIRMED",
        Preparing => "PREPARING",
        Ready => "READY",
        Delivered => "DELIVERED",
        Cancelled => "CANCELLED",
    }
}

string_enum! {
    ItemModel {
        Product => "Product",
        VendingItem => "VendingItem",
    }
}

string_enum! {
    LineSource {
        Store => "STORE",
        Vending => "VENDING",
    }
}

impl LineSource {
    pub fn vendor_kind(self) -> VendorKind {
        match self {
            LineSource::Store => VendorKind::Store,
            LineSource::Vending => VendorKind::VendingMachine,
        }
    }
}

/// One product entry of an order. Price and name are snapshots taken at
/// checkout and never re-read from the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLine {
    pub product_id: String,
    pub item_model: ItemModel,
    pub name: String,
    pub price: BigDecimal,
    pub quantity: i32,
    pub source: LineSource,
    pub source_id: String,
    pub source_model: VendorKind,
    pub is_settled: bool,
}

impl OrderLine {
    pub fn subtotal(&self) -> BigDecimal {
        &self.price * BigDecimal::from(self.quantity)
    }

    pub fn vendor_ref(&self) -> VendorRef {
        VendorRef::parse(self.source_model, &self.source_id)
    }

    fn validate(&self, index: usize) -> Result<(), DomainError> {
        if self.quantity < 1 {
            return Err(DomainError::InvalidInput(format!(
                "item {index}: quantity must be at least 1"
            )));
        }
        if self.price < BigDecimal::zero() {
            return Err(DomainError::InvalidInput(format!(
                "item {index}: price must not be negative"
            )));
        }
        if !fits_money_scale(&self.price) {
            return Err(DomainError::InvalidInput(format!(
                "item {index}: price {} has more than {MONEY_SCALE} decimal places",
                self.price
            )));
        }
        if self.source_id.trim().is_empty() {
            return Err(DomainError::InvalidInput(format!(
                "item {index}: sourceId is required"
            )));
        }
        if self.source.vendor_kind() != self.source_model {
            return Err(DomainError::InvalidInput(format!(
                "item {index}: source {} does not match sourceModel {}",
                self.source, self.source_model
            )));
        }
        Ok(())
    }
}

/// A cart submitted for checkout.
#[derive(Debug, Clone)]
pub struct Checkout {
    pub user_id: Uuid,
    pub items: Vec<OrderLine>,
    pub total_amount: BigDecimal,
    pub payment_method: PaymentMethod,
    pub address: String,
    pub room_number: Option<String>,
}

impl Checkout {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.items.is_empty() {
            return Err(DomainError::InvalidInput(
                "an order needs at least one item".to_string(),
            ));
        }
        for (index, line) in self.items.iter().enumerate() {
            line.validate(index)?;
        }
        if self.total_amount <= BigDecimal::zero() {
            return Err(DomainError::InvalidInput(
                "totalAmount must be positive".to_string(),
            ));
        }
        if !fits_money_scale(&self.total_amount) {
            return Err(DomainError::InvalidInput(format!(
                "totalAmount {} has more than {MONEY_SCALE} decimal places",
                self.total_amount
            )));
        }
        Ok(())
    }

    pub fn line_total(&self) -> BigDecimal {
        self.items
            .iter()
            .fold(BigDecimal::zero(), |acc, line| acc + line.subtotal())
    }
}

/// Decimal places stored for money columns (`NUMERIC(12, 2)`).
pub const MONEY_SCALE: i64 = 2;

/// Trailing zeros do not count, so `19.990` fits.
fn fits_money_scale(amount: &BigDecimal) -> bool {
    let (_, scale) = amount.normalized().as_bigint_and_exponent();
    scale <= MONEY_SCALE
}

/// Converts a rupee amount to paise, rounding half away from zero.
pub fn to_minor_units(amount: &BigDecimal) -> Result<i64, DomainError> {
    let scaled = amount * BigDecimal::from(100);
    let minor = scaled
        .to_f64()
        .map(f64::round)
        .filter(|v| v.is_finite() && v.abs() < i64::MAX as f64)
        .ok_or_else(|| DomainError::InvalidInput(format!("amount {amount} is out of range")))?;
    Ok(minor as i64)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerSnapshot {
    pub name: String,
    pub phone: String,
}

impl CustomerSnapshot {
    pub fn unknown() -> Self {
        Self {
            name: UNKNOWN_CUSTOMER.to_string(),
            phone: UNKNOWN_CUSTOMER.to_string(),
        }
    }
}

/// Everything the repository needs to persist a new order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Uuid,
    pub items: Vec<OrderLine>,
    pub total_amount: BigDecimal,
    pub customer: CustomerSnapshot,
    pub address: String,
    pub room_number: Option<String>,
    pub payment_method: PaymentMethod,
    pub razorpay_order_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub items: Vec<OrderLine>,
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

impl Order {
    pub fn has_vendor(&self, source_id: &str) -> bool {
        self.items.iter().any(|line| line.source_id == source_id)
    }
}

/// A payment-provider order opened for an online checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub receipt: Option<String>,
    pub status: String,
}

#[derive(Debug, Clone)]
pub struct GatewayOrderRequest {
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
}

#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub order_id: Uuid,
    pub gateway_order: Option<GatewayOrder>,
}
