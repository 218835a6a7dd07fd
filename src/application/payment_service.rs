use std::sync::Arc;

use log::{info, warn};
use uuid::Uuid;

use crate::config::Secret;
use crate::domain::errors::DomainError;
use crate::domain::order::PaymentStatus;
use crate::domain::ports::{OrderRepository, PaymentOutcome};
use crate::domain::signature::verify_payment_signature;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// The payment was recorded by this call.
    Captured,
    /// The same payment had already been recorded.
    AlreadyCaptured,
}

pub struct PaymentService {
    orders: Arc<dyn OrderRepository>,
    signing_secret: Option<Secret<String>>,
}

impl PaymentService {
    pub fn new(orders: Arc<dyn OrderRepository>, signing_secret: Option<Secret<String>>) -> Self {
        Self {
            orders,
            signing_secret,
        }
    }

    /// Checks a checkout callback and, when genuine, marks the order paid and
    /// confirmed. Forged callbacks leave the order untouched.
    pub async fn verify_payment(
        &self,
        order_id: Uuid,
        payment_id: &str,
        signature: &str,
    ) -> Result<Verification, DomainError> {
        let order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or(DomainError::OrderNotFound)?;
        let gateway_order_id = order.razorpay_order_id.as_deref().ok_or_else(|| {
            DomainError::InvalidInput(format!("order {order_id} has no gateway order"))
        })?;
        let secret = self
            .signing_secret
            .as_ref()
            .map(|s| s.reveal().as_str())
            .ok_or_else(|| {
                DomainError::Configuration("payment signing secret is not set".to_string())
            })?;

        if !verify_payment_signature(secret, gateway_order_id, payment_id, signature)? {
            warn!("Rejected payment callback for order {order_id}: signature mismatch");
            return Err(DomainError::InvalidSignature);
        }

        match self.orders.record_payment(order_id, payment_id).await? {
            PaymentOutcome::Captured { confirmed } => {
                info!(
                    "Payment {payment_id} captured for order {order_id} (confirmed: {confirmed})"
                );
                Ok(Verification::Captured)
            }
            PaymentOutcome::NotPending {
                payment_status: PaymentStatus::Completed,
                payment_id: Some(recorded),
            } if recorded == payment_id => {
                info!("Payment {payment_id} for order {order_id} was already captured");
                Ok(Verification::AlreadyCaptured)
            }
            PaymentOutcome::NotPending { payment_status, .. } => {
                warn!(
                    "Order {order_id} payment is already {payment_status}, ignoring {payment_id}"
                );
                Err(DomainError::PaymentAlreadyRecorded)
            }
            PaymentOutcome::NotFound => Err(DomainError::OrderNotFound),
        }
    }
}
