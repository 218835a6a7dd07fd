//! Razorpay payment signatures.
//!
//! The checkout widget returns `razorpay_signature`, the hex HMAC-SHA256 of
//! `"{razorpay_order_id}|{razorpay_payment_id}"` keyed with the account's key
//! secret.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::errors::DomainError;

type HmacSha256 = Hmac<Sha256>;

pub fn payment_signature(
    secret: &str,
    gateway_order_id: &str,
    payment_id: &str,
) -> Result<String, DomainError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| DomainError::Internal(format!("invalid HMAC key: {e}")))?;
    mac.update(gateway_order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Compares in constant time so response timing leaks nothing about the
/// expected signature.
pub fn verify_payment_signature(
    secret: &str,
    gateway_order_id: &str,
    payment_id: &str,
    signature: &str,
) -> Result<bool, DomainError> {
    let expected = payment_signature(secret, gateway_order_id, payment_id)?;
    Ok(expected.as_bytes().ct_eq(signature.as_bytes()).into())
}
