use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Order not found")]
    OrderNotFound,
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("{0}")]
    InvalidTransition(String),
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Payment already recorded for this order")]
    PaymentAlreadyRecorded,
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Payment gateway error: {0}")]
    Gateway(String),
    #[error("Internal error: {0}")]
    Internal(String),
}
