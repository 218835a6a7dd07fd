pub mod notifier;
pub mod order_service;
pub mod payment_service;
pub mod settlement_service;
pub mod status_service;
