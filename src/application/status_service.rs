use std::sync::Arc;

use log::info;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::OrderStatus;
use crate::domain::ports::{OrderRepository, TransitionOutcome};
use crate::domain::status::{TransitionPolicy, CANCELLABLE};

pub struct StatusService {
    orders: Arc<dyn OrderRepository>,
    policy: TransitionPolicy,
}

impl StatusService {
    pub fn new(orders: Arc<dyn OrderRepository>, policy: TransitionPolicy) -> Self {
        Self { orders, policy }
    }

    pub fn policy(&self) -> TransitionPolicy {
        self.policy
    }

    /// Cancels a `PENDING` or `CONFIRMED` order. Captured payments are not
    /// refunded.
    pub async fn cancel_order(&self, order_id: Uuid) -> Result<(), DomainError> {
        match self
            .orders
            .transition_status(order_id, &CANCELLABLE, OrderStatus::Cancelled)
            .await?
        {
            TransitionOutcome::Applied { from } => {
                info!("Order {order_id} cancelled (was {from})");
                Ok(())
            }
            TransitionOutcome::Rejected { current } => Err(DomainError::InvalidTransition(format!(
                "Order cannot be cancelled in current status ({current})"
            ))),
            TransitionOutcome::NotFound => Err(DomainError::OrderNotFound),
        }
    }

    pub async fn advance_status(
        &self,
        order_id: Uuid,
        target: OrderStatus,
    ) -> Result<(), DomainError> {
        let sources = self.policy.sources_for(target)?;
        match self
            .orders
            .transition_status(order_id, &sources, target)
            .await?
        {
            TransitionOutcome::Applied { from } => {
                info!("Order {order_id} moved from {from} to {target}");
                Ok(())
            }
            TransitionOutcome::Rejected { current } => Err(self.policy.rejection(current, target)),
            TransitionOutcome::NotFound => Err(DomainError::OrderNotFound),
        }
    }
}
