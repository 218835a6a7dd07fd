//! Order status rules.
//!
//! Fulfilment runs `PENDING → CONFIRMED → PREPARING → READY → DELIVERED`.
//! `CANCELLED` can be reached from `PENDING` or `CONFIRMED`. `CANCELLED` and
//! `DELIVERED` are terminal.

use std::str::FromStr;

use super::errors::DomainError;
use super::order::OrderStatus;

pub const FULFILMENT_SEQUENCE: [OrderStatus; 5] = [
    OrderStatus::Pending,
    OrderStatus::Confirmed,
    OrderStatus::Preparing,
    OrderStatus::Ready,
    OrderStatus::Delivered,
];

pub const CANCELLABLE: [OrderStatus; 2] = [OrderStatus::Pending, OrderStatus::Confirmed];

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Cancelled | OrderStatus::Delivered)
    }

    pub fn is_cancellable(self) -> bool {
        CANCELLABLE.contains(&self)
    }

    /// Position in the fulfilment sequence, `None` for `CANCELLED`.
    pub fn stage(self) -> Option<usize> {
        FULFILMENT_SEQUENCE.iter().position(|s| *s == self)
    }
}

/// How strictly `advance_status` enforces the fulfilment order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionPolicy {
    /// Any non-terminal order may move to any fulfilment status, including
    /// skipping stages. Matches how vendors operate the counter today.
    #[default]
    Permissive,
    /// Only the immediate next stage is accepted.
    Strict,
}

impl TransitionPolicy {
    /// The current statuses from which an order may move to `target`.
    pub fn sources_for(self, target: OrderStatus) -> Result<Vec<OrderStatus>, DomainError> {
        let stage = target.stage().ok_or_else(|| {
            DomainError::InvalidInput(format!("{target} is not a fulfilment status"))
        })?;
        let sources = match self {
            TransitionPolicy::Permissive => FULFILMENT_SEQUENCE
                .iter()
                .copied()
                .filter(|s| !s.is_terminal())
                .collect(),
            TransitionPolicy::Strict => match stage {
                0 => vec![],
                n => vec![FULFILMENT_SEQUENCE[n - 1]],
            },
        };
        Ok(sources)
    }

    pub fn permits(self, from: OrderStatus, to: OrderStatus) -> bool {
        self.sources_for(to)
            .map(|sources| sources.contains(&from))
            .unwrap_or(false)
    }

    /// Error for a rejected move from `current` to `target`.
    pub fn rejection(self, current: OrderStatus, target: OrderStatus) -> DomainError {
        if current.is_terminal() {
            DomainError::InvalidTransition(format!(
                "Order is {current} and its status can no longer change"
            ))
        } else {
            DomainError::InvalidTransition(format!("Cannot move order from {current} to {target}"))
        }
    }
}

impl FromStr for TransitionPolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "permissive" => Ok(TransitionPolicy::Permissive),
            "strict" => Ok(TransitionPolicy::Strict),
            other => Err(DomainError::InvalidInput(format!(
                "unknown status policy '{other}'"
            ))),
        }
    }
}
