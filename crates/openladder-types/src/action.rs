//! Actions an executor carries out against the exchange.
//!
//! A closed tagged union: executors match on it exhaustively.

use serde::{Deserialize, Serialize};

use crate::{OrderId, PriceLevel};

/// One step of a reconciliation plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Place a new resting order.
    CreateOrder { order_data: PriceLevel },
    /// Cancel a resting order.
    CancelOrder { order_id: OrderId },
}

impl Action {
    #[must_use]
    pub fn create(order_data: PriceLevel) -> Self {
        Self::CreateOrder { order_data }
    }

    #[must_use]
    pub fn cancel(order_id: OrderId) -> Self {
        Self::CancelOrder { order_id }
    }

    #[must_use]
    pub fn is_create(&self) -> bool {
        matches!(self, Self::CreateOrder { .. })
    }

    #[must_use]
    pub fn is_cancel(&self) -> bool {
        matches!(self, Self::CancelOrder { .. })
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CreateOrder { order_data } => write!(
                f,
                "CREATE {} {} @ {}",
                order_data.side, order_data.amount, order_data.price
            ),
            Self::CancelOrder { order_id } => write!(f, "CANCEL {order_id}"),
        }
    }
}
