//! What caused a replanning cycle.

use serde::{Deserialize, Serialize};

/// Tag carried by every plan naming the event that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerSource {
    /// The reference price moved.
    ReferencePrice,
    /// Available balances changed.
    Funds,
    /// One of our resting orders was filled (fully or partially).
    OrderFill,
    /// One of our resting orders disappeared without a fill.
    OrderCancel,
    /// Cancel everything and rebuild the whole shape.
    FullRefresh,
}

impl TriggerSource {
    /// Whether this trigger always rebuilds the book from scratch.
    #[must_use]
    pub fn is_full_refresh(self) -> bool {
        matches!(self, Self::FullRefresh)
    }
}

impl std::fmt::Display for TriggerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReferencePrice => write!(f, "REFERENCE_PRICE"),
            Self::Funds => write!(f, "FUNDS"),
            Self::OrderFill => write!(f, "ORDER_FILL"),
            Self::OrderCancel => write!(f, "ORDER_CANCEL"),
            Self::FullRefresh => write!(f, "FULL_REFRESH"),
        }
    }
}
