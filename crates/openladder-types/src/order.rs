//! Order types: sides, ideal price levels and resting orders.
//!
//! A [`PriceLevel`] is what the engine *wants* on the book; an
//! [`OpenOrder`] is what the order-tracking collaborator reports is
//! *actually* resting. Amounts are always in base asset units.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::OrderId;

/// Which side of the book a level or order is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Direction prices move away from the reference on this side:
    /// `-1` for bids, `+1` for asks.
    #[must_use]
    pub fn away_sign(self) -> Decimal {
        match self {
            Self::Buy => Decimal::NEGATIVE_ONE,
            Self::Sell => Decimal::ONE,
        }
    }
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// One rung of a ladder: the side, limit price and base amount of an
/// order the engine wants resting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PriceLevel {
    pub side: OrderSide,
    pub price: Decimal,
    pub amount: Decimal,
}

impl PriceLevel {
    #[must_use]
    pub fn new(side: OrderSide, price: Decimal, amount: Decimal) -> Self {
        Self {
            side,
            price,
            amount,
        }
    }

    /// Quote value of the level (`price * amount`).
    #[must_use]
    pub fn cost(&self) -> Decimal {
        self.price * self.amount
    }

    /// Funds this level locks, in the currency the side spends:
    /// quote for bids, base for asks.
    #[must_use]
    pub fn locked_funds(&self) -> Decimal {
        match self.side {
            OrderSide::Buy => self.cost(),
            OrderSide::Sell => self.amount,
        }
    }

    /// Absolute price distance to `reference`.
    #[must_use]
    pub fn distance_to(&self, reference: Decimal) -> Decimal {
        (self.price - reference).abs()
    }
}

/// An order currently resting on the exchange for the managed symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OpenOrder {
    pub id: OrderId,
    pub side: OrderSide,
    pub price: Decimal,
    /// Remaining (unfilled) base amount.
    pub amount: Decimal,
}

impl OpenOrder {
    #[must_use]
    pub fn new(id: OrderId, side: OrderSide, price: Decimal, amount: Decimal) -> Self {
        Self {
            id,
            side,
            price,
            amount,
        }
    }

    /// The order viewed as a ladder level.
    #[must_use]
    pub fn as_level(&self) -> PriceLevel {
        PriceLevel::new(self.side, self.price, self.amount)
    }

    #[must_use]
    pub fn locked_funds(&self) -> Decimal {
        self.as_level().locked_funds()
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl OpenOrder {
    pub fn dummy(side: OrderSide, price: Decimal, amount: Decimal) -> Self {
        Self::new(OrderId::new(), side, price, amount)
    }

    pub fn dummy_from_level(level: &PriceLevel) -> Self {
        Self::new(OrderId::new(), level.side, level.price, level.amount)
    }
}
