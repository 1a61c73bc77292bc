//! Point-in-time inputs read from the market-data feed and the portfolio.
//!
//! Funds are read once, under the caller's portfolio lock, and handed in as
//! an [`AvailableFunds`] value; the engine never re-reads them mid-plan.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{OpenladderError, OrderSide, Result};

/// Reference price and daily traded volume estimates for one symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub reference_price: Decimal,
    /// Base asset traded over the last day.
    pub daily_base_volume: Decimal,
    /// Quote asset traded over the last day.
    pub daily_quote_volume: Decimal,
}

impl MarketSnapshot {
    #[must_use]
    pub fn new(
        reference_price: Decimal,
        daily_base_volume: Decimal,
        daily_quote_volume: Decimal,
    ) -> Self {
        Self {
            reference_price,
            daily_base_volume,
            daily_quote_volume,
        }
    }

    /// Daily volume in the currency `side` spends: quote for bids, base for asks.
    #[must_use]
    pub fn daily_volume_for(&self, side: OrderSide) -> Decimal {
        match side {
            OrderSide::Buy => self.daily_quote_volume,
            OrderSide::Sell => self.daily_base_volume,
        }
    }

    /// Reject a snapshot no ladder can be anchored to.
    pub fn validate(&self) -> Result<()> {
        if self.reference_price <= Decimal::ZERO {
            return Err(OpenladderError::InvalidReferencePrice(self.reference_price));
        }
        Ok(())
    }
}

/// Free balances of the symbol's two assets. `None` means "do not clamp".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableFunds {
    pub base: Option<Decimal>,
    pub quote: Option<Decimal>,
}

impl AvailableFunds {
    #[must_use]
    pub fn new(base: Decimal, quote: Decimal) -> Self {
        Self {
            base: Some(base),
            quote: Some(quote),
        }
    }

    /// No clamping on either side.
    #[must_use]
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Funds usable by `side`: quote for bids, base for asks.
    #[must_use]
    pub fn for_side(&self, side: OrderSide) -> Option<Decimal> {
        match side {
            OrderSide::Buy => self.quote,
            OrderSide::Sell => self.base,
        }
    }

    /// Add funds back to `side` (e.g. funds locked in orders about to be
    /// replaced). Unlimited sides stay unlimited.
    #[must_use]
    pub fn credited(mut self, side: OrderSide, amount: Decimal) -> Self {
        let slot = match side {
            OrderSide::Buy => &mut self.quote,
            OrderSide::Sell => &mut self.base,
        };
        if let Some(value) = slot {
            *value += amount;
        }
        self
    }
}
