//! Exchange precision and size limits for one symbol.
//!
//! Provided by the exchange connectivity layer. Every price and amount the
//! engine emits goes through [`MarketLimits::adapt_price`] /
//! [`MarketLimits::adapt_amount`], which truncate toward zero so a rounded
//! level never commits more funds than the unrounded one.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::{OpenladderError, PriceLevel, Result};

/// Precision and min/max limits of a market. `None` means "no limit".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketLimits {
    /// Market symbol (e.g., "BTC/USDT").
    pub symbol: String,
    /// Number of decimal places allowed in a price.
    pub price_decimals: u32,
    /// Number of decimal places allowed in a base amount.
    pub amount_decimals: u32,
    pub min_quantity: Option<Decimal>,
    pub max_quantity: Option<Decimal>,
    pub min_cost: Option<Decimal>,
    pub max_cost: Option<Decimal>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

/// Which exchange limit a level violates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LimitBreach {
    QuantityBelowMin,
    QuantityAboveMax,
    CostBelowMin,
    CostAboveMax,
    PriceBelowMin,
    PriceAboveMax,
}

impl std::fmt::Display for LimitBreach {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::QuantityBelowMin => write!(f, "quantity below minimum"),
            Self::QuantityAboveMax => write!(f, "quantity above maximum"),
            Self::CostBelowMin => write!(f, "cost below minimum"),
            Self::CostAboveMax => write!(f, "cost above maximum"),
            Self::PriceBelowMin => write!(f, "price below minimum"),
            Self::PriceAboveMax => write!(f, "price above maximum"),
        }
    }
}

impl MarketLimits {
    /// A market with the given precision and no size limits.
    #[must_use]
    pub fn new(symbol: impl Into<String>, price_decimals: u32, amount_decimals: u32) -> Self {
        Self {
            symbol: symbol.into(),
            price_decimals,
            amount_decimals,
            min_quantity: None,
            max_quantity: None,
            min_cost: None,
            max_cost: None,
            min_price: None,
            max_price: None,
        }
    }

    /// A typical BTC/USDT spot market.
    #[must_use]
    pub fn btc_usdt() -> Self {
        Self {
            min_quantity: Some(Decimal::new(1, 5)), // 0.00001 BTC
            min_cost: Some(Decimal::new(5, 0)),     // 5 USDT
            ..Self::new("BTC/USDT", 2, 5)
        }
    }

    #[must_use]
    pub fn with_quantity_range(mut self, min: Option<Decimal>, max: Option<Decimal>) -> Self {
        self.min_quantity = min;
        self.max_quantity = max;
        self
    }

    #[must_use]
    pub fn with_cost_range(mut self, min: Option<Decimal>, max: Option<Decimal>) -> Self {
        self.min_cost = min;
        self.max_cost = max;
        self
    }

    /// Check that every min/max pair is ordered and non-negative.
    pub fn validate(&self) -> Result<()> {
        let pairs = [
            ("quantity", self.min_quantity, self.max_quantity),
            ("cost", self.min_cost, self.max_cost),
            ("price", self.min_price, self.max_price),
        ];
        let negative = |limit: Option<Decimal>| limit.is_some_and(|m| m.is_sign_negative());
        for (name, min, max) in pairs {
            if negative(min) || negative(max) {
                return Err(OpenladderError::InvalidMarketLimits {
                    reason: format!("{name} limits must be non-negative"),
                });
            }
            if let (Some(min), Some(max)) = (min, max) {
                if min > max {
                    return Err(OpenladderError::InvalidMarketLimits {
                        reason: format!("min {name} {min} exceeds max {name} {max}"),
                    });
                }
            }
        }
        Ok(())
    }

    /// Truncate a price to the market's price precision.
    #[must_use]
    pub fn adapt_price(&self, price: Decimal) -> Decimal {
        price
            .round_dp_with_strategy(self.price_decimals, RoundingStrategy::ToZero)
            .normalize()
    }

    /// Truncate a base amount to the market's amount precision.
    #[must_use]
    pub fn adapt_amount(&self, amount: Decimal) -> Decimal {
        amount
            .round_dp_with_strategy(self.amount_decimals, RoundingStrategy::ToZero)
            .normalize()
    }

    /// First lower-bound violation of `level`, if any.
    #[must_use]
    pub fn check_minimums(&self, level: &PriceLevel) -> Option<LimitBreach> {
        if self.min_quantity.is_some_and(|min| level.amount < min) {
            return Some(LimitBreach::QuantityBelowMin);
        }
        if self.min_cost.is_some_and(|min| level.cost() < min) {
            return Some(LimitBreach::CostBelowMin);
        }
        if self.min_price.is_some_and(|min| level.price < min) {
            return Some(LimitBreach::PriceBelowMin);
        }
        None
    }

    /// First upper-bound violation of `level`, if any.
    #[must_use]
    pub fn check_maximums(&self, level: &PriceLevel) -> Option<LimitBreach> {
        if self.max_quantity.is_some_and(|max| level.amount > max) {
            return Some(LimitBreach::QuantityAboveMax);
        }
        if self.max_cost.is_some_and(|max| level.cost() > max) {
            return Some(LimitBreach::CostAboveMax);
        }
        if self.max_price.is_some_and(|max| level.price > max) {
            return Some(LimitBreach::PriceAboveMax);
        }
        None
    }

    /// First violation of `level` against any limit, minimums first.
    #[must_use]
    pub fn check_level(&self, level: &PriceLevel) -> Option<LimitBreach> {
        self.check_minimums(level)
            .or_else(|| self.check_maximums(level))
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl MarketLimits {
    /// Eight decimals on both axes, no size limits.
    pub fn permissive(symbol: &str) -> Self {
        Self::new(symbol, 8, 8)
    }
}
