//! Distribution configuration.
//!
//! A [`DistributionConfig`] is immutable once validated and owned by the
//! strategy instance that uses it; two strategies never share weight tables.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{OpenladderError, OrderSide, Result, constants};

/// How the target volume of a side is spread across its levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeDirection {
    /// Amount grows with distance from the reference (innermost smallest).
    Decreasing,
    /// Amount shrinks with distance from the reference (innermost largest).
    Increasing,
    /// Average amount times a uniform factor in `[1 - m, 1 + m]`.
    Random,
    /// Every level gets the same amount.
    Equal,
}

impl std::fmt::Display for VolumeDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Decreasing => write!(f, "DECREASING"),
            Self::Increasing => write!(f, "INCREASING"),
            Self::Random => write!(f, "RANDOM"),
            Self::Equal => write!(f, "EQUAL"),
        }
    }
}

/// Shape of the ideal two-sided book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributionConfig {
    /// Number of bid levels.
    pub bids_count: usize,
    /// Number of ask levels.
    pub asks_count: usize,
    /// Full spread between the innermost bid and ask, as a fraction of price.
    pub min_spread: Decimal,
    /// Full spread between the outermost bid and ask, as a fraction of price.
    pub max_spread: Decimal,
    pub volume_direction: VolumeDirection,
    /// Curve steepness for weighted directions; spread of the factor for `Random`.
    pub volume_multiplier: Decimal,
    /// Share of the side's daily traded volume to place on the book.
    pub daily_volume_percent: Decimal,
    /// Half-width of the near-mid band, as a fraction of price.
    pub inner_band_percent: Decimal,
    /// Share of the daily volume that must rest inside the near-mid band.
    pub inner_band_volume_percent: Decimal,
    /// Relative price drift tolerated before a resting order is replaced.
    pub price_tolerance: Decimal,
    /// Relative amount drift tolerated before a resting order is replaced.
    pub amount_tolerance: Decimal,
    /// Seed of the random source used by [`VolumeDirection::Random`], so a
    /// recomputed ideal book is identical to the one it was planned from.
    pub random_seed: u64,
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            bids_count: constants::DEFAULT_BIDS_COUNT,
            asks_count: constants::DEFAULT_ASKS_COUNT,
            min_spread: constants::DEFAULT_MIN_SPREAD,
            max_spread: constants::DEFAULT_MAX_SPREAD,
            volume_direction: VolumeDirection::Decreasing,
            volume_multiplier: constants::DEFAULT_VOLUME_MULTIPLIER,
            daily_volume_percent: constants::DEFAULT_DAILY_VOLUME_PERCENT,
            inner_band_percent: constants::DEFAULT_INNER_BAND_PERCENT,
            inner_band_volume_percent: constants::DEFAULT_INNER_BAND_VOLUME_PERCENT,
            price_tolerance: constants::DEFAULT_PRICE_TOLERANCE,
            amount_tolerance: constants::DEFAULT_AMOUNT_TOLERANCE,
            random_seed: 0,
        }
    }
}

impl DistributionConfig {
    /// Parse a JSON config document and validate it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Number of levels configured for `side`.
    #[must_use]
    pub fn levels_for(&self, side: OrderSide) -> usize {
        match side {
            OrderSide::Buy => self.bids_count,
            OrderSide::Sell => self.asks_count,
        }
    }

    /// Shape distance above which a resting book is worth replanning.
    ///
    /// A whole-book price drift of half the inner spread scores
    /// `min_spread / max_spread`.
    #[must_use]
    pub fn replan_tolerance(&self) -> Decimal {
        if self.max_spread.is_zero() {
            return Decimal::ZERO;
        }
        self.min_spread / self.max_spread
    }

    /// Check every invariant of the configuration.
    pub fn validate(&self) -> Result<()> {
        let two = Decimal::TWO;
        if self.min_spread <= Decimal::ZERO
            || self.min_spread >= self.max_spread
            || self.max_spread >= two
        {
            return Err(OpenladderError::SpreadOrdering {
                min_spread: self.min_spread,
                max_spread: self.max_spread,
            });
        }

        for side in [OrderSide::Buy, OrderSide::Sell] {
            let count = self.levels_for(side);
            if count > constants::MAX_LEVELS_PER_SIDE {
                return Err(OpenladderError::LevelCountExceeded {
                    side,
                    count,
                    max: constants::MAX_LEVELS_PER_SIDE,
                });
            }
        }

        if self.volume_multiplier.is_sign_negative() {
            return Err(OpenladderError::Configuration(format!(
                "volume_multiplier must be non-negative, got {}",
                self.volume_multiplier
            )));
        }
        if self.volume_direction == VolumeDirection::Random && self.volume_multiplier > Decimal::ONE
        {
            return Err(OpenladderError::Configuration(format!(
                "random volume_multiplier must be within [0, 1], got {}",
                self.volume_multiplier
            )));
        }

        let percents = [
            ("daily_volume_percent", self.daily_volume_percent),
            ("inner_band_percent", self.inner_band_percent),
            ("inner_band_volume_percent", self.inner_band_volume_percent),
        ];
        for (name, value) in percents {
            if value <= Decimal::ZERO || value > Decimal::ONE {
                return Err(OpenladderError::Configuration(format!(
                    "{name} must be within (0, 1], got {value}"
                )));
            }
        }

        let half_min_spread = self.min_spread / two;
        if half_min_spread >= self.inner_band_percent {
            return Err(OpenladderError::InnerBandUnreachable {
                inner_band: self.inner_band_percent,
                half_min_spread,
            });
        }

        if self.price_tolerance.is_sign_negative() || self.amount_tolerance.is_sign_negative() {
            return Err(OpenladderError::Configuration(
                "tolerances must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}
