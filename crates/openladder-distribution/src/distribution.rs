//! Order book distribution: the ideal two-sided book for a market snapshot.
//!
//! ## Algorithm (per side)
//!
//! 1. Build the price ladder between the near and far bounds
//! 2. Compute the shape: level weights for a unit volume
//! 3. Ideal volume = `daily_volume * daily_volume_percent`, raised if needed
//!    so the levels inside the near-mid band carry at least
//!    `daily_volume * inner_band_volume_percent`
//! 4. Clamp the ideal volume to the side's available funds *before*
//!    applying the shape, so the shape survives funds pressure
//! 5. Round prices and amounts to market precision (toward zero)
//!
//! Bids spend quote: their volume is a quote value turned into base amounts
//! at each level's price. Asks spend base directly.

use openladder_types::{
    AvailableFunds, DistributionConfig, MarketLimits, MarketSnapshot, OrderSide, PriceLevel,
    Result,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::{build_ladder, weight_volumes};

/// Salt mixed into the random seed of the ask side so both sides of a
/// randomized book do not share the same draws.
const ASK_SEED_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

/// A validated config bound to one market's precision and limits.
///
/// All queries are synchronous and side-effect free; one model can serve
/// any number of snapshots.
#[derive(Debug, Clone)]
pub struct DistributionModel {
    config: DistributionConfig,
    limits: MarketLimits,
}

impl DistributionModel {
    /// Validate `config` and `limits` and bind them together.
    ///
    /// # Errors
    /// Any configuration or market-limit error; these are fatal for the
    /// strategy instance and never retried.
    pub fn new(config: DistributionConfig, limits: MarketLimits) -> Result<Self> {
        config.validate()?;
        limits.validate()?;
        Ok(Self { config, limits })
    }

    #[must_use]
    pub fn config(&self) -> &DistributionConfig {
        &self.config
    }

    #[must_use]
    pub fn limits(&self) -> &MarketLimits {
        &self.limits
    }

    /// Compute the ideal book for `snapshot`, clamped to `funds`.
    ///
    /// Never fails: an unusable reference price yields an empty book and
    /// zero funds yield zero-size levels.
    #[must_use]
    pub fn compute_distribution(
        &self,
        snapshot: &MarketSnapshot,
        funds: &AvailableFunds,
    ) -> OrderBookDistribution {
        let mut distribution = OrderBookDistribution {
            reference_price: snapshot.reference_price,
            bids: Vec::new(),
            asks: Vec::new(),
            bid_budget: Decimal::ZERO,
            ask_budget: Decimal::ZERO,
            config: self.config.clone(),
        };
        if let Err(err) = snapshot.validate() {
            warn!(symbol = %self.limits.symbol, %err, "Cannot anchor a ladder, empty distribution");
            return distribution;
        }

        for side in [OrderSide::Buy, OrderSide::Sell] {
            let (levels, budget) = self.compute_side(side, snapshot, funds.for_side(side));
            match side {
                OrderSide::Buy => {
                    distribution.bids = levels;
                    distribution.bid_budget = budget;
                }
                OrderSide::Sell => {
                    distribution.asks = levels;
                    distribution.ask_budget = budget;
                }
            }
        }
        distribution
    }

    fn compute_side(
        &self,
        side: OrderSide,
        snapshot: &MarketSnapshot,
        available: Option<Decimal>,
    ) -> (Vec<PriceLevel>, Decimal) {
        let cfg = &self.config;
        let reference = snapshot.reference_price;
        let prices = build_ladder(
            side,
            reference,
            cfg.levels_for(side),
            cfg.min_spread,
            cfg.max_spread,
        );
        let shape = self.side_shape(side, &prices);

        let daily_volume = snapshot.daily_volume_for(side).max(Decimal::ZERO);
        let mut ideal = daily_volume * cfg.daily_volume_percent;
        let in_band: Decimal = prices
            .iter()
            .zip(shape.iter())
            .filter(|(price, _)| (**price - reference).abs() / reference <= cfg.inner_band_percent)
            .map(|(_, weight)| *weight)
            .sum();
        let band_floor = daily_volume * cfg.inner_band_volume_percent;
        if in_band > Decimal::ZERO && ideal * in_band < band_floor {
            ideal = band_floor / in_band;
        }

        let target = match available {
            Some(funds) if funds.max(Decimal::ZERO) < ideal => {
                debug!(
                    side = %side,
                    ideal = %ideal,
                    available = %funds,
                    "Clamping side volume to available funds"
                );
                funds.max(Decimal::ZERO)
            }
            _ => ideal,
        };

        let mut levels: Vec<PriceLevel> = Vec::with_capacity(prices.len());
        for (raw_price, weight) in prices.iter().zip(shape.iter()) {
            let price = self.limits.adapt_price(*raw_price);
            if price <= Decimal::ZERO || levels.last().is_some_and(|l| l.price == price) {
                debug!(
                    side = %side,
                    price = %raw_price,
                    "Dropping level colliding at market precision"
                );
                continue;
            }
            let volume = target * *weight;
            let amount = match side {
                OrderSide::Buy => self.limits.adapt_amount(volume / price),
                OrderSide::Sell => self.limits.adapt_amount(volume),
            };
            levels.push(PriceLevel::new(side, price, amount));
        }
        (levels, target)
    }

    /// Unit-volume weights of a side, reproducible across recomputations.
    fn side_shape(&self, side: OrderSide, prices: &[Decimal]) -> Vec<Decimal> {
        let seed = match side {
            OrderSide::Buy => self.config.random_seed,
            OrderSide::Sell => self.config.random_seed ^ ASK_SEED_SALT,
        };
        let mut rng = StdRng::seed_from_u64(seed);
        weight_volumes(
            side,
            Decimal::ONE,
            prices,
            self.config.volume_multiplier,
            self.config.volume_direction,
            &mut rng,
        )
    }
}

/// The ideal two-sided book. Immutable once computed.
///
/// `bids` are strictly decreasing in price, `asks` strictly increasing;
/// index 0 is the level closest to the reference on both sides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBookDistribution {
    pub reference_price: Decimal,
    pub bids: Vec<PriceLevel>,
    pub asks: Vec<PriceLevel>,
    /// Funds-clamped quote volume the bids may lock.
    pub bid_budget: Decimal,
    /// Funds-clamped base volume the asks may lock.
    pub ask_budget: Decimal,
    config: DistributionConfig,
}

impl OrderBookDistribution {
    /// The config this book was computed with.
    #[must_use]
    pub fn config(&self) -> &DistributionConfig {
        &self.config
    }

    #[must_use]
    pub fn levels(&self, side: OrderSide) -> &[PriceLevel] {
        match side {
            OrderSide::Buy => &self.bids,
            OrderSide::Sell => &self.asks,
        }
    }

    /// Funds the side may lock, in the currency it spends.
    #[must_use]
    pub fn budget(&self, side: OrderSide) -> Decimal {
        match side {
            OrderSide::Buy => self.bid_budget,
            OrderSide::Sell => self.ask_budget,
        }
    }

    /// Summed base amount of one side.
    #[must_use]
    pub fn total_amount(&self, side: OrderSide) -> Decimal {
        self.levels(side).iter().map(|l| l.amount).sum()
    }

    /// Summed funds one side locks (quote for bids, base for asks).
    #[must_use]
    pub fn total_locked(&self, side: OrderSide) -> Decimal {
        self.levels(side).iter().map(PriceLevel::locked_funds).sum()
    }

    #[must_use]
    pub fn level_count(&self) -> usize {
        self.bids.len() + self.asks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Iterate bids then asks, innermost first on each side.
    pub fn iter_levels(&self) -> impl Iterator<Item = &PriceLevel> {
        self.bids.iter().chain(self.asks.iter())
    }

    /// Largest price distance at which a resting order still belongs to a
    /// slot of `side`: half the tightest gap between adjacent levels, or
    /// the distance to the reference for a one-level side.
    #[must_use]
    pub fn match_window(&self, side: OrderSide) -> Decimal {
        let levels = self.levels(side);
        match levels {
            [] => Decimal::ZERO,
            [only] => only.distance_to(self.reference_price),
            _ => levels
                .windows(2)
                .map(|w| (w[0].price - w[1].price).abs())
                .min()
                .unwrap_or(Decimal::ZERO)
                / Decimal::TWO,
        }
    }

    /// Same prices, amounts scaled per side by `bid_ratio` / `ask_ratio`
    /// and re-adapted to market precision.
    #[must_use]
    pub fn rescaled(&self, bid_ratio: Decimal, ask_ratio: Decimal, limits: &MarketLimits) -> Self {
        let scale = |levels: &[PriceLevel], ratio: Decimal| -> Vec<PriceLevel> {
            levels
                .iter()
                .map(|l| PriceLevel::new(l.side, l.price, limits.adapt_amount(l.amount * ratio)))
                .collect()
        };
        Self {
            reference_price: self.reference_price,
            bids: scale(&self.bids, bid_ratio),
            asks: scale(&self.asks, ask_ratio),
            bid_budget: self.bid_budget * bid_ratio,
            ask_budget: self.ask_budget * ask_ratio,
            config: self.config.clone(),
        }
    }
}
