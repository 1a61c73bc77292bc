//! Ladder feasibility search for single-sided ladders.
//!
//! A fixed total quantity is spread evenly over `N` levels between a base
//! price and a target bound. The level count is adjusted until a level of
//! the resulting size fits the exchange limits:
//!
//! ```text
//! TOO_SMALL  -> fewer, larger levels   (fails below 1)
//! TOO_LARGE  -> more, smaller levels   (fails above MAX_LADDER_LEVELS)
//! ```
//!
//! Levels above the base are sells (profit-taking fans), levels below it
//! are buys (dip-buying ladders).

use std::collections::HashSet;

use openladder_types::{
    MarketLimits, OpenladderError, OrderSide, PriceLevel, Result, constants,
};
use rust_decimal::Decimal;
use tracing::debug;

/// Outcome of checking one level count against the exchange limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelsCheck {
    Ok,
    /// Levels would break a minimum; use fewer of them.
    TooSmall,
    /// Levels would break a maximum; use more of them.
    TooLarge,
}

impl std::fmt::Display for LevelsCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::TooSmall => write!(f, "TOO_SMALL"),
            Self::TooLarge => write!(f, "TOO_LARGE"),
        }
    }
}

/// Check `level_count` even levels of `total_quantity` between `base` and
/// `bound`.
///
/// Minimums are checked on the cheaper of the innermost and outermost
/// levels, maximums on the dearer one, so every level in between passes
/// too. The farthest level also carries the rounding shortfall, so it is
/// checked against the maximums at its enlarged size.
#[must_use]
pub fn ensure_levels_size(
    base: Decimal,
    bound: Decimal,
    total_quantity: Decimal,
    level_count: usize,
    limits: &MarketLimits,
) -> LevelsCheck {
    if level_count == 0 {
        return LevelsCheck::TooLarge;
    }
    let count = Decimal::from(level_count);
    let quantity = limits.adapt_amount(total_quantity / count);
    let increment = (bound - base) / count;
    let side = ladder_side(base, bound);

    let inner = limits.adapt_price(base + increment);
    let outer = limits.adapt_price(bound);
    let cheap = PriceLevel::new(side, inner.min(outer), quantity);
    let dear = PriceLevel::new(side, inner.max(outer), quantity);

    if let Some(breach) = limits.check_minimums(&cheap) {
        debug!(levels = level_count, %quantity, %breach, "Ladder levels too small");
        return LevelsCheck::TooSmall;
    }
    if let Some(breach) = limits.check_maximums(&dear) {
        debug!(levels = level_count, %quantity, %breach, "Ladder levels too large");
        return LevelsCheck::TooLarge;
    }
    let farthest = PriceLevel::new(
        side,
        outer,
        quantity + rounding_shortfall(total_quantity, quantity, count, limits),
    );
    if let Some(breach) = limits.check_maximums(&farthest) {
        debug!(
            levels = level_count,
            amount = %farthest.amount,
            %breach,
            "Farthest ladder level too large"
        );
        return LevelsCheck::TooLarge;
    }
    LevelsCheck::Ok
}

/// Spread `total_quantity` over even levels from just past `base` up to
/// `bound`, adjusting `requested_levels` until the levels fit `limits`.
///
/// The realized amounts sum to `total_quantity` truncated to the market's
/// amount precision, so a remainder below one amount step is not placed.
/// The rounding shortfall between that total and the even split goes to
/// the farthest level, which still respects the maximums.
///
/// # Errors
/// - [`OpenladderError::InvalidLadderBounds`] if either price is not
///   positive or both are equal.
/// - [`OpenladderError::InfeasibleLadder`] if no level count in
///   `[1, MAX_LADDER_LEVELS]` fits the limits.
pub fn plan_ladder_levels(
    base: Decimal,
    bound: Decimal,
    total_quantity: Decimal,
    requested_levels: usize,
    limits: &MarketLimits,
) -> Result<Vec<PriceLevel>> {
    if base <= Decimal::ZERO || bound <= Decimal::ZERO || base == bound {
        return Err(OpenladderError::InvalidLadderBounds { base, bound });
    }
    if total_quantity <= Decimal::ZERO {
        return Err(OpenladderError::InfeasibleLadder {
            requested: requested_levels,
            reason: format!("total quantity {total_quantity} is not positive"),
        });
    }

    let mut level_count =
        requested_levels.clamp(constants::MIN_LADDER_LEVELS, constants::MAX_LADDER_LEVELS);
    let mut visited = HashSet::new();
    loop {
        visited.insert(level_count);
        let check = ensure_levels_size(base, bound, total_quantity, level_count, limits);
        let next = match check {
            LevelsCheck::Ok => break,
            LevelsCheck::TooSmall if level_count > constants::MIN_LADDER_LEVELS => level_count - 1,
            LevelsCheck::TooLarge if level_count < constants::MAX_LADDER_LEVELS => level_count + 1,
            LevelsCheck::TooSmall | LevelsCheck::TooLarge => {
                return Err(OpenladderError::InfeasibleLadder {
                    requested: requested_levels,
                    reason: format!("{check} at {level_count} levels"),
                });
            }
        };
        if visited.contains(&next) {
            return Err(OpenladderError::InfeasibleLadder {
                requested: requested_levels,
                reason: format!("limits conflict between {level_count} and {next} levels"),
            });
        }
        debug!(from = level_count, to = next, %check, "Adjusting ladder level count");
        level_count = next;
    }

    let side = ladder_side(base, bound);
    let count = Decimal::from(level_count);
    let increment = (bound - base) / count;
    let quantity = limits.adapt_amount(total_quantity / count);
    let mut levels: Vec<PriceLevel> = (1..=level_count)
        .map(|i| {
            PriceLevel::new(
                side,
                limits.adapt_price(base + increment * Decimal::from(i)),
                quantity,
            )
        })
        .collect();

    let shortfall = rounding_shortfall(total_quantity, quantity, count, limits);
    if let Some(last) = levels.last_mut() {
        last.amount += shortfall;
    }
    let unplaced = total_quantity - limits.adapt_amount(total_quantity);
    if !unplaced.is_zero() {
        debug!(%total_quantity, %unplaced, "Sub-precision remainder left out of the ladder");
    }

    debug!(
        side = %side,
        requested = requested_levels,
        levels = level_count,
        %quantity,
        %shortfall,
        "Planned ladder levels"
    );
    Ok(levels)
}

/// What an even split of `quantity` per level leaves of the adapted total.
fn rounding_shortfall(
    total_quantity: Decimal,
    quantity: Decimal,
    count: Decimal,
    limits: &MarketLimits,
) -> Decimal {
    limits.adapt_amount(total_quantity) - quantity * count
}

fn ladder_side(base: Decimal, bound: Decimal) -> OrderSide {
    if bound > base {
        OrderSide::Sell
    } else {
        OrderSide::Buy
    }
}
