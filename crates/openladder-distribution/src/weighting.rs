//! Volume weighter: spread a side's target volume across its levels.
//!
//! Prices are ordered near-first, as the ladder builder emits them. The
//! weighted directions place each level on a linear curve by its relative
//! distance `x` from the innermost price (`0` = innermost, `1` = outermost):
//!
//! ```text
//! DECREASING  w(x) = 1 + m * x          innermost smallest
//! INCREASING  w(x) = 1 + m * (1 - x)    innermost largest
//! EQUAL       w(x) = 1
//! RANDOM      a    = average * (1 + m * u),  u uniform in (-1, 1]
//! ```
//!
//! The output never sums above `total_volume`: weighted amounts are
//! normalized, random amounts have their above-average excess trimmed, and
//! any leftover from decimal rounding is taken off the largest amount.

use openladder_types::{OrderSide, VolumeDirection, constants};
use rand::Rng;
use rust_decimal::Decimal;

/// Split `total_volume` across `prices` following `direction`.
///
/// `rng` is only drawn from for [`VolumeDirection::Random`]; pass a seeded
/// generator to make the output reproducible.
#[must_use]
pub fn weight_volumes<R: Rng>(
    side: OrderSide,
    total_volume: Decimal,
    prices: &[Decimal],
    multiplier: Decimal,
    direction: VolumeDirection,
    rng: &mut R,
) -> Vec<Decimal> {
    let count = prices.len();
    if count == 0 || total_volume <= Decimal::ZERO {
        return vec![Decimal::ZERO; count];
    }

    let mut amounts = match direction {
        VolumeDirection::Equal => vec![total_volume / Decimal::from(count); count],
        VolumeDirection::Decreasing => normalize(
            total_volume,
            relative_distances(prices)
                .into_iter()
                .map(|x| Decimal::ONE + multiplier * x)
                .collect(),
        ),
        VolumeDirection::Increasing => normalize(
            total_volume,
            relative_distances(prices)
                .into_iter()
                .map(|x| Decimal::ONE + multiplier * (Decimal::ONE - x))
                .collect(),
        ),
        VolumeDirection::Random => randomized(total_volume, count, multiplier, rng),
    };
    trim_overshoot(&mut amounts, total_volume);

    tracing::trace!(
        side = %side,
        direction = %direction,
        levels = count,
        total = %total_volume,
        "Weighted side volume"
    );
    amounts
}

/// Distance of each price from the innermost one, scaled to `[0, 1]`.
fn relative_distances(prices: &[Decimal]) -> Vec<Decimal> {
    let Some((first, last)) = prices.first().zip(prices.last()) else {
        return Vec::new();
    };
    let span = (*last - *first).abs();
    if span.is_zero() {
        return vec![Decimal::ZERO; prices.len()];
    }
    prices.iter().map(|p| (*p - *first).abs() / span).collect()
}

fn normalize(total_volume: Decimal, weights: Vec<Decimal>) -> Vec<Decimal> {
    let weight_sum: Decimal = weights.iter().sum();
    if weight_sum.is_zero() {
        return vec![Decimal::ZERO; weights.len()];
    }
    weights
        .into_iter()
        .map(|w| total_volume * w / weight_sum)
        .collect()
}

fn randomized<R: Rng>(
    total_volume: Decimal,
    count: usize,
    multiplier: Decimal,
    rng: &mut R,
) -> Vec<Decimal> {
    let average = total_volume / Decimal::from(count);
    let resolution = Decimal::from(constants::RANDOM_RESOLUTION);
    let mut amounts: Vec<Decimal> = (0..count)
        .map(|_| {
            // u in (-1, 1]: the lower end is open so every amount stays positive
            let draw = Decimal::from(rng.gen_range(1..=constants::RANDOM_RESOLUTION));
            let u = Decimal::TWO * draw / resolution - Decimal::ONE;
            average * (Decimal::ONE + multiplier * u)
        })
        .collect();

    // Pull the above-average amounts toward the average, proportionally to
    // their excess, until the sum fits. Nothing crosses below the average.
    let sum: Decimal = amounts.iter().sum();
    if sum > total_volume {
        let excess = sum - total_volume;
        let above: Decimal = amounts
            .iter()
            .filter(|a| **a > average)
            .map(|a| *a - average)
            .sum();
        if !above.is_zero() {
            for amount in amounts.iter_mut().filter(|a| **a > average) {
                *amount -= (*amount - average) * excess / above;
            }
        }
    }
    amounts
}

fn trim_overshoot(amounts: &mut [Decimal], total_volume: Decimal) {
    let sum: Decimal = amounts.iter().sum();
    if sum > total_volume {
        if let Some(largest) = amounts.iter_mut().max_by(|a, b| a.cmp(b)) {
            *largest -= sum - total_volume;
        }
    }
}
