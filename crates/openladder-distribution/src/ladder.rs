//! Ladder builder: evenly spaced price levels on one side of the book.
//!
//! ```text
//! asks:            near ── ... ── far     reference * (1 + spread / 2)
//! reference ──────────────────────────
//! bids:            near ── ... ── far     reference * (1 - spread / 2)
//! ```
//!
//! The near bound uses `min_spread`, the far bound `max_spread`. Prices are
//! exact decimals here; rounding to market precision happens when the
//! distribution turns them into levels.

use openladder_types::OrderSide;
use rust_decimal::Decimal;

/// Near and far bounds of `side` around `reference_price`.
#[must_use]
pub fn ladder_bounds(
    side: OrderSide,
    reference_price: Decimal,
    min_spread: Decimal,
    max_spread: Decimal,
) -> (Decimal, Decimal) {
    let sign = side.away_sign();
    let near = reference_price * (Decimal::ONE + sign * min_spread / Decimal::TWO);
    let far = reference_price * (Decimal::ONE + sign * max_spread / Decimal::TWO);
    (near, far)
}

/// Build `count` prices from the near bound to the far bound (near first).
///
/// Bids come out strictly decreasing and asks strictly increasing whenever
/// `0 < min_spread < max_spread` and the reference price is positive. The
/// first and last prices are exactly the two bounds.
#[must_use]
pub fn build_ladder(
    side: OrderSide,
    reference_price: Decimal,
    count: usize,
    min_spread: Decimal,
    max_spread: Decimal,
) -> Vec<Decimal> {
    let (near, far) = ladder_bounds(side, reference_price, min_spread, max_spread);
    match count {
        0 => Vec::new(),
        1 => vec![near],
        _ => {
            let step = (far - near) / Decimal::from(count - 1);
            let mut prices: Vec<Decimal> = (0..count - 1)
                .map(|i| near + step * Decimal::from(i))
                .collect();
            prices.push(far);
            prices
        }
    }
}
