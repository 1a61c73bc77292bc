//! Platform-wide constants for the OpenLadder engine.

use rust_decimal::Decimal;

/// Maximum number of price levels on one side of a distribution.
pub const MAX_LEVELS_PER_SIDE: usize = 50;

/// Smallest level count the feasibility search may shrink to.
pub const MIN_LADDER_LEVELS: usize = 1;

/// Largest level count the feasibility search may grow to.
pub const MAX_LADDER_LEVELS: usize = 40;

/// Default number of bid levels.
pub const DEFAULT_BIDS_COUNT: usize = 5;

/// Default number of ask levels.
pub const DEFAULT_ASKS_COUNT: usize = 5;

/// Default spread between the two innermost orders (2%).
pub const DEFAULT_MIN_SPREAD: Decimal = Decimal::from_parts(2, 0, 0, false, 2);

/// Default spread between the two outermost orders (10%).
pub const DEFAULT_MAX_SPREAD: Decimal = Decimal::from_parts(10, 0, 0, false, 2);

/// Default share of the daily traded volume placed on each side (2%).
pub const DEFAULT_DAILY_VOLUME_PERCENT: Decimal = Decimal::from_parts(2, 0, 0, false, 2);

/// Default half-width of the near-mid liquidity band, as a fraction of price (2%).
pub const DEFAULT_INNER_BAND_PERCENT: Decimal = Decimal::from_parts(2, 0, 0, false, 2);

/// Default share of the daily volume that must rest inside the inner band (0.5%).
pub const DEFAULT_INNER_BAND_VOLUME_PERCENT: Decimal = Decimal::from_parts(5, 0, 0, false, 3);

/// Default curve steepness for weighted volume directions.
pub const DEFAULT_VOLUME_MULTIPLIER: Decimal = Decimal::from_parts(5, 0, 0, false, 1);

/// Default relative price drift tolerated before an order is replaced (0.1%).
pub const DEFAULT_PRICE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 3);

/// Default relative amount drift tolerated before an order is replaced (10%).
pub const DEFAULT_AMOUNT_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 1);

/// Resolution of the uniform draws used by the random volume direction.
pub const RANDOM_RESOLUTION: u32 = 1_000_000;
