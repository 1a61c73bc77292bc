//! Distribution fingerprints.
//!
//! Two distributions with the same reference price and the same levels
//! (after normalization, so `1.50` and `1.5` agree) hash to the same
//! digest. Budgets are not part of the digest: they do not change what
//! the book looks like on the exchange.

use sha2::{Digest, Sha256};

use crate::OrderBookDistribution;

/// SHA-256 digest of a distribution's reference price and levels.
#[must_use]
pub fn compute_distribution_digest(distribution: &OrderBookDistribution) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(b"openladder:distribution:v1:");
    hasher.update(distribution.reference_price.normalize().to_string().as_bytes());
    hasher.update((distribution.level_count() as u64).to_le_bytes());

    for level in distribution.iter_levels() {
        hasher.update(level.side.to_string().as_bytes());
        hasher.update(b":");
        hasher.update(level.price.normalize().to_string().as_bytes());
        hasher.update(b"@");
        hasher.update(level.amount.normalize().to_string().as_bytes());
        hasher.update(b";");
    }

    let result = hasher.finalize();
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&result);
    digest
}

/// Hex form of [`compute_distribution_digest`].
#[must_use]
pub fn distribution_digest_hex(distribution: &OrderBookDistribution) -> String {
    hex::encode(compute_distribution_digest(distribution))
}

/// Whether `distribution` hashes to `expected`.
#[must_use]
pub fn verify_distribution_digest(
    distribution: &OrderBookDistribution,
    expected: &[u8; 32],
) -> bool {
    compute_distribution_digest(distribution) == *expected
}

#[cfg(test)]
mod tests {
    use openladder_types::{
        AvailableFunds, DistributionConfig, MarketLimits, MarketSnapshot, VolumeDirection,
    };
    use rust_decimal::Decimal;

    use super::*;
    use crate::DistributionModel;

    fn book(reference: i64, funds: AvailableFunds) -> OrderBookDistribution {
        let config = DistributionConfig {
            volume_direction: VolumeDirection::Equal,
            ..DistributionConfig::default()
        };
        DistributionModel::new(config, MarketLimits::permissive("BTC/USDT"))
            .unwrap()
            .compute_distribution(
                &MarketSnapshot::new(
                    Decimal::new(reference, 0),
                    Decimal::new(10, 0),
                    Decimal::new(1_000_000, 0),
                ),
                &funds,
            )
    }

    #[test]
    fn same_book_same_digest() {
        let a = book(100_000, AvailableFunds::unlimited());
        let b = book(100_000, AvailableFunds::unlimited());
        assert_eq!(compute_distribution_digest(&a), compute_distribution_digest(&b));
        assert!(verify_distribution_digest(&a, &compute_distribution_digest(&b)));
    }

    #[test]
    fn price_move_changes_digest() {
        let a = book(100_000, AvailableFunds::unlimited());
        let b = book(100_001, AvailableFunds::unlimited());
        assert_ne!(distribution_digest_hex(&a), distribution_digest_hex(&b));
    }

    #[test]
    fn funds_clamp_changes_digest() {
        let a = book(100_000, AvailableFunds::unlimited());
        let b = book(100_000, AvailableFunds::new(Decimal::new(1, 2), Decimal::new(100, 0)));
        assert!(!verify_distribution_digest(&b, &compute_distribution_digest(&a)));
    }

    #[test]
    fn hex_is_64_chars() {
        let hex = distribution_digest_hex(&book(100_000, AvailableFunds::unlimited()));
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
