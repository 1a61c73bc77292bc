//! # openladder-distribution
//!
//! **Pure ladder construction for OpenLadder.**
//!
//! This crate is the compute plane. Given a market snapshot, the available
//! funds and a [`DistributionModel`], it produces the ideal two-sided book
//! and measures how far a set of resting orders is from it:
//!
//! - **No I/O**: every function is synchronous and side-effect free
//! - **Exact arithmetic**: `Decimal` throughout, truncated to market precision
//! - **Funds-safe**: a side never locks more than its available funds
//! - **Reproducible**: random shapes are seeded from the config
//!
//! Single-sided ladders (dip-buying, profit-taking fans) go through the
//! feasibility search in [`feasibility`] instead.

pub mod digest;
pub mod distribution;
pub mod feasibility;
pub mod ladder;
pub mod matching;
pub mod shape;
pub mod weighting;

pub use digest::{compute_distribution_digest, distribution_digest_hex, verify_distribution_digest};
pub use distribution::{DistributionModel, OrderBookDistribution};
pub use feasibility::{LevelsCheck, ensure_levels_size, plan_ladder_levels};
pub use ladder::{build_ladder, ladder_bounds};
pub use matching::{SlotAssignment, assign_to_slots, nearest_slot};
pub use shape::shape_distance;
pub use weighting::weight_volumes;
