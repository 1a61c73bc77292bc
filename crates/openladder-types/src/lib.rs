//! # openladder-types
//!
//! Shared types, errors, and configuration for the **OpenLadder** engine.
//!
//! This crate is the leaf dependency of the workspace: every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`OrderId`], [`PlanId`]
//! - **Order model**: [`OrderSide`], [`PriceLevel`], [`OpenOrder`]
//! - **Market model**: [`MarketLimits`], [`LimitBreach`]
//! - **Configuration**: [`DistributionConfig`], [`VolumeDirection`]
//! - **Inputs**: [`MarketSnapshot`], [`AvailableFunds`]
//! - **Actions**: [`Action`]
//! - **Triggers**: [`TriggerSource`]
//! - **Errors**: [`OpenladderError`] with `OL_ERR_` prefix codes
//! - **Constants**: platform-wide limits and defaults

pub mod action;
pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod market;
pub mod order;
pub mod snapshot;
pub mod trigger;

// Re-export all primary types at crate root for ergonomic imports:
//   use openladder_types::{OrderSide, PriceLevel, MarketLimits, ...};

pub use action::*;
pub use config::*;
pub use error::*;
pub use ids::*;
pub use market::*;
pub use order::*;
pub use snapshot::*;
pub use trigger::*;

// Constants are accessed via `openladder_types::constants::FOO`
// (not re-exported to avoid name collisions).
