//! Error types for the OpenLadder engine.
//!
//! All errors use the `OL_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Configuration errors (fatal, never retried)
//! - 2xx: Ladder feasibility errors (skip the planning cycle)
//! - 3xx: Market limits / precision errors
//! - 4xx: Plan lifecycle errors
//! - 9xx: General / internal errors
//!
//! Funds shortfall is deliberately absent: it is absorbed by the
//! shape-preserving clamp and never surfaced.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{OrderSide, PlanId};

/// Central error enum for all OpenLadder operations.
#[derive(Debug, Error)]
pub enum OpenladderError {
    // =================================================================
    // Configuration Errors (1xx)
    // =================================================================
    /// Generic configuration error (invalid document, bad field values).
    #[error("OL_ERR_100: Configuration error: {0}")]
    Configuration(String),

    /// `min_spread` / `max_spread` are not strictly ordered inside `(0, 2)`.
    #[error("OL_ERR_101: Invalid spread ordering: min_spread {min_spread}, max_spread {max_spread}")]
    SpreadOrdering {
        min_spread: Decimal,
        max_spread: Decimal,
    },

    /// A side asks for more levels than the platform allows.
    #[error("OL_ERR_102: {side} level count {count} exceeds platform maximum {max}")]
    LevelCountExceeded {
        side: OrderSide,
        count: usize,
        max: usize,
    },

    /// The inner liquidity band cannot be reached from `min_spread`.
    #[error(
        "OL_ERR_103: Inner band {inner_band} unreachable: half of min_spread is {half_min_spread}"
    )]
    InnerBandUnreachable {
        inner_band: Decimal,
        half_min_spread: Decimal,
    },

    // =================================================================
    // Ladder Feasibility Errors (2xx)
    // =================================================================
    /// No level count in the allowed range satisfies the exchange limits.
    #[error("OL_ERR_200: Infeasible ladder ({requested} levels requested): {reason}")]
    InfeasibleLadder { requested: usize, reason: String },

    /// The ladder bounds do not describe a usable price range.
    #[error("OL_ERR_201: Invalid ladder bounds: base {base}, bound {bound}")]
    InvalidLadderBounds { base: Decimal, bound: Decimal },

    // =================================================================
    // Market Limits Errors (3xx)
    // =================================================================
    /// The market descriptor itself is inconsistent (e.g. min > max).
    #[error("OL_ERR_300: Invalid market limits: {reason}")]
    InvalidMarketLimits { reason: String },

    /// A reference price that cannot anchor a ladder (zero or negative).
    #[error("OL_ERR_301: Invalid reference price: {0}")]
    InvalidReferencePrice(Decimal),

    // =================================================================
    // Plan Lifecycle Errors (4xx)
    // =================================================================
    /// A plan was handed to an executor after it already completed.
    #[error("OL_ERR_400: Plan already processed: {0}")]
    PlanAlreadyProcessed(PlanId),

    /// A plan was handed to an executor after it was cancelled.
    #[error("OL_ERR_401: Plan cancelled: {0}")]
    PlanCancelled(PlanId),

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("OL_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("OL_ERR_901: Serialization error: {0}")]
    Serialization(String),
}

impl OpenladderError {
    /// Whether the error means the configuration must be fixed before any
    /// further planning can happen.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_)
                | Self::SpreadOrdering { .. }
                | Self::LevelCountExceeded { .. }
                | Self::InnerBandUnreachable { .. }
                | Self::InvalidMarketLimits { .. }
        )
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, OpenladderError>;

impl From<serde_json::Error> for OpenladderError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
