//! # openladder-planner
//!
//! **Action plane for OpenLadder**: turns an ideal book into the create and
//! cancel actions that move the exchange toward it, and runs them.
//!
//! ## Architecture
//!
//! 1. **ReconciliationPlanner**: diffs the ideal book against the open
//!    orders and builds an [`OrdersUpdatePlan`]
//! 2. **execute_plan**: issues the plan's actions through an
//!    [`OrderGateway`] and fires the plan's `processed` signal
//! 3. **PlanCoordinator**: keeps one plan in flight per symbol, coalescing
//!    or queueing later triggers and building their plans once it is
//!    their turn
//!
//! ## Flow
//!
//! ```text
//! DistributionModel.compute_distribution() → ReconciliationPlanner.build_plan()
//!     → PlanCoordinator.submit() → execute_plan() → OrderGateway
//! ```
//!
//! Planning is synchronous and side-effect free; only execution awaits.

pub mod coordinator;
pub mod executor;
pub mod plan;
pub mod planner;

pub use coordinator::{PlanCoordinator, Submission};
pub use executor::{ActionFailure, ExecutionReport, GatewayError, OrderGateway, execute_plan};
pub use plan::{OrdersUpdatePlan, ProcessedSignal};
pub use planner::ReconciliationPlanner;
