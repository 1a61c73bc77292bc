//! Plan executor: carry out a plan's actions through an [`OrderGateway`].
//!
//! Actions run strictly in plan order, one at a time. A gateway reporting
//! that an order is already gone (filled or cancelled concurrently) counts
//! as success. Other gateway errors are recorded in the report and do not
//! stop the plan.
//!
//! A cancel request on a cancellable plan stops it before the next action;
//! calls already issued are left to complete. Non-cancellable plans always
//! run to the end. `processed` fires exactly once when the executor is done.

use async_trait::async_trait;
use openladder_types::{Action, OpenladderError, OrderId, PlanId, PriceLevel, Result};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::OrdersUpdatePlan;

/// Failure reported by the exchange connectivity layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The order was already filled or cancelled.
    #[error("order already gone")]
    AlreadyGone,

    /// The exchange refused the request.
    #[error("rejected by exchange: {reason}")]
    Rejected { reason: String },

    /// The request did not reach the exchange or its answer was lost.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Exchange operations an executor needs. Implemented by the connectivity
/// layer; the engine never talks to the network itself.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Place `level` as a resting limit order, returning its id.
    async fn create_order(
        &self,
        symbol: &str,
        level: &PriceLevel,
    ) -> std::result::Result<OrderId, GatewayError>;

    /// Cancel a resting order.
    async fn cancel_order(&self, symbol: &str, order_id: OrderId)
    -> std::result::Result<(), GatewayError>;
}

/// One action the gateway failed to carry out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionFailure {
    pub action: Action,
    pub reason: String,
}

/// What happened to each action of an executed plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionReport {
    pub plan_id: PlanId,
    /// Ids of the orders created, in plan order.
    pub created: Vec<OrderId>,
    /// Orders cancelled, including those already gone.
    pub cancelled: Vec<OrderId>,
    /// Actions whose target was already gone.
    pub already_gone: usize,
    pub failures: Vec<ActionFailure>,
    /// Actions never issued because the plan was cancelled.
    pub skipped: usize,
    pub was_cancelled: bool,
}

impl ExecutionReport {
    fn new(plan_id: PlanId) -> Self {
        Self {
            plan_id,
            created: Vec::new(),
            cancelled: Vec::new(),
            already_gone: 0,
            failures: Vec::new(),
            skipped: 0,
            was_cancelled: false,
        }
    }

    /// Every action was issued and resolved without a failure.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && !self.was_cancelled
    }
}

/// Run `plan` against `gateway`.
///
/// # Errors
/// - [`OpenladderError::PlanAlreadyProcessed`] if the plan already ran.
/// - [`OpenladderError::PlanCancelled`] if the plan was cancelled before
///   its first action; `processed` still fires.
pub async fn execute_plan<G: OrderGateway + ?Sized>(
    plan: &OrdersUpdatePlan,
    gateway: &G,
) -> Result<ExecutionReport> {
    if plan.is_processed() {
        return Err(OpenladderError::PlanAlreadyProcessed(plan.id));
    }
    if plan.cancellable && plan.is_cancelled() {
        plan.processed().fire();
        info!(plan = %plan.id, symbol = %plan.symbol, "Plan cancelled before execution");
        return Err(OpenladderError::PlanCancelled(plan.id));
    }

    let mut report = ExecutionReport::new(plan.id);
    for (index, action) in plan.order_actions.iter().enumerate() {
        if plan.cancellable && plan.is_cancelled() {
            report.was_cancelled = true;
            report.skipped = plan.order_actions.len() - index;
            break;
        }

        match action {
            Action::CreateOrder { order_data } => {
                match gateway.create_order(&plan.symbol, order_data).await {
                    Ok(order_id) => report.created.push(order_id),
                    Err(GatewayError::AlreadyGone) => {
                        debug!(plan = %plan.id, %action, "Create target already gone");
                        report.already_gone += 1;
                    }
                    Err(err) => record_failure(&mut report, plan, action, &err),
                }
            }
            Action::CancelOrder { order_id } => {
                match gateway.cancel_order(&plan.symbol, *order_id).await {
                    Ok(()) => report.cancelled.push(*order_id),
                    Err(GatewayError::AlreadyGone) => {
                        debug!(
                            plan = %plan.id,
                            %order_id,
                            "Order already gone, cancel counted as done"
                        );
                        report.already_gone += 1;
                        report.cancelled.push(*order_id);
                    }
                    Err(err) => record_failure(&mut report, plan, action, &err),
                }
            }
        }
    }

    plan.processed().fire();
    info!(
        plan = %plan.id,
        symbol = %plan.symbol,
        created = report.created.len(),
        cancelled = report.cancelled.len(),
        already_gone = report.already_gone,
        failures = report.failures.len(),
        skipped = report.skipped,
        was_cancelled = report.was_cancelled,
        "Plan processed"
    );
    Ok(report)
}

fn record_failure(
    report: &mut ExecutionReport,
    plan: &OrdersUpdatePlan,
    action: &Action,
    err: &GatewayError,
) {
    warn!(plan = %plan.id, symbol = %plan.symbol, %action, %err, "Plan action failed");
    report.failures.push(ActionFailure {
        action: *action,
        reason: err.to_string(),
    });
}
