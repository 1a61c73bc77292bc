//! Per-symbol plan coordination.
//!
//! At most one plan executes per symbol at a time. A trigger submitted
//! while a plan for the same symbol is executing is either:
//!
//! - **coalesced**: it targets the same book (equal digests), or the
//!   caller's shape check says the in-flight target is already adequate;
//!   nothing is planned for it
//! - **queued**: it waits on the symbol's gate. Its plan is only built once
//!   the gate is held, so it diffs against the orders the previous plan
//!   left behind and submissions from two triggers never interleave
//!
//! The in-flight slot is released by a guard, so a submission dropped
//! mid-plan frees the symbol and fires its plan's `processed` signal.
//!
//! Distinct symbols never wait on each other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use openladder_distribution::{OrderBookDistribution, distribution_digest_hex};
use openladder_types::{OpenladderError, PlanId, Result};
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info, warn};

use crate::{ExecutionReport, OrderGateway, OrdersUpdatePlan, ProcessedSignal, execute_plan};

/// Outcome of [`PlanCoordinator::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// A plan was built and ran.
    Executed(ExecutionReport),
    /// The trigger was dropped in favour of the plan in flight.
    Coalesced { in_flight: PlanId },
}

struct InFlight {
    plan_id: PlanId,
    digest: String,
    target: Arc<OrderBookDistribution>,
}

#[derive(Default)]
struct SymbolSlot {
    gate: Arc<tokio::sync::Mutex<()>>,
    in_flight: Mutex<Option<InFlight>>,
}

impl SymbolSlot {
    fn in_flight(&self) -> Result<Option<(PlanId, String, Arc<OrderBookDistribution>)>> {
        let guard = self
            .in_flight
            .lock()
            .map_err(|_| OpenladderError::Internal("in-flight plan lock poisoned".into()))?;
        Ok(guard
            .as_ref()
            .map(|f| (f.plan_id, f.digest.clone(), Arc::clone(&f.target))))
    }

    fn set_in_flight(&self, value: InFlight) -> Result<()> {
        let mut guard = self
            .in_flight
            .lock()
            .map_err(|_| OpenladderError::Internal("in-flight plan lock poisoned".into()))?;
        *guard = Some(value);
        Ok(())
    }
}

/// Holds a symbol's gate while its plan runs.
///
/// Dropping it clears the in-flight slot before the gate opens, and fires
/// the plan's `processed` signal if the executor never got to.
struct InFlightGuard {
    slot: Arc<SymbolSlot>,
    plan_id: PlanId,
    processed: ProcessedSignal,
    _gate: OwnedMutexGuard<()>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.slot
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if self.processed.fire() {
            warn!(plan = %self.plan_id, "Plan dropped before it was processed");
        }
    }
}

/// Serializes plan execution per symbol.
#[derive(Default)]
pub struct PlanCoordinator {
    slots: Mutex<HashMap<String, Arc<SymbolSlot>>>,
}

impl PlanCoordinator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, symbol: &str) -> Result<Arc<SymbolSlot>> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| OpenladderError::Internal("coordinator lock poisoned".into()))?;
        Ok(Arc::clone(slots.entry(symbol.to_owned()).or_default()))
    }

    /// Id of the plan currently executing for `symbol`, if any.
    pub fn in_flight(&self, symbol: &str) -> Result<Option<PlanId>> {
        Ok(self.slot(symbol)?.in_flight()?.map(|(plan_id, _, _)| plan_id))
    }

    /// Move `symbol`'s book toward `target`, unless the plan in flight
    /// already covers it.
    ///
    /// `is_adequate` is handed the in-flight target and decides whether a
    /// new plan is still worth it, typically by comparing a shape distance
    /// with the replan tolerance.
    ///
    /// `build_plan` runs once the symbol's gate is held and must diff
    /// `target` against the open orders as they are at that point.
    ///
    /// # Errors
    /// Any error of [`execute_plan`], an internal error if a lock was
    /// poisoned, or if the built plan is for another symbol.
    pub async fn submit<G, A, B>(
        &self,
        symbol: &str,
        target: OrderBookDistribution,
        gateway: &G,
        is_adequate: A,
        build_plan: B,
    ) -> Result<Submission>
    where
        G: OrderGateway + ?Sized,
        A: FnOnce(&OrderBookDistribution) -> bool + Send,
        B: FnOnce(&OrderBookDistribution) -> OrdersUpdatePlan + Send,
    {
        let slot = self.slot(symbol)?;
        let digest = distribution_digest_hex(&target);

        if let Some((in_flight, in_flight_digest, in_flight_target)) = slot.in_flight()? {
            let same_target = in_flight_digest == digest;
            if same_target || is_adequate(&in_flight_target) {
                info!(%in_flight, symbol, same_target, "Coalesced trigger into the plan in flight");
                return Ok(Submission::Coalesced { in_flight });
            }
        }

        debug!(symbol, "Waiting for symbol gate");
        let gate = Arc::clone(&slot.gate).lock_owned().await;
        let plan = build_plan(&target);
        let _guard = InFlightGuard {
            slot: Arc::clone(&slot),
            plan_id: plan.id,
            processed: plan.processed().clone(),
            _gate: gate,
        };
        if plan.symbol != symbol {
            return Err(OpenladderError::Internal(format!(
                "plan {} is for {}, submitted for {symbol}",
                plan.id, plan.symbol
            )));
        }
        slot.set_in_flight(InFlight {
            plan_id: plan.id,
            digest,
            target: Arc::new(target),
        })?;

        execute_plan(&plan, gateway).await.map(Submission::Executed)
    }
}
