//! Orders update plans and their completion signal.
//!
//! A plan is built once per replanning trigger and handed to one executor.
//! Clones of a plan share its cancel flag and its `processed` signal, so the
//! strategy can keep a handle to request a cancel or await completion while
//! the executor works through the actions.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use openladder_types::{Action, PlanId, TriggerSource};
use tokio::sync::watch;

/// Single-fire completion signal.
///
/// Fired by the executor once every action resolved, or once a cancelled
/// plan stopped issuing actions. A coordinated plan whose submission is
/// dropped mid-run fires it too. Any number of tasks may await it, before
/// or after it fires.
#[derive(Debug, Clone)]
pub struct ProcessedSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl ProcessedSignal {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Fire the signal. Returns `false` if it had already fired.
    pub fn fire(&self) -> bool {
        !self.tx.send_replace(true)
    }

    #[must_use]
    pub fn is_fired(&self) -> bool {
        *self.tx.borrow()
    }

    /// Wait until the signal fires. Returns immediately if it already has.
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // the sender lives as long as `self`, so this cannot fail
        let _ = rx.wait_for(|fired| *fired).await;
    }
}

impl Default for ProcessedSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// An ordered list of create/cancel actions for one symbol.
#[derive(Debug, Clone)]
pub struct OrdersUpdatePlan {
    pub id: PlanId,
    pub symbol: String,
    /// Actions in execution order.
    pub order_actions: Vec<Action>,
    /// Whether the caller may abort the remaining actions. Always `false`
    /// for full replaces.
    pub cancellable: bool,
    /// Cancels every open order and recreates the whole shape.
    pub full_replace: bool,
    pub trigger_source: TriggerSource,
    /// Hex digest of the distribution this plan moves the book toward.
    pub target_digest: String,
    pub created_at: DateTime<Utc>,
    cancelled: Arc<AtomicBool>,
    processed: ProcessedSignal,
}

impl OrdersUpdatePlan {
    #[must_use]
    pub fn new(
        symbol: impl Into<String>,
        order_actions: Vec<Action>,
        cancellable: bool,
        full_replace: bool,
        trigger_source: TriggerSource,
        target_digest: String,
    ) -> Self {
        Self {
            id: PlanId::new(),
            symbol: symbol.into(),
            order_actions,
            cancellable: cancellable && !full_replace,
            full_replace,
            trigger_source,
            target_digest,
            created_at: Utc::now(),
            cancelled: Arc::new(AtomicBool::new(false)),
            processed: ProcessedSignal::new(),
        }
    }

    /// Ask the executor to stop issuing actions.
    ///
    /// Already issued calls complete normally. Returns `false` (and leaves
    /// the plan running) if the plan is not cancellable.
    pub fn request_cancel(&self) -> bool {
        if !self.cancellable {
            tracing::warn!(
                plan = %self.id,
                symbol = %self.symbol,
                "Ignoring cancel request on a non-cancellable plan"
            );
            return false;
        }
        self.cancelled.store(true, Ordering::SeqCst);
        true
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn processed(&self) -> &ProcessedSignal {
        &self.processed
    }

    #[must_use]
    pub fn is_processed(&self) -> bool {
        self.processed.is_fired()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order_actions.is_empty()
    }

    #[must_use]
    pub fn create_count(&self) -> usize {
        self.order_actions.iter().filter(|a| a.is_create()).count()
    }

    #[must_use]
    pub fn cancel_count(&self) -> usize {
        self.order_actions.iter().filter(|a| a.is_cancel()).count()
    }
}
