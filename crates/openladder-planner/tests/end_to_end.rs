//! End-to-end tests: distribution -> plan -> coordinated execution.
//!
//! A simulated exchange keeps the resting orders so each cycle replans
//! against what the previous one left behind.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use openladder_distribution::{DistributionModel, OrderBookDistribution};
use openladder_planner::*;
use openladder_types::{
    Action, AvailableFunds, DistributionConfig, MarketLimits, MarketSnapshot, OpenOrder, OrderId,
    OrderSide, PriceLevel, TriggerSource,
};
use rust_decimal::Decimal;
use tokio::sync::Semaphore;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn dec(n: i64) -> Decimal {
    Decimal::new(n, 0)
}

const SYMBOL: &str = "BTC/USDT";

/// Free balances before any order rests.
fn free_funds() -> AvailableFunds {
    AvailableFunds::new(Decimal::new(3, 1), dec(30_000))
}

/// Exchange double: resting orders by id, plus a log of every call.
///
/// Calls block on `permits` so tests can hold a plan in flight.
struct SimExchange {
    book: Mutex<HashMap<OrderId, OpenOrder>>,
    calls: Mutex<Vec<Action>>,
    permits: Semaphore,
}

impl SimExchange {
    fn open() -> Self {
        Self {
            book: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            permits: Semaphore::new(Semaphore::MAX_PERMITS),
        }
    }

    fn gated() -> Self {
        Self {
            permits: Semaphore::new(0),
            ..Self::open()
        }
    }

    fn open_orders(&self) -> Vec<OpenOrder> {
        self.book.lock().unwrap().values().cloned().collect()
    }

    fn fill(&self, order_id: OrderId) {
        self.book.lock().unwrap().remove(&order_id);
    }

    fn call_log(&self) -> Vec<Action> {
        self.calls.lock().unwrap().clone()
    }

    async fn wait_turn(&self) -> Result<(), GatewayError> {
        self.permits
            .acquire()
            .await
            .map(|permit| permit.forget())
            .map_err(|err| GatewayError::Transport(err.to_string()))
    }
}

#[async_trait]
impl OrderGateway for SimExchange {
    async fn create_order(
        &self,
        _symbol: &str,
        level: &PriceLevel,
    ) -> Result<OrderId, GatewayError> {
        self.wait_turn().await?;
        self.calls.lock().unwrap().push(Action::create(*level));
        let order_id = OrderId::new();
        self.book.lock().unwrap().insert(
            order_id,
            OpenOrder::new(order_id, level.side, level.price, level.amount),
        );
        Ok(order_id)
    }

    async fn cancel_order(&self, _symbol: &str, order_id: OrderId) -> Result<(), GatewayError> {
        self.wait_turn().await?;
        self.calls.lock().unwrap().push(Action::cancel(order_id));
        match self.book.lock().unwrap().remove(&order_id) {
            Some(_) => Ok(()),
            None => Err(GatewayError::AlreadyGone),
        }
    }
}

struct Strategy {
    model: DistributionModel,
    planner: ReconciliationPlanner,
}

impl Strategy {
    fn new() -> Self {
        let limits = MarketLimits::btc_usdt();
        Self {
            model: DistributionModel::new(DistributionConfig::default(), limits.clone()).unwrap(),
            planner: ReconciliationPlanner::new(limits),
        }
    }

    fn ideal(&self, reference: i64, open: &[OpenOrder]) -> OrderBookDistribution {
        let snapshot = MarketSnapshot::new(dec(reference), dec(10), dec(1_000_000));
        // free balances plus what the resting orders lock
        let total = open
            .iter()
            .fold(free_funds(), |funds, o| funds.credited(o.side, o.locked_funds()));
        self.model.compute_distribution(&snapshot, &total)
    }

    fn plan(
        &self,
        reference: i64,
        open: &[OpenOrder],
        trigger: TriggerSource,
    ) -> (OrdersUpdatePlan, OrderBookDistribution) {
        let ideal = self.ideal(reference, open);
        (self.planner.build_plan(&ideal, open, true, trigger), ideal)
    }
}

#[tokio::test]
async fn empty_exchange_gets_full_ladder() {
    init_tracing();
    let strategy = Strategy::new();
    let exchange = SimExchange::open();

    let (plan, _) = strategy.plan(100_000, &[], TriggerSource::FullRefresh);
    assert_eq!(plan.create_count(), 10);
    assert_eq!(plan.cancel_count(), 0);
    assert!(!plan.cancellable);

    let report = execute_plan(&plan, &exchange).await.unwrap();
    assert!(report.is_complete());
    assert_eq!(exchange.open_orders().len(), 10);

    // nothing left to do on the next cycle
    let open = exchange.open_orders();
    let (next, _) = strategy.plan(100_000, &open, TriggerSource::Funds);
    assert!(next.is_empty(), "{:?}", next.order_actions);
}

#[tokio::test]
async fn single_fill_is_topped_up() {
    init_tracing();
    let strategy = Strategy::new();
    let exchange = SimExchange::open();
    let (plan, _) = strategy.plan(100_000, &[], TriggerSource::FullRefresh);
    execute_plan(&plan, &exchange).await.unwrap();

    let filled = exchange
        .open_orders()
        .into_iter()
        .find(|o| o.side == OrderSide::Sell && o.price == dec(102_000))
        .unwrap();
    exchange.fill(filled.id);

    let open = exchange.open_orders();
    let distance = strategy.model.get_shape_distance_from(
        &open,
        &free_funds(),
        &MarketSnapshot::new(dec(100_000), dec(10), dec(1_000_000)),
        TriggerSource::OrderFill,
    );
    assert!(!strategy.model.needs_replan(distance));

    let (top_up, _) = strategy.plan(100_000, &open, TriggerSource::OrderFill);
    assert_eq!(top_up.order_actions, vec![Action::create(filled.as_level())]);
    assert!(top_up.cancellable);

    let report = execute_plan(&top_up, &exchange).await.unwrap();
    assert_eq!(report.created.len(), 1);
    assert_eq!(exchange.open_orders().len(), 10);
}

#[tokio::test]
async fn vanished_order_cancel_is_benign() {
    init_tracing();
    let strategy = Strategy::new();
    let exchange = SimExchange::open();
    let (plan, _) = strategy.plan(100_000, &[], TriggerSource::FullRefresh);
    execute_plan(&plan, &exchange).await.unwrap();

    let open = exchange.open_orders();
    let (refresh, _) = strategy.plan(100_000, &open, TriggerSource::FullRefresh);
    // one order fills between planning and execution
    exchange.fill(open[0].id);

    let report = execute_plan(&refresh, &exchange).await.unwrap();
    assert!(report.is_complete());
    assert_eq!(report.already_gone, 1);
    assert_eq!(report.cancelled.len(), 10);
    assert_eq!(exchange.open_orders().len(), 10);
    assert!(serde_json::to_string(&report).unwrap().contains("already_gone"));
}

/// Submit a trigger whose plan is diffed against the exchange once the
/// symbol's gate is held.
async fn submit_trigger(
    coordinator: &PlanCoordinator,
    strategy: &Arc<Strategy>,
    exchange: &Arc<SimExchange>,
    target: OrderBookDistribution,
) -> openladder_types::Result<Submission> {
    let (planning, resting) = (Arc::clone(strategy), Arc::clone(exchange));
    coordinator
        .submit(SYMBOL, target, exchange.as_ref(), |_| false, move |target| {
            planning
                .planner
                .build_plan(target, &resting.open_orders(), true, TriggerSource::ReferencePrice)
        })
        .await
}

fn spawn_trigger(
    coordinator: &Arc<PlanCoordinator>,
    strategy: &Arc<Strategy>,
    exchange: &Arc<SimExchange>,
    target: OrderBookDistribution,
) -> tokio::task::JoinHandle<openladder_types::Result<Submission>> {
    let (coordinator, strategy, exchange) =
        (Arc::clone(coordinator), Arc::clone(strategy), Arc::clone(exchange));
    tokio::spawn(async move { submit_trigger(&coordinator, &strategy, &exchange, target).await })
}

fn sorted_levels<'a>(levels: impl Iterator<Item = &'a PriceLevel>) -> Vec<PriceLevel> {
    let mut levels: Vec<PriceLevel> = levels.copied().collect();
    levels.sort_by_key(|l| (l.side, l.price));
    levels
}

#[tokio::test]
async fn coordinator_coalesces_and_queues() {
    init_tracing();
    let strategy = Arc::new(Strategy::new());
    let coordinator = Arc::new(PlanCoordinator::new());
    let exchange = Arc::new(SimExchange::gated());

    let first_target = strategy.ideal(100_000, &[]);
    let running = spawn_trigger(&coordinator, &strategy, &exchange, first_target.clone());
    while coordinator.in_flight(SYMBOL).unwrap().is_none() {
        tokio::task::yield_now().await;
    }

    // same target: coalesced without touching the gate
    let duplicate = strategy.ideal(100_000, &[]);
    let outcome = submit_trigger(&coordinator, &strategy, &exchange, duplicate)
        .await
        .unwrap();
    assert!(matches!(outcome, Submission::Coalesced { .. }));

    // the price moves before anything rests: the trigger queues
    let moved_target = strategy.ideal(110_000, &exchange.open_orders());
    let queued = spawn_trigger(&coordinator, &strategy, &exchange, moved_target.clone());
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert!(!queued.is_finished());

    exchange.permits.add_permits(1_000);
    let first_outcome = running.await.unwrap().unwrap();
    let queued_outcome = queued.await.unwrap().unwrap();
    assert!(matches!(first_outcome, Submission::Executed(_)));
    assert!(matches!(queued_outcome, Submission::Executed(_)));

    // first ladder placed, then replaced as a whole by the moved one
    let log = exchange.call_log();
    let creates = |target: &OrderBookDistribution| -> Vec<Action> {
        target.iter_levels().map(|l| Action::create(*l)).collect()
    };
    assert_eq!(log.len(), 30);
    assert_eq!(log[..10], creates(&first_target)[..]);
    assert!(log[10..20].iter().all(Action::is_cancel));
    assert_eq!(log[20..], creates(&moved_target)[..]);

    // a single ladder rests, within the free funds
    let book = exchange.open_orders();
    let resting: Vec<PriceLevel> = book.iter().map(OpenOrder::as_level).collect();
    assert_eq!(sorted_levels(resting.iter()), sorted_levels(moved_target.iter_levels()));
    let locked = |side: OrderSide| -> Decimal {
        book.iter()
            .filter(|o| o.side == side)
            .map(OpenOrder::locked_funds)
            .sum()
    };
    assert!(locked(OrderSide::Sell) <= Decimal::new(3, 1));
    assert!(locked(OrderSide::Buy) <= dec(30_000));
    assert_eq!(coordinator.in_flight(SYMBOL).unwrap(), None);
}

#[tokio::test]
async fn aborted_trigger_can_be_retried() {
    init_tracing();
    let strategy = Arc::new(Strategy::new());
    let coordinator = Arc::new(PlanCoordinator::new());
    let exchange = Arc::new(SimExchange::gated());
    let target = strategy.ideal(100_000, &[]);

    let aborted = spawn_trigger(&coordinator, &strategy, &exchange, target.clone());
    exchange.permits.add_permits(3);
    while exchange.call_log().len() < 3 {
        tokio::task::yield_now().await;
    }
    aborted.abort();
    assert!(aborted.await.unwrap_err().is_cancelled());
    assert_eq!(coordinator.in_flight(SYMBOL).unwrap(), None);
    assert_eq!(exchange.open_orders().len(), 3);

    // same target as the abandoned plan, so only a live plan may coalesce it
    exchange.permits.add_permits(1_000);
    let retry = submit_trigger(&coordinator, &strategy, &exchange, target.clone())
        .await
        .unwrap();
    assert!(matches!(retry, Submission::Executed(ref r) if r.is_complete()));
    let book: Vec<PriceLevel> = exchange.open_orders().iter().map(OpenOrder::as_level).collect();
    assert_eq!(sorted_levels(book.iter()), sorted_levels(target.iter_levels()));
}
