//! Reconciliation planner: diff an ideal book against the open orders.
//!
//! ## Full replace
//!
//! Every open order is cancelled and every placeable ideal level is
//! created. These plans are never cancellable, so they cannot stop with
//! the book half cancelled. A plan is a full replace when:
//!
//! - the trigger is a full refresh, or nothing is resting yet
//! - the resting orders are further from the ideal shape than the replan
//!   tolerance
//! - the incremental diff would cancel every resting order anyway
//!
//! ## Incremental
//!
//! Per side, open orders are paired one-to-one with ideal slots by nearest
//! price within the book's match window. Then:
//!
//! 1. Orders no slot claimed are cancelled
//! 2. A slot whose order is off by more than the price or amount tolerance
//!    gets a cancel followed by the corrected create
//! 3. A slot with no order gets a create
//!
//! Matching orders are left untouched. Creates are checked against the
//! exchange limits and shrunk to the side's budget minus what the kept
//! orders already lock.

use openladder_distribution::{
    OrderBookDistribution, assign_to_slots, distribution_digest_hex, shape_distance,
};
use openladder_types::{
    Action, DistributionConfig, MarketLimits, OpenOrder, OrderSide, PriceLevel, TriggerSource,
};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::OrdersUpdatePlan;

/// Builds [`OrdersUpdatePlan`]s for one market. Side-effect free.
#[derive(Debug, Clone)]
pub struct ReconciliationPlanner {
    limits: MarketLimits,
}

impl ReconciliationPlanner {
    #[must_use]
    pub fn new(limits: MarketLimits) -> Self {
        Self { limits }
    }

    #[must_use]
    pub fn limits(&self) -> &MarketLimits {
        &self.limits
    }

    /// Plan the actions that move `open_orders` to `ideal`.
    ///
    /// `cancellable` only applies to incremental plans.
    #[must_use]
    pub fn build_plan(
        &self,
        ideal: &OrderBookDistribution,
        open_orders: &[OpenOrder],
        cancellable: bool,
        trigger_source: TriggerSource,
    ) -> OrdersUpdatePlan {
        let mut full_replace = trigger_source.is_full_refresh()
            || open_orders.is_empty()
            || off_shape(ideal, open_orders);
        let mut actions = if full_replace {
            self.full_replace_actions(ideal, open_orders)
        } else {
            self.incremental_actions(ideal, open_orders)
        };
        if !full_replace && cancels_every_order(&actions, open_orders) {
            debug!(
                symbol = %self.limits.symbol,
                open = open_orders.len(),
                "Every resting order is replaced, planning a full replace"
            );
            full_replace = true;
            actions = self.full_replace_actions(ideal, open_orders);
        }

        let plan = OrdersUpdatePlan::new(
            self.limits.symbol.clone(),
            actions,
            cancellable,
            full_replace,
            trigger_source,
            distribution_digest_hex(ideal),
        );
        info!(
            plan = %plan.id,
            symbol = %plan.symbol,
            trigger = %trigger_source,
            full_replace,
            cancellable = plan.cancellable,
            creates = plan.create_count(),
            cancels = plan.cancel_count(),
            "Built orders update plan"
        );
        plan
    }

    fn full_replace_actions(
        &self,
        ideal: &OrderBookDistribution,
        open_orders: &[OpenOrder],
    ) -> Vec<Action> {
        let mut actions: Vec<Action> = open_orders.iter().map(|o| Action::cancel(o.id)).collect();
        for side in [OrderSide::Buy, OrderSide::Sell] {
            let mut remaining = ideal.budget(side).max(Decimal::ZERO);
            actions.extend(
                ideal
                    .levels(side)
                    .iter()
                    .filter_map(|slot| self.placeable(slot, &mut remaining))
                    .map(Action::create),
            );
        }
        actions
    }

    fn incremental_actions(
        &self,
        ideal: &OrderBookDistribution,
        open_orders: &[OpenOrder],
    ) -> Vec<Action> {
        let config = ideal.config();
        let mut stray_cancels = Vec::new();
        let mut slot_actions = Vec::new();

        for side in [OrderSide::Buy, OrderSide::Sell] {
            let orders: Vec<&OpenOrder> = open_orders.iter().filter(|o| o.side == side).collect();
            let candidates: Vec<PriceLevel> = orders.iter().map(|o| o.as_level()).collect();
            let slots = ideal.levels(side);
            let assignment = assign_to_slots(slots, &candidates, ideal.match_window(side));

            stray_cancels.extend(
                assignment
                    .unmatched
                    .iter()
                    .map(|i| Action::cancel(orders[*i].id)),
            );

            let replace: Vec<bool> = slots
                .iter()
                .zip(assignment.slots.iter())
                .map(|(slot, claim)| claim.is_some_and(|i| differs(slot, &candidates[i], config)))
                .collect();
            let kept_locked: Decimal = assignment
                .slots
                .iter()
                .zip(replace.iter())
                .filter_map(|(claim, replaced)| claim.filter(|_| !*replaced))
                .map(|i| candidates[i].locked_funds())
                .sum();
            let replaced_count = replace.iter().filter(|r| **r).count();
            let mut remaining = (ideal.budget(side) - kept_locked).max(Decimal::ZERO);

            for ((slot, claim), replaced) in
                slots.iter().zip(assignment.slots.iter()).zip(replace)
            {
                match claim {
                    Some(i) if replaced => {
                        slot_actions.push(Action::cancel(orders[*i].id));
                        if let Some(level) = self.placeable(slot, &mut remaining) {
                            slot_actions.push(Action::create(level));
                        }
                    }
                    Some(_) => {}
                    None => {
                        if let Some(level) = self.placeable(slot, &mut remaining) {
                            slot_actions.push(Action::create(level));
                        }
                    }
                }
            }

            debug!(
                side = %side,
                open = orders.len(),
                slots = slots.len(),
                strays = assignment.unmatched.len(),
                missing = assignment.missing_count(),
                replaced = replaced_count,
                "Diffed side against ideal"
            );
        }

        stray_cancels.extend(slot_actions);
        stray_cancels
    }

    /// `slot` as an order that fits the exchange limits and `remaining`,
    /// which is debited. `None` if nothing placeable is left.
    fn placeable(&self, slot: &PriceLevel, remaining: &mut Decimal) -> Option<PriceLevel> {
        if slot.amount <= Decimal::ZERO {
            return None;
        }
        let mut level = *slot;
        if level.locked_funds() > *remaining {
            level.amount = match level.side {
                OrderSide::Buy => self.limits.adapt_amount(*remaining / level.price),
                OrderSide::Sell => self.limits.adapt_amount(*remaining),
            };
            debug!(
                side = %level.side,
                price = %level.price,
                from = %slot.amount,
                to = %level.amount,
                "Shrinking create to budget"
            );
        }
        if level.amount <= Decimal::ZERO {
            return None;
        }
        if let Some(breach) = self.limits.check_level(&level) {
            debug!(
                side = %level.side,
                price = %level.price,
                amount = %level.amount,
                %breach,
                "Skipping level outside market limits"
            );
            return None;
        }
        *remaining -= level.locked_funds();
        Some(level)
    }
}

/// Whether the resting orders are beyond the replan tolerance of `ideal`.
fn off_shape(ideal: &OrderBookDistribution, open_orders: &[OpenOrder]) -> bool {
    let resting: Vec<PriceLevel> = open_orders.iter().map(OpenOrder::as_level).collect();
    let distance = shape_distance(ideal, &resting);
    let tolerance = ideal.config().replan_tolerance();
    if distance > tolerance {
        debug!(%distance, %tolerance, "Resting orders off shape");
        return true;
    }
    false
}

fn cancels_every_order(actions: &[Action], open_orders: &[OpenOrder]) -> bool {
    !open_orders.is_empty()
        && open_orders.iter().all(|order| {
            actions
                .iter()
                .any(|a| matches!(a, Action::CancelOrder { order_id } if *order_id == order.id))
        })
}

/// Whether a resting order is materially off its slot.
fn differs(slot: &PriceLevel, order: &PriceLevel, config: &DistributionConfig) -> bool {
    if slot.amount <= Decimal::ZERO {
        return true;
    }
    let price_gap = (order.price - slot.price).abs() / slot.price;
    let amount_gap = (order.amount - slot.amount).abs() / slot.amount;
    price_gap > config.price_tolerance || amount_gap > config.amount_tolerance
}

#[cfg(test)]
mod tests {
    use openladder_distribution::DistributionModel;
    use openladder_types::{AvailableFunds, MarketSnapshot};

    use super::*;

    fn dec(n: i64) -> Decimal {
        Decimal::new(n, 0)
    }

    fn ideal() -> OrderBookDistribution {
        DistributionModel::new(DistributionConfig::default(), MarketLimits::permissive("BTC/USDT"))
            .unwrap()
            .compute_distribution(
                &MarketSnapshot::new(dec(100_000), dec(10), dec(1_000_000)),
                &AvailableFunds::unlimited(),
            )
    }

    fn planner() -> ReconciliationPlanner {
        ReconciliationPlanner::new(MarketLimits::permissive("BTC/USDT"))
    }

    fn resting(book: &OrderBookDistribution) -> Vec<OpenOrder> {
        book.iter_levels().map(OpenOrder::dummy_from_level).collect()
    }

    #[test]
    fn empty_book_is_a_full_create() {
        let book = ideal();
        let plan = planner().build_plan(&book, &[], true, TriggerSource::ReferencePrice);
        assert_eq!(plan.create_count(), 10);
        assert_eq!(plan.cancel_count(), 0);
        assert!(plan.full_replace);
        assert!(!plan.cancellable);
    }

    #[test]
    fn matching_book_needs_nothing() {
        let book = ideal();
        let plan = planner().build_plan(&book, &resting(&book), true, TriggerSource::OrderFill);
        assert!(plan.is_empty());
        assert!(plan.cancellable);
    }

    #[test]
    fn full_refresh_cancels_before_creating() {
        let book = ideal();
        let orders = resting(&book);
        let plan = planner().build_plan(&book, &orders, true, TriggerSource::FullRefresh);
        assert_eq!(plan.cancel_count(), 10);
        assert_eq!(plan.create_count(), 10);
        assert!(plan.order_actions[..10].iter().all(Action::is_cancel));
        assert!(!plan.cancellable);
    }

    #[test]
    fn off_amount_is_replaced() {
        let book = ideal();
        let mut orders = resting(&book);
        orders[6].amount *= Decimal::new(15, 1);
        let plan = planner().build_plan(&book, &orders, true, TriggerSource::OrderFill);
        assert_eq!(
            plan.order_actions,
            vec![Action::cancel(orders[6].id), Action::create(book.asks[1])]
        );
    }

    #[test]
    fn small_drift_is_tolerated() {
        let book = ideal();
        let mut orders = resting(&book);
        // 5% amount drift, 0.05% price drift
        orders[0].amount *= Decimal::new(105, 2);
        orders[0].price += dec(50);
        let plan = planner().build_plan(&book, &orders, true, TriggerSource::OrderFill);
        assert!(plan.is_empty());
    }

    #[test]
    fn stray_orders_are_cancelled_first() {
        let book = ideal();
        let mut orders = resting(&book);
        orders[6].amount *= Decimal::new(15, 1);
        let stray = OpenOrder::dummy(OrderSide::Sell, dec(110_000), Decimal::new(1, 3));
        orders.push(stray.clone());
        let plan = planner().build_plan(&book, &orders, true, TriggerSource::OrderFill);
        assert_eq!(
            plan.order_actions,
            vec![
                Action::cancel(stray.id),
                Action::cancel(orders[6].id),
                Action::create(book.asks[1]),
            ]
        );
        assert!(!plan.full_replace);
        assert!(plan.cancellable);
    }

    #[test]
    fn price_move_replaces_the_whole_book() {
        let orders = resting(&ideal());
        let model = DistributionModel::new(
            DistributionConfig::default(),
            MarketLimits::permissive("BTC/USDT"),
        )
        .unwrap();
        let moved = model.compute_distribution(
            &MarketSnapshot::new(dec(110_000), dec(10), dec(1_000_000)),
            &AvailableFunds::unlimited(),
        );
        let plan = planner().build_plan(&moved, &orders, true, TriggerSource::ReferencePrice);
        assert_eq!(plan.cancel_count(), 10);
        assert_eq!(plan.create_count(), 10);
        assert!(plan.order_actions[..10].iter().all(Action::is_cancel));
        assert!(plan.full_replace);
        assert!(!plan.cancellable);
    }

    #[test]
    fn losing_every_order_is_a_full_replace() {
        let book = ideal();
        // every order drifts 20% in amount, so none can be kept
        let mut orders = resting(&book);
        for order in &mut orders {
            order.amount *= Decimal::new(12, 1);
        }
        let plan = planner().build_plan(&book, &orders, true, TriggerSource::OrderFill);
        assert_eq!(plan.cancel_count(), 10);
        assert_eq!(plan.create_count(), 10);
        assert!(plan.order_actions[..10].iter().all(Action::is_cancel));
        assert!(plan.full_replace);
        assert!(!plan.cancellable);
    }

    #[test]
    fn single_gap_stays_incremental() {
        let book = ideal();
        let mut orders = resting(&book);
        let missing = orders.remove(2);
        let plan = planner().build_plan(&book, &orders, true, TriggerSource::OrderFill);
        assert_eq!(plan.order_actions, vec![Action::create(missing.as_level())]);
        assert!(!plan.full_replace);
    }

    #[test]
    fn creates_respect_market_minimums() {
        let limits = MarketLimits::permissive("BTC/USDT").with_cost_range(Some(dec(4_000)), None);
        let book = ideal();
        let plan = ReconciliationPlanner::new(limits.clone()).build_plan(
            &book,
            &[],
            false,
            TriggerSource::FullRefresh,
        );
        for action in &plan.order_actions {
            if let Action::CreateOrder { order_data } = action {
                assert!(limits.check_level(order_data).is_none(), "{action}");
            }
        }
        assert!(plan.create_count() < 10);
    }

    #[test]
    fn creates_shrink_to_remaining_budget() {
        let mut book = ideal();
        // the kept orders already lock all but 0.01 BTC of the ask budget
        book.ask_budget =
            book.total_locked(OrderSide::Sell) - book.asks[4].amount + Decimal::new(1, 2);
        let mut orders = resting(&book);
        orders.remove(9);
        let plan = planner().build_plan(&book, &orders, true, TriggerSource::OrderFill);
        let expected = PriceLevel::new(OrderSide::Sell, book.asks[4].price, Decimal::new(1, 2));
        assert_eq!(plan.order_actions, vec![Action::create(expected)]);
    }

    #[test]
    fn plan_targets_the_ideal_digest() {
        let book = ideal();
        let plan = planner().build_plan(&book, &[], true, TriggerSource::Funds);
        assert_eq!(plan.target_digest, distribution_digest_hex(&book));
    }
}
