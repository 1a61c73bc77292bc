//! Shape distance and swap inference.
//!
//! The shape distance scores how far a set of resting orders is from the
//! ideal book. Every order is paired with the nearest ideal slot of its
//! side; each slot then scores two terms, both capped at 1:
//!
//! - **price**: amount-weighted price offset of its orders, over
//!   `reference * max_spread / 2`
//! - **amount**: relative gap between the slot's amount and its orders'
//!   summed amount
//!
//! A wanted slot with no order scores 2, an order on a side without slots
//! scores 1. The distance is the mean over scored slots and strays, so it
//! lives in `[0, 2]`.

use std::collections::HashSet;

use openladder_types::{
    Action, AvailableFunds, MarketSnapshot, OpenOrder, OrderId, OrderSide, PriceLevel,
    TriggerSource,
};
use rust_decimal::Decimal;
use tracing::debug;

use crate::matching::{assign_to_slots, nearest_slot};
use crate::{DistributionModel, OrderBookDistribution};

/// Score `orders` against `ideal`. Zero means the shapes match.
#[must_use]
pub fn shape_distance(ideal: &OrderBookDistribution, orders: &[PriceLevel]) -> Decimal {
    let price_scale = ideal.reference_price * ideal.config().max_spread / Decimal::TWO;
    let mut total = Decimal::ZERO;
    let mut scored: usize = 0;

    for side in [OrderSide::Buy, OrderSide::Sell] {
        let slots = ideal.levels(side);
        let mut paired_amount = vec![Decimal::ZERO; slots.len()];
        let mut paired_offset = vec![Decimal::ZERO; slots.len()];
        let mut paired_count = vec![0_usize; slots.len()];

        for order in orders.iter().filter(|o| o.side == side) {
            if let Some(j) = nearest_slot(slots, order.price) {
                paired_amount[j] += order.amount;
                paired_offset[j] += order.amount * (order.price - slots[j].price).abs();
                paired_count[j] += 1;
            } else {
                total += Decimal::ONE;
                scored += 1;
            }
        }

        for (j, slot) in slots.iter().enumerate() {
            let wanted = slot.amount > Decimal::ZERO;
            if paired_count[j] == 0 {
                if wanted {
                    total += Decimal::TWO;
                    scored += 1;
                }
                continue;
            }
            let price_term = if paired_amount[j].is_zero() || price_scale <= Decimal::ZERO {
                Decimal::ZERO
            } else {
                paired_offset[j] / paired_amount[j] / price_scale
            };
            let amount_term = if wanted {
                (paired_amount[j] - slot.amount).abs() / slot.amount
            } else {
                Decimal::ONE
            };
            total += price_term.min(Decimal::ONE) + amount_term.min(Decimal::ONE);
            scored += 1;
        }
    }

    if scored == 0 {
        Decimal::ZERO
    } else {
        total / Decimal::from(scored)
    }
}

impl DistributionModel {
    /// Shape distance between `existing_orders` and the ideal book for the
    /// same inputs.
    ///
    /// `funds` are the *free* balances; the funds locked in
    /// `existing_orders` are added back before the ideal book is computed.
    #[must_use]
    pub fn get_shape_distance_from(
        &self,
        existing_orders: &[OpenOrder],
        funds: &AvailableFunds,
        snapshot: &MarketSnapshot,
        trigger_source: TriggerSource,
    ) -> Decimal {
        let levels: Vec<PriceLevel> = existing_orders.iter().map(OpenOrder::as_level).collect();
        let ideal = self.compute_distribution(snapshot, &with_locked_funds(*funds, &levels));
        let distance = shape_distance(&ideal, &levels);
        debug!(
            symbol = %self.limits().symbol,
            trigger = %trigger_source,
            orders = existing_orders.len(),
            distance = %distance,
            tolerance = %self.config().replan_tolerance(),
            "Computed shape distance"
        );
        distance
    }

    /// Whether `distance` is large enough to justify a full replan.
    #[must_use]
    pub fn needs_replan(&self, distance: Decimal) -> bool {
        distance > self.config().replan_tolerance()
    }

    /// The full order set the book should hold once the gaps left by
    /// filled or cancelled orders are refilled.
    ///
    /// Resting orders (minus those with a pending cancel, plus those with a
    /// pending create) are paired with ideal slots per side. Orders keep
    /// their own price and amount; slots left without an order are
    /// synthesized from the ideal book, capped by the free funds. Orders no
    /// slot claimed are kept as they are. The output is sorted by side, then
    /// by distance to the reference, so re-running on it is a no-op.
    #[must_use]
    pub fn infer_full_order_data_after_swaps(
        &self,
        existing_orders: &[OpenOrder],
        pending_actions: &[Action],
        funds: &AvailableFunds,
        snapshot: &MarketSnapshot,
    ) -> Vec<PriceLevel> {
        let cancelled: HashSet<OrderId> = pending_actions
            .iter()
            .filter_map(|action| match action {
                Action::CancelOrder { order_id } => Some(*order_id),
                Action::CreateOrder { .. } => None,
            })
            .collect();

        let mut free = *funds;
        for order in existing_orders.iter().filter(|o| cancelled.contains(&o.id)) {
            free = free.credited(order.side, order.locked_funds());
        }

        let mut current: Vec<PriceLevel> = existing_orders
            .iter()
            .filter(|o| !cancelled.contains(&o.id))
            .map(OpenOrder::as_level)
            .collect();
        for action in pending_actions {
            if let Action::CreateOrder { order_data } = action {
                free = free.credited(order_data.side, -order_data.locked_funds());
                current.push(*order_data);
            }
        }

        let ideal = self.compute_distribution(snapshot, &with_locked_funds(free, &current));
        let mut result: Vec<PriceLevel> = Vec::with_capacity(ideal.level_count() + current.len());

        for side in [OrderSide::Buy, OrderSide::Sell] {
            let side_orders: Vec<PriceLevel> =
                current.iter().filter(|o| o.side == side).copied().collect();
            let slots = ideal.levels(side);
            let assignment = assign_to_slots(slots, &side_orders, ideal.match_window(side));
            let mut remaining = free.for_side(side).map(|f| f.max(Decimal::ZERO));

            for (slot, claim) in slots.iter().zip(assignment.slots.iter()) {
                match claim {
                    Some(index) => result.push(side_orders[*index]),
                    None => {
                        if let Some(level) = self.fit_to_funds(slot, &mut remaining) {
                            result.push(level);
                        }
                    }
                }
            }
            result.extend(assignment.unmatched.iter().map(|i| side_orders[*i]));

            debug!(
                side = %side,
                slots = slots.len(),
                missing = assignment.missing_count(),
                strays = assignment.unmatched.len(),
                "Inferred orders after swaps"
            );
        }

        let reference = snapshot.reference_price;
        result.sort_by(|a, b| {
            a.side
                .cmp(&b.side)
                .then(a.distance_to(reference).cmp(&b.distance_to(reference)))
                .then(a.price.cmp(&b.price))
                .then(a.amount.cmp(&b.amount))
        });
        result
    }

    /// `slot` shrunk so it locks no more than `remaining`, which is debited.
    /// `None` when nothing placeable is left.
    fn fit_to_funds(
        &self,
        slot: &PriceLevel,
        remaining: &mut Option<Decimal>,
    ) -> Option<PriceLevel> {
        if slot.amount <= Decimal::ZERO {
            return None;
        }
        let Some(budget) = remaining.as_mut() else {
            return Some(*slot);
        };
        let mut level = *slot;
        if level.locked_funds() > *budget {
            level.amount = match level.side {
                OrderSide::Buy => self.limits().adapt_amount(*budget / level.price),
                OrderSide::Sell => self.limits().adapt_amount(*budget),
            };
        }
        if level.amount <= Decimal::ZERO {
            return None;
        }
        *budget -= level.locked_funds();
        Some(level)
    }
}

/// Free funds plus what `orders` already lock, per side.
fn with_locked_funds(funds: AvailableFunds, orders: &[PriceLevel]) -> AvailableFunds {
    orders
        .iter()
        .fold(funds, |acc, order| acc.credited(order.side, order.locked_funds()))
}

#[cfg(test)]
mod tests {
    use openladder_types::{DistributionConfig, MarketLimits, VolumeDirection};

    use super::*;

    fn dec(n: i64) -> Decimal {
        Decimal::new(n, 0)
    }

    fn model() -> DistributionModel {
        DistributionModel::new(
            DistributionConfig::default(),
            MarketLimits::permissive("BTC/USDT"),
        )
        .unwrap()
    }

    fn snapshot() -> MarketSnapshot {
        MarketSnapshot::new(dec(100_000), dec(10), dec(1_000_000))
    }

    fn ideal_orders(book: &OrderBookDistribution) -> Vec<OpenOrder> {
        book.iter_levels().map(OpenOrder::dummy_from_level).collect()
    }

    #[test]
    fn identical_book_scores_zero() {
        let book = model().compute_distribution(&snapshot(), &AvailableFunds::unlimited());
        let levels: Vec<PriceLevel> = book.iter_levels().copied().collect();
        assert_eq!(shape_distance(&book, &levels), Decimal::ZERO);
    }

    #[test]
    fn empty_book_scores_maximum() {
        let book = model().compute_distribution(&snapshot(), &AvailableFunds::unlimited());
        assert_eq!(shape_distance(&book, &[]), Decimal::TWO);
    }

    #[test]
    fn one_missing_order_stays_below_tolerance() {
        let model = model();
        let book = model.compute_distribution(&snapshot(), &AvailableFunds::unlimited());
        let mut orders = ideal_orders(&book);
        orders.remove(3);
        let distance = model.get_shape_distance_from(
            &orders,
            &AvailableFunds::unlimited(),
            &snapshot(),
            TriggerSource::OrderFill,
        );
        // one wanted slot of ten scores 2
        assert_eq!(distance, Decimal::new(2, 1));
        assert!(!model.needs_replan(distance));
    }

    #[test]
    fn price_move_triggers_replan() {
        let model = model();
        let book = model.compute_distribution(&snapshot(), &AvailableFunds::unlimited());
        let orders = ideal_orders(&book);
        let moved = MarketSnapshot::new(dec(110_000), dec(10), dec(1_000_000));
        let distance = model.get_shape_distance_from(
            &orders,
            &AvailableFunds::unlimited(),
            &moved,
            TriggerSource::ReferencePrice,
        );
        assert!(model.needs_replan(distance), "distance {distance}");
    }

    #[test]
    fn locked_funds_are_added_back() {
        let model = model();
        let total = AvailableFunds::new(Decimal::new(1, 1), dec(5_000));
        let book = model.compute_distribution(&snapshot(), &total);
        let orders = ideal_orders(&book);
        let locked_base = book.total_locked(OrderSide::Sell);
        let locked_quote = book.total_locked(OrderSide::Buy);
        let free = AvailableFunds::new(
            Decimal::new(1, 1) - locked_base,
            dec(5_000) - locked_quote,
        );
        let distance =
            model.get_shape_distance_from(&orders, &free, &snapshot(), TriggerSource::Funds);
        assert_eq!(distance, Decimal::ZERO);
    }

    #[test]
    fn swaps_refill_only_the_gap() {
        let model = model();
        let book = model.compute_distribution(&snapshot(), &AvailableFunds::unlimited());
        let mut orders = ideal_orders(&book);
        let filled = orders.remove(1);
        let inferred = model.infer_full_order_data_after_swaps(
            &orders,
            &[],
            &AvailableFunds::unlimited(),
            &snapshot(),
        );
        assert_eq!(inferred.len(), 10);
        assert!(inferred.contains(&filled.as_level()));
    }

    #[test]
    fn swaps_are_idempotent() {
        let model = model();
        let book = model.compute_distribution(&snapshot(), &AvailableFunds::unlimited());
        let mut orders = ideal_orders(&book);
        orders.remove(7);
        orders.remove(0);
        let funds = AvailableFunds::unlimited();

        let first = model.infer_full_order_data_after_swaps(&orders, &[], &funds, &snapshot());
        let as_orders: Vec<OpenOrder> = first.iter().map(OpenOrder::dummy_from_level).collect();
        let second = model.infer_full_order_data_after_swaps(&as_orders, &[], &funds, &snapshot());
        assert_eq!(first, second);
    }

    #[test]
    fn pending_actions_count_as_applied() {
        let model = model();
        let book = model.compute_distribution(&snapshot(), &AvailableFunds::unlimited());
        let mut orders = ideal_orders(&book);
        let in_flight = orders.remove(2).as_level();
        let stray = OpenOrder::dummy(OrderSide::Buy, Decimal::new(97_400, 0), Decimal::ONE);
        orders.push(stray.clone());

        let pending = [Action::create(in_flight), Action::cancel(stray.id)];
        let inferred = model.infer_full_order_data_after_swaps(
            &orders,
            &pending,
            &AvailableFunds::unlimited(),
            &snapshot(),
        );
        let expected: Vec<PriceLevel> = {
            let mut levels: Vec<PriceLevel> = book.iter_levels().copied().collect();
            levels.sort_by(|a, b| {
                a.side.cmp(&b.side).then(
                    a.distance_to(book.reference_price)
                        .cmp(&b.distance_to(book.reference_price)),
                )
            });
            levels
        };
        assert_eq!(inferred, expected);
    }

    #[test]
    fn synthesized_levels_respect_free_funds() {
        let config = DistributionConfig {
            volume_direction: VolumeDirection::Equal,
            ..DistributionConfig::default()
        };
        let model = DistributionModel::new(config, MarketLimits::permissive("BTC/USDT")).unwrap();
        let funds = AvailableFunds::new(Decimal::new(5, 2), dec(0));
        let inferred = model.infer_full_order_data_after_swaps(&[], &[], &funds, &snapshot());
        let asks: Decimal = inferred
            .iter()
            .filter(|l| l.side == OrderSide::Sell)
            .map(|l| l.amount)
            .sum();
        assert!(asks <= Decimal::new(5, 2));
        assert!(inferred.iter().all(|l| l.side == OrderSide::Sell));
    }
}
