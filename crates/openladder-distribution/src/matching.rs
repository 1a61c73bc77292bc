//! Nearest-price pairing of resting orders to ideal slots.
//!
//! Each slot claims at most one candidate: the nearest one of the same side
//! strictly inside the slot's match window. Because the window is at most
//! half the tightest slot gap, a candidate can fall inside one window only,
//! so the pairing does not depend on the order slots are visited in.

use openladder_types::PriceLevel;
use rust_decimal::Decimal;

/// Result of pairing candidates with slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotAssignment {
    /// For each slot, the index of the candidate it claimed.
    pub slots: Vec<Option<usize>>,
    /// Candidates no slot claimed, in input order.
    pub unmatched: Vec<usize>,
}

impl SlotAssignment {
    /// Number of slots left without a candidate.
    #[must_use]
    pub fn missing_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_none()).count()
    }
}

/// Pair `candidates` with `slots` one-to-one, by nearest price within `window`.
#[must_use]
pub fn assign_to_slots(
    slots: &[PriceLevel],
    candidates: &[PriceLevel],
    window: Decimal,
) -> SlotAssignment {
    let mut claimed = vec![false; candidates.len()];
    let mut assigned = Vec::with_capacity(slots.len());

    for slot in slots {
        let best = candidates
            .iter()
            .enumerate()
            .filter(|(i, c)| !claimed[*i] && c.side == slot.side)
            .map(|(i, c)| (i, (c.price - slot.price).abs()))
            .filter(|(_, distance)| *distance < window)
            .min_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));
        if let Some((index, _)) = best {
            claimed[index] = true;
        }
        assigned.push(best.map(|(index, _)| index));
    }

    let unmatched = claimed
        .iter()
        .enumerate()
        .filter(|(_, taken)| !**taken)
        .map(|(i, _)| i)
        .collect();
    SlotAssignment {
        slots: assigned,
        unmatched,
    }
}

/// Index of the slot whose price is closest to `price` (innermost on ties).
#[must_use]
pub fn nearest_slot(slots: &[PriceLevel], price: Decimal) -> Option<usize> {
    slots
        .iter()
        .enumerate()
        .min_by(|(ia, a), (ib, b)| {
            (a.price - price)
                .abs()
                .cmp(&(b.price - price).abs())
                .then(ia.cmp(ib))
        })
        .map(|(i, _)| i)
}
