//! # Allocation Calculator
//!
//! Decides who owes what, recomputed from a snapshot every time.
//!
//! ## Calculation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Allocation of one bill                             │
//! │                                                                         │
//! │  items ──► line_total = price × quantity ──► bill_items_total          │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │  assignments ──► sharer_count per item                                 │
//! │                 │                                                       │
//! │                 ├── 0 sharers: unassigned, nobody pays it              │
//! │                 └── N sharers: line_total / N to each (exact)          │
//! │                                  │                                      │
//! │                                  ▼                                      │
//! │                 item_total(p) = Σ shares of p                          │
//! │                                  │                                      │
//! │  tax + tip ─────────────────────►├── × item_total(p) / total_assigned   │
//! │                                  ▼                                      │
//! │                 total(p) = item_total(p) + tax_tip_share(p)            │
//! │                 amount_due(p) = total(p) + share_of_common_costs(p)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Guarantees
//! - Σ per-sharer amounts of an item = its line total, exactly.
//! - Σ item_total(p) = total_assigned_items ≤ bill_items_total.
//! - Σ tax_tip_share(p) = tax + tip whenever anything is assigned, else all zero.
//! - bill_total = bill_items_total + tax + tip, whatever the assignments.
//!
//! Tax and tip follow assigned cost, not headcount. A participant with no
//! items pays no tax or tip, and the tax/tip attributable to unassigned items
//! is left unallocated.
//!
//! Nothing here fails. Empty inputs give zero totals; assignment edges whose
//! item or participant is absent from the inputs are ignored.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use ts_rs::TS;

use crate::money::Money;
use crate::share::Share;
use crate::types::{
    AllocationItem, AllocationParticipant, BillSnapshot, ItemId, ParticipantId,
};

// =============================================================================
// Exact Result
// =============================================================================

/// How one item was split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemAllocation {
    pub item_id: ItemId,
    pub line_total: Money,
    pub sharer_count: usize,
    /// Amount each sharer carries; zero when unassigned.
    pub per_sharer: Share,
}

/// What one participant owes, exact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantAllocation {
    pub participant_id: ParticipantId,
    pub name: String,
    pub item_total: Share,
    pub tax_tip_share: Share,
    /// `item_total + tax_tip_share`
    pub total: Share,
    pub share_of_common_costs: Money,
    /// `total + share_of_common_costs`
    pub amount_due: Share,
}

/// The full, unrounded allocation of a bill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub bill_items_total: Money,
    pub total_assigned_items: Money,
    pub unassigned_items_total: Money,
    pub total_tax_tip: Money,
    pub bill_total: Money,
    /// Same order as the input items.
    pub items: Vec<ItemAllocation>,
    /// Same order as the input participants.
    pub participants: Vec<ParticipantAllocation>,
}

// =============================================================================
// Calculator
// =============================================================================

/// Allocates a loaded bill.
pub fn allocate(snapshot: &BillSnapshot) -> Allocation {
    let items: Vec<AllocationItem> = snapshot.items.iter().map(AllocationItem::from).collect();
    let participants: Vec<AllocationParticipant> = snapshot
        .participants
        .iter()
        .map(AllocationParticipant::from)
        .collect();
    let edges: Vec<(ItemId, ParticipantId)> = snapshot
        .assignments
        .iter()
        .map(|a| (a.item_id, a.participant_id))
        .collect();

    allocate_parts(
        &items,
        &participants,
        &edges,
        snapshot.bill.tax(),
        snapshot.bill.tip(),
    )
}

/// Allocates from loose parts. `edges` are `(item_id, participant_id)` pairs.
pub fn allocate_parts(
    items: &[AllocationItem],
    participants: &[AllocationParticipant],
    edges: &[(ItemId, ParticipantId)],
    tax: Money,
    tip: Money,
) -> Allocation {
    let participant_index: HashMap<ParticipantId, usize> = participants
        .iter()
        .enumerate()
        .map(|(idx, p)| (p.id, idx))
        .collect();

    // Sharers per item, dangling and repeated edges dropped
    let mut seen = HashSet::new();
    let mut sharers: HashMap<ItemId, Vec<usize>> = HashMap::new();
    for &(item_id, participant_id) in edges {
        let Some(&p_idx) = participant_index.get(&participant_id) else {
            continue;
        };
        if seen.insert((item_id, participant_id)) {
            sharers.entry(item_id).or_default().push(p_idx);
        }
    }

    let mut item_totals = vec![Share::zero(); participants.len()];
    let mut item_allocations = Vec::with_capacity(items.len());
    let mut bill_items_total = Money::zero();
    let mut total_assigned_items = Money::zero();

    for item in items {
        let line_total = item.line_total();
        bill_items_total += line_total;

        let item_sharers = sharers.get(&item.id).map(Vec::as_slice).unwrap_or(&[]);
        let per_sharer = Share::from(line_total).split(item_sharers.len());

        if !item_sharers.is_empty() {
            total_assigned_items += line_total;
            for &p_idx in item_sharers {
                item_totals[p_idx] += per_sharer;
            }
        }

        item_allocations.push(ItemAllocation {
            item_id: item.id,
            line_total,
            sharer_count: item_sharers.len(),
            per_sharer,
        });
    }

    let total_tax_tip = tax + tip;
    let tax_tip = Share::from(total_tax_tip);
    let assigned = Share::from(total_assigned_items);

    let participant_allocations = participants
        .iter()
        .zip(item_totals)
        .map(|(participant, item_total)| {
            let tax_tip_share = tax_tip.proportion(item_total, assigned);
            let total = item_total + tax_tip_share;
            ParticipantAllocation {
                participant_id: participant.id,
                name: participant.name.clone(),
                item_total,
                tax_tip_share,
                total,
                share_of_common_costs: participant.share_of_common_costs,
                amount_due: total + Share::from(participant.share_of_common_costs),
            }
        })
        .collect();

    Allocation {
        bill_items_total,
        total_assigned_items,
        unassigned_items_total: bill_items_total - total_assigned_items,
        total_tax_tip,
        bill_total: bill_items_total + total_tax_tip,
        items: item_allocations,
        participants: participant_allocations,
    }
}

// =============================================================================
// Presentation Summary
// =============================================================================

/// One participant's line in the summary, rounded to cents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ParticipantSummary {
    pub participant_id: ParticipantId,
    pub name: String,
    pub item_total: Money,
    pub tax_tip_share: Money,
    pub total: Money,
    pub share_of_common_costs: Money,
    pub amount_due: Money,
}

/// What the client displays. Each amount is rounded on its own (half to
/// even), so rounded parts may differ from a rounded sum by a cent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BillSummary {
    pub bill_items_total: Money,
    pub total_assigned_items: Money,
    pub unassigned_items_total: Money,
    pub total_tax_tip: Money,
    pub bill_total: Money,
    pub participants: Vec<ParticipantSummary>,
}

impl Allocation {
    /// Rounds the allocation for display.
    pub fn summary(&self) -> BillSummary {
        BillSummary {
            bill_items_total: self.bill_items_total,
            total_assigned_items: self.total_assigned_items,
            unassigned_items_total: self.unassigned_items_total,
            total_tax_tip: self.total_tax_tip,
            bill_total: self.bill_total,
            participants: self
                .participants
                .iter()
                .map(|p| ParticipantSummary {
                    participant_id: p.participant_id,
                    name: p.name.clone(),
                    item_total: p.item_total.round_to_money(),
                    tax_tip_share: p.tax_tip_share.round_to_money(),
                    total: p.total.round_to_money(),
                    share_of_common_costs: p.share_of_common_costs,
                    amount_due: p.amount_due.round_to_money(),
                })
                .collect(),
        }
    }

    /// Looks up a participant's allocation by id.
    pub fn participant(&self, participant_id: ParticipantId) -> Option<&ParticipantAllocation> {
        self.participants
            .iter()
            .find(|p| p.participant_id == participant_id)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
