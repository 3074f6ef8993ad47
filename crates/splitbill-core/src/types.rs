//! # Domain Types
//!
//! Core domain types used throughout SplitBill.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │                    ┌─────────────────┐                                  │
//! │                    │      Bill       │                                  │
//! │                    │  ─────────────  │                                  │
//! │                    │  id (UUID)      │                                  │
//! │                    │  status         │                                  │
//! │                    │  tax / tip      │                                  │
//! │                    └────────┬────────┘                                  │
//! │                 owns        │        owns                               │
//! │         ┌───────────────────┴───────────────────┐                       │
//! │  ┌──────▼──────────┐                   ┌────────▼────────┐              │
//! │  │      Item       │   ItemAssignment  │  Participant    │              │
//! │  │  ─────────────  │◄─────────────────►│  ─────────────  │              │
//! │  │  id (i64)       │  (item, person)   │  id (i64)       │              │
//! │  │  price_cents    │   unique pair     │  payment_status │              │
//! │  │  quantity ≥ 1   │                   │  common costs   │              │
//! │  └─────────────────┘                   └─────────────────┘              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Bills are keyed by an opaque UUID; items and participants by small
//! integers assigned by the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;
use uuid::Uuid;

use crate::money::Money;

// =============================================================================
// Identifiers
// =============================================================================

pub type BillId = Uuid;
pub type ItemId = i64;
pub type ParticipantId = i64;

// =============================================================================
// Bill Status
// =============================================================================

/// Lifecycle of a bill, driven by the external extraction workflow.
///
/// ```text
///   pending ──► processing ──┬──► completed   (final)
///                            └──► failed ──► processing (retry)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BillStatus {
    /// Created, no receipt submitted yet.
    #[default]
    Pending,
    /// Receipt handed to the extraction workflow.
    Processing,
    /// Extracted items were ingested.
    Completed,
    /// The workflow failed or returned an unusable payload.
    Failed,
}

impl BillStatus {
    pub const ALL: [BillStatus; 4] = [
        BillStatus::Pending,
        BillStatus::Processing,
        BillStatus::Completed,
        BillStatus::Failed,
    ];

    /// Whether a bill in this status may move to `next`.
    ///
    /// `completed` is final: items are ingested once per bill. A bill that
    /// is already `processing` cannot be started again.
    pub const fn can_transition_to(self, next: BillStatus) -> bool {
        !matches!(
            (self, next),
            (BillStatus::Completed, _) | (BillStatus::Processing, BillStatus::Processing)
        )
    }

    /// The statuses a bill may be in to move to `next`.
    pub fn sources_of(next: BillStatus) -> Vec<BillStatus> {
        BillStatus::ALL
            .into_iter()
            .filter(|status| status.can_transition_to(next))
            .collect()
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            BillStatus::Pending => "pending",
            BillStatus::Processing => "processing",
            BillStatus::Completed => "completed",
            BillStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for BillStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BillStatus::Pending),
            "processing" => Ok(BillStatus::Processing),
            "completed" => Ok(BillStatus::Completed),
            "failed" => Ok(BillStatus::Failed),
            other => Err(format!("unknown bill status: {other}")),
        }
    }
}

// =============================================================================
// Bill
// =============================================================================

/// One receipt shared by a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Bill {
    #[ts(as = "String")]
    pub id: BillId,
    pub name: String,
    pub status: BillStatus,
    /// Tax in cents, never negative.
    pub tax_cents: i64,
    /// Tip in cents, never negative.
    pub tip_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Bill {
    #[inline]
    pub fn tax(&self) -> Money {
        Money::from_cents(self.tax_cents)
    }

    #[inline]
    pub fn tip(&self) -> Money {
        Money::from_cents(self.tip_cents)
    }
}

// =============================================================================
// Item
// =============================================================================

/// One receipt line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Item {
    pub id: ItemId,
    #[ts(as = "String")]
    pub bill_id: BillId,
    pub name: String,
    /// Unit price in cents.
    pub price_cents: i64,
    pub quantity: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Item {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// `price × quantity`.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.price().multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Participant
// =============================================================================

/// A person sharing the bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Participant {
    pub id: ParticipantId,
    #[ts(as = "String")]
    pub bill_id: BillId,
    pub name: String,
    /// Free-form; never computed here.
    pub payment_status: String,
    /// Manual adjustment added after allocation.
    pub share_of_common_costs_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Participant {
    #[inline]
    pub fn share_of_common_costs(&self) -> Money {
        Money::from_cents(self.share_of_common_costs_cents)
    }
}

// =============================================================================
// Item Assignment
// =============================================================================

/// Edge between one item and one participant of the same bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ItemAssignment {
    pub item_id: ItemId,
    pub participant_id: ParticipantId,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Snapshot
// =============================================================================

/// Everything the allocation needs, read in one consistent pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillSnapshot {
    pub bill: Bill,
    pub items: Vec<Item>,
    pub participants: Vec<Participant>,
    pub assignments: Vec<ItemAssignment>,
}

// =============================================================================
// Inputs
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBill {
    pub name: String,
    #[serde(default)]
    pub tax_cents: i64,
    #[serde(default)]
    pub tip_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewParticipant {
    pub name: String,
    #[serde(default)]
    pub share_of_common_costs_cents: i64,
}

/// A line item about to be inserted (extraction output, already validated).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    pub name: String,
    pub price_cents: i64,
    pub quantity: i64,
}

/// Partial item correction. Only `Some` fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemUpdate {
    pub name: Option<String>,
    pub price_cents: Option<i64>,
    pub quantity: Option<i64>,
}

impl ItemUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.price_cents.is_none() && self.quantity.is_none()
    }
}

/// Partial tax/tip change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillUpdate {
    pub tax_cents: Option<i64>,
    pub tip_cents: Option<i64>,
}

impl BillUpdate {
    pub fn is_empty(&self) -> bool {
        self.tax_cents.is_none() && self.tip_cents.is_none()
    }
}

// =============================================================================
// Extraction Contract
// =============================================================================

/// Output of the OCR/LLM workflow. Amounts are major units.
///
/// ```json
/// { "items": [{"name": "Ramen", "price": 12.5, "quantity": 2}],
///   "tax": 2.0, "tip": 3.0, "total": 30.0 }
/// ```
/// `total` is accepted and discarded; totals are always recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedBill {
    #[serde(default)]
    pub items: Vec<ExtractedItem>,
    #[serde(default)]
    pub tax: f64,
    #[serde(default)]
    pub tip: f64,
    #[serde(default)]
    pub total: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedItem {
    pub name: String,
    pub price: f64,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

fn default_quantity() -> i64 {
    1
}

/// A validated extraction payload, ready for the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionIngest {
    pub tax: Money,
    pub tip: Money,
    pub items: Vec<NewItem>,
}

// =============================================================================
// Calculator Inputs
// =============================================================================

/// The slice of an [`Item`] the allocation reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationItem {
    pub id: ItemId,
    pub price: Money,
    pub quantity: i64,
}

impl AllocationItem {
    #[inline]
    pub fn line_total(&self) -> Money {
        self.price.multiply_quantity(self.quantity)
    }
}

impl From<&Item> for AllocationItem {
    fn from(item: &Item) -> Self {
        AllocationItem {
            id: item.id,
            price: item.price(),
            quantity: item.quantity,
        }
    }
}

/// The slice of a [`Participant`] the allocation reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationParticipant {
    pub id: ParticipantId,
    pub name: String,
    pub share_of_common_costs: Money,
}

impl From<&Participant> for AllocationParticipant {
    fn from(participant: &Participant) -> Self {
        AllocationParticipant {
            id: participant.id,
            name: participant.name.clone(),
            share_of_common_costs: participant.share_of_common_costs(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
