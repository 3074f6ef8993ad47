//! # splitbill-core: Pure Business Logic for SplitBill
//!
//! This crate is the **heart** of SplitBill. It decides who owes what for a
//! shared receipt, as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        SplitBill Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    HTTP API (apps/api)                          │   │
//! │  │    create bill, add participant, assign item, summary          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ splitbill-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌────────────┐  ┌───────────┐ │   │
//! │  │   │   types   │  │  money /  │  │ allocation │  │  editor   │ │   │
//! │  │   │   Bill    │  │   share   │  │ calculator │  │  (store   │ │   │
//! │  │   │   Item    │  │  (exact)  │  │            │  │  adapter) │ │   │
//! │  │   └───────────┘  └───────────┘  └────────────┘  └─────┬─────┘ │   │
//! │  │                                                        │       │   │
//! │  │                                          BillStore trait        │   │
//! │  └────────────────────────────────────────────────────────┼───────┘   │
//! │                                                           │            │
//! │  ┌────────────────────────────────────────────────────────▼───────┐   │
//! │  │                  splitbill-db (Database Layer)                 │   │
//! │  │              SQLite queries, migrations, repositories          │   │
//! │  └────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Bill, Item, Participant, ItemAssignment)
//! - [`money`] - Money type with integer cents
//! - [`share`] - Exact rational amounts used inside the allocation
//! - [`allocation`] - The Allocation Calculator
//! - [`store`] - Repository trait and the in-memory store
//! - [`editor`] - Store Adapter: validated mutations over a [`store::BillStore`]
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Recompute from snapshot**: totals are never stored, always recalculated
//! 2. **Integer Money**: stored amounts are cents (i64)
//! 3. **Exact Shares**: splitting never rounds; rounding happens at presentation
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use splitbill_core::allocation::allocate_parts;
//! use splitbill_core::money::Money;
//! use splitbill_core::types::{AllocationItem, AllocationParticipant};
//!
//! let items = [AllocationItem { id: 1, price: Money::from_cents(3000), quantity: 1 }];
//! let people = [
//!     AllocationParticipant { id: 1, name: "Ana".into(), share_of_common_costs: Money::zero() },
//!     AllocationParticipant { id: 2, name: "Ben".into(), share_of_common_costs: Money::zero() },
//! ];
//! let edges = [(1, 1), (1, 2)];
//!
//! let allocation = allocate_parts(&items, &people, &edges, Money::zero(), Money::zero());
//! assert_eq!(allocation.participants[0].item_total.round_to_money().cents(), 1500);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod allocation;
pub mod editor;
pub mod error;
pub mod money;
pub mod share;
pub mod store;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use allocation::{allocate, Allocation, BillSummary, ParticipantAllocation};
pub use editor::BillEditor;
pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::Money;
pub use share::Share;
pub use store::{BillStore, MemoryBillStore};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length of bill, item and participant names.
pub const MAX_NAME_LENGTH: usize = 255;

/// Largest single amount (price, tax, tip, common-cost share) in cents.
///
/// ## Business Reason
/// $1,000,000 covers any restaurant receipt. Together with the other limits
/// it keeps every total well inside `i64` cents and every exact share
/// inside `i128`.
pub const MAX_AMOUNT_CENTS: i64 = 100_000_000;

/// Maximum quantity of one receipt line.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum number of items one extraction may ingest.
pub const MAX_BILL_ITEMS: usize = 100;

/// Maximum number of participants on one bill.
///
/// Shares are split exactly, so a participant's item total carries a
/// denominator up to lcm(1..=n) of the sharer counts; this bound keeps it
/// small.
pub const MAX_PARTICIPANTS: usize = 20;

/// Payment status given to a newly added participant.
pub const DEFAULT_PAYMENT_STATUS: &str = "unpaid";

/// Marker the extraction workflow puts on its direct payloads.
pub const EXTRACTION_PAYLOAD_CODE: &str = "API_SPLITBILL_LLMOCR";
