//! # Repository Module
//!
//! Database repository implementations for SplitBill.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  SqliteBillStore (BillStore impl)                                      │
//! │       │                                                                 │
//! │       │  db.assignments().insert(item_id, participant_id)              │
//! │       ▼                                                                 │
//! │  ┌──────────────┐ ┌──────────────┐ ┌────────────────┐ ┌─────────────┐ │
//! │  │BillRepository│ │ItemRepository│ │ParticipantRepo │ │AssignmentRep│ │
//! │  │ snapshot     │ │ ingest (tx)  │ │ cascade (tx)   │ │ same-bill   │ │
//! │  └──────────────┘ └──────────────┘ └────────────────┘ └─────────────┘ │
//! │       │                                                                 │
//! │       │  SQL (runtime-checked, FromRow records)                        │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each repository keeps its SQL as free functions generic over
//! [`SqliteExecutor`](sqlx::sqlite::SqliteExecutor), so the same query runs
//! against the pool or inside another repository's transaction.
//!
//! ## Available Repositories
//!
//! - [`BillRepository`](bill::BillRepository) - Bills, status, snapshots
//! - [`ItemRepository`](item::ItemRepository) - Items and extraction ingest
//! - [`ParticipantRepository`](participant::ParticipantRepository) - Participants
//! - [`AssignmentRepository`](assignment::AssignmentRepository) - Item ↔ participant edges

pub mod assignment;
pub mod bill;
pub mod item;
pub mod participant;

use splitbill_core::BillId;

use crate::error::{DbError, DbResult};

/// Bill ids are stored as TEXT.
pub(crate) fn parse_bill_id(raw: &str) -> DbResult<BillId> {
    BillId::parse_str(raw).map_err(|e| DbError::Corrupt {
        field: "bill_id".to_string(),
        message: e.to_string(),
    })
}
