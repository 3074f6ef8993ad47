//! # splitbill-db: Database Layer for SplitBill
//!
//! SQLite persistence for bills, items, participants and assignments,
//! exposed to the rest of the system as a [`BillStore`](splitbill_core::BillStore).
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        SplitBill Data Flow                              │
//! │                                                                         │
//! │  HTTP handler (POST /assign-items)                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BillEditor<SqliteBillStore>   (splitbill-core)                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  splitbill-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ BillRepo      │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ ItemRepo      │    │ 001_initial  │  │   │
//! │  │   │ WAL, FKs on   │    │ ParticipantRe │    │  _schema.sql │  │   │
//! │  │   │               │    │ AssignmentRep │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │            ▲                                                   │   │
//! │  │            └──── SqliteBillStore (store.rs)                    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (or :memory: in tests)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Per-table repositories
//! - [`store`] - The `BillStore` implementation
//!
//! ## Usage
//!
//! ```rust,ignore
//! use splitbill_core::BillEditor;
//! use splitbill_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("splitbill.db")).await?;
//! let editor = BillEditor::new(db.store());
//! let summary = editor.summary(bill_id).await?.summary();
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use store::SqliteBillStore;

pub use repository::assignment::AssignmentRepository;
pub use repository::bill::BillRepository;
pub use repository::item::ItemRepository;
pub use repository::participant::ParticipantRepository;
