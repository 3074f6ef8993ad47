//! # splitbill-api
//!
//! HTTP surface for SplitBill: bills, extraction callbacks, participants,
//! item assignments and the allocation summary.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Client / extraction workflow                                          │
//! │       │  JSON, amounts in major units                                  │
//! │       ▼                                                                 │
//! │  routes::*  ── dto (major units ⇄ Money) ── error (CoreError → HTTP)   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BillEditor<SqliteBillStore>   validation + referential checks         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  splitbill-db                  transactions, constraints               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config::ApiConfig`]. Environment variables:
//! - `SPLITBILL_CONFIG` - path to the TOML config file
//! - `SPLITBILL_HOST` / `SPLITBILL_PORT` - listener address (default `0.0.0.0:8080`)
//! - `SPLITBILL_DATABASE_PATH` - SQLite file (default `splitbill.db`)
//! - `SPLITBILL_DB_MAX_CONNECTIONS` - pool size (default 5)
//! - `SPLITBILL_LOG` - tracing filter (default `info`)

pub mod config;
pub mod dto;
pub mod error;
pub mod routes;

use std::sync::Arc;

use splitbill_core::BillEditor;
use splitbill_db::{Database, SqliteBillStore};

// Re-exports
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;

/// Shared application state.
pub struct AppState {
    pub db: Database,
    pub editor: BillEditor<SqliteBillStore>,
}

impl AppState {
    pub fn new(db: Database) -> Arc<Self> {
        Arc::new(AppState {
            editor: BillEditor::new(db.store()),
            db,
        })
    }
}
