//! # Routes
//!
//! ```text
//! GET    /health
//! POST   /api/bills
//! GET    /api/bills/{id}                      bill + items + participants
//! PUT    /api/bills/{id}                      tax / tip
//! GET    /api/bills/{id}/status
//! GET    /api/bills/{id}/summary
//! POST   /api/bills/{id}/extraction           → processing
//! POST   /api/bills/{id}/extraction/failed    → failed
//! POST   /api/bills/{id}/process-data         → completed (or failed)
//! GET    /api/bills/{id}/participants
//! POST   /api/bills/{id}/participants
//! DELETE /api/bills/{id}/participants/{pid}
//! GET    /api/bills/{id}/item-assignments
//! POST   /api/bills/{id}/assign-items
//! DELETE /api/bills/{id}/assign-items
//! PUT    /api/items/{id}
//! ```

mod assignments;
mod bills;
mod extraction;
mod items;
mod participants;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde_json::json;

use splitbill_core::BillId;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Builds the application router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/bills", post(bills::create_bill))
        .route("/api/bills/{id}", get(bills::get_bill).put(bills::update_bill))
        .route("/api/bills/{id}/status", get(bills::get_status))
        .route("/api/bills/{id}/summary", get(bills::get_summary))
        .route("/api/bills/{id}/extraction", post(extraction::begin))
        .route("/api/bills/{id}/extraction/failed", post(extraction::fail))
        .route("/api/bills/{id}/process-data", post(extraction::process_data))
        .route(
            "/api/bills/{id}/participants",
            get(participants::list).post(participants::add),
        )
        .route(
            "/api/bills/{id}/participants/{participant_id}",
            delete(participants::remove),
        )
        .route("/api/bills/{id}/item-assignments", get(assignments::list))
        .route(
            "/api/bills/{id}/assign-items",
            post(assignments::assign).delete(assignments::unassign),
        )
        .route("/api/items/{id}", put(items::update_item))
        .with_state(state)
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if state.db.health_check().await {
        (StatusCode::OK, Json(json!({ "status": "ok" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unavailable" })),
        )
    }
}

fn parse_bill_id(raw: &str) -> ApiResult<BillId> {
    BillId::parse_str(raw).map_err(|_| ApiError::validation("Invalid bill ID"))
}

fn parse_id(raw: &str, what: &str) -> ApiResult<i64> {
    raw.parse()
        .map_err(|_| ApiError::validation(format!("Invalid {what} ID")))
}
