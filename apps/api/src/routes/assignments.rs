use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use splitbill_core::ItemAssignment;

use super::parse_bill_id;
use crate::dto::{AssignmentRequest, MessageResponse};
use crate::error::ApiResult;
use crate::AppState;

pub async fn list(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<ItemAssignment>>> {
    Ok(Json(state.editor.assignments(parse_bill_id(&id)?).await?))
}

pub async fn assign(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<AssignmentRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ItemAssignment>)> {
    let bill_id = parse_bill_id(&id)?;
    let Json(req) = payload?;
    let assignment = state
        .editor
        .add_assignment(bill_id, req.item_id, req.participant_id)
        .await?;
    Ok((StatusCode::CREATED, Json(assignment)))
}

pub async fn unassign(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<AssignmentRequest>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let bill_id = parse_bill_id(&id)?;
    let Json(req) = payload?;
    state
        .editor
        .remove_assignment(bill_id, req.item_id, req.participant_id)
        .await?;
    Ok(Json(MessageResponse::new("Item assignment removed successfully")))
}
