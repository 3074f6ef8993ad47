//! Bill lifecycle and the allocation summary.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use super::parse_bill_id;
use crate::dto::{BillResponse, CreateBillRequest, StatusResponse, SummaryResponse, UpdateBillRequest};
use crate::error::ApiResult;
use crate::AppState;

pub async fn create_bill(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateBillRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<BillResponse>)> {
    let Json(req) = payload?;
    let bill = state.editor.create_bill(req.into_new_bill()?).await?;
    Ok((StatusCode::CREATED, Json(bill.into())))
}

pub async fn get_bill(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<BillResponse>> {
    let bill_id = parse_bill_id(&id)?;
    let snapshot = state.editor.snapshot(bill_id).await?;
    Ok(Json(BillResponse::with_children(
        snapshot.bill,
        snapshot.items,
        snapshot.participants,
    )))
}

pub async fn update_bill(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateBillRequest>, JsonRejection>,
) -> ApiResult<Json<BillResponse>> {
    let bill_id = parse_bill_id(&id)?;
    let Json(req) = payload?;
    let bill = state.editor.update_bill(bill_id, req.into_update()?).await?;
    Ok(Json(bill.into()))
}

/// Polled by the client while extraction runs.
pub async fn get_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<StatusResponse>> {
    let bill = state.editor.bill(parse_bill_id(&id)?).await?;
    Ok(Json(StatusResponse::from(&bill)))
}

/// Recomputed from a fresh snapshot on every request.
pub async fn get_summary(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<SummaryResponse>> {
    let bill_id = parse_bill_id(&id)?;
    let (bill, allocation) = state.editor.bill_summary(bill_id).await?;
    Ok(Json(SummaryResponse::new(&bill, allocation.summary())))
}
