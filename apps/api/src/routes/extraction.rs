//! Callbacks from the external extraction workflow.
//!
//! ```text
//! POST /extraction         pending|failed|completed → processing
//! POST /process-data       processing → completed   (bad payload → failed, 400)
//! POST /extraction/failed  any → failed
//! ```

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::warn;

use splitbill_core::{BillStatus, CoreError};

use super::parse_bill_id;
use crate::dto::{
    parse_extraction_payload, ExtractionFailedRequest, ItemResponse, ProcessDataResponse,
    StatusResponse,
};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub async fn begin(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<(StatusCode, Json<StatusResponse>)> {
    let bill = state.editor.begin_extraction(parse_bill_id(&id)?).await?;
    Ok((StatusCode::ACCEPTED, Json(StatusResponse::from(&bill))))
}

pub async fn fail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<ExtractionFailedRequest>, JsonRejection>,
) -> ApiResult<Json<StatusResponse>> {
    let bill_id = parse_bill_id(&id)?;
    let Json(req) = payload?;

    match state.editor.fail_extraction(bill_id, req.reason).await {
        CoreError::ExtractionFailed { .. } => Ok(Json(StatusResponse {
            bill_id,
            status: BillStatus::Failed,
        })),
        other => Err(other.into()),
    }
}

pub async fn process_data(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<ProcessDataResponse>> {
    let bill_id = parse_bill_id(&id)?;

    let extracted = match parse_extraction_payload(&body) {
        Ok(extracted) => extracted,
        Err(reason) => {
            warn!(bill_id = %bill_id, reason = %reason, "Rejected extraction payload");
            return Err(match state.editor.fail_extraction(bill_id, reason.clone()).await {
                CoreError::ExtractionFailed { .. } => ApiError::validation(reason),
                other => other.into(),
            });
        }
    };

    let items = state.editor.complete_extraction(bill_id, &extracted).await?;

    Ok(Json(ProcessDataResponse {
        message: "Extracted data processed successfully".to_string(),
        items: items.into_iter().map(ItemResponse::from).collect(),
    }))
}
