use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use super::{parse_bill_id, parse_id};
use crate::dto::{MessageResponse, ParticipantRequest, ParticipantResponse};
use crate::error::ApiResult;
use crate::AppState;

pub async fn list(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<ParticipantResponse>>> {
    let participants = state.editor.participants(parse_bill_id(&id)?).await?;
    Ok(Json(
        participants
            .into_iter()
            .map(ParticipantResponse::from)
            .collect(),
    ))
}

pub async fn add(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<ParticipantRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ParticipantResponse>)> {
    let bill_id = parse_bill_id(&id)?;
    let Json(req) = payload?;
    let participant = state
        .editor
        .add_participant(bill_id, req.into_new_participant()?)
        .await?;
    Ok((StatusCode::CREATED, Json(participant.into())))
}

/// Removes the participant together with their assignments.
pub async fn remove(
    State(state): State<Arc<AppState>>,
    Path((id, participant_id)): Path<(String, String)>,
) -> ApiResult<Json<MessageResponse>> {
    let bill_id = parse_bill_id(&id)?;
    let participant_id = parse_id(&participant_id, "participant")?;
    state
        .editor
        .remove_participant(bill_id, participant_id)
        .await?;
    Ok(Json(MessageResponse::new("Participant deleted successfully")))
}
