use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;

use super::parse_id;
use crate::dto::{ItemResponse, UpdateItemRequest};
use crate::error::ApiResult;
use crate::AppState;

/// Partial correction of an extracted line.
pub async fn update_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateItemRequest>, JsonRejection>,
) -> ApiResult<Json<ItemResponse>> {
    let item_id = parse_id(&id, "item")?;
    let Json(req) = payload?;
    let item = state.editor.update_item(item_id, req.into_update()?).await?;
    Ok(Json(item.into()))
}
