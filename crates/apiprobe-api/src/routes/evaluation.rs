use axum::extract::{Path, State};
use axum::Json;

use apiprobe_core::EvaluationRun;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub async fn get_evaluation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<EvaluationRun>> {
    let run = state
        .store
        .get_run(&id)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    match run {
        Some(run) => Ok(Json(run)),
        None => Err(ApiError::NotFound),
    }
}
