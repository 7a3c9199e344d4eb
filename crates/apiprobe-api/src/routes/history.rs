use axum::extract::State;
use axum::Json;

use apiprobe_core::RunSummary;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// How many runs the history listing returns.
const HISTORY_LIMIT: usize = 10;

pub async fn history(State(state): State<AppState>) -> ApiResult<Json<Vec<RunSummary>>> {
    let summaries = state
        .store
        .recent_runs(HISTORY_LIMIT)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(summaries))
}
