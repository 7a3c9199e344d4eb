use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use tracing::info;

use apiprobe_core::{Evaluator, SpecSource, TracingSink};

use crate::dto::requests::EvaluateRequest;
use crate::dto::responses::EvaluateResponse;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub async fn evaluate(
    State(state): State<AppState>,
    Json(req): Json<EvaluateRequest>,
) -> ApiResult<Json<EvaluateResponse>> {
    let source = match (req.url, req.spec) {
        (Some(_), Some(_)) => {
            return Err(ApiError::BadRequest(
                "provide either url or spec, not both".to_string(),
            ))
        }
        (Some(url), None) => {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ApiError::BadRequest(
                    "url must be an absolute http(s) URL".to_string(),
                ));
            }
            SpecSource::Url(url)
        }
        (None, Some(spec)) => SpecSource::Inline(spec),
        (None, None) => {
            return Err(ApiError::BadRequest(
                "either url or spec must be provided".to_string(),
            ))
        }
    };

    let evaluator = Evaluator::new(state.cfg.evaluator.to_eval_config())
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .with_sink(Arc::new(TracingSink));

    let run = evaluator.evaluate(source).await?;

    state
        .store
        .save_run(&run)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    info!(
        id = %run.id,
        success_rate = run.success_rate,
        total = run.total_endpoints,
        "evaluation run persisted"
    );

    Ok(Json(EvaluateResponse::from_run(run)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use serde_json::json;

    fn state() -> AppState {
        let store =
            apiprobe_store::Store::open(apiprobe_store::StoreConfig::in_memory()).unwrap();
        AppState::new(AppConfig::default(), store).unwrap()
    }

    #[tokio::test]
    async fn both_sources_are_rejected() {
        let req = EvaluateRequest {
            url: Some("http://localhost/openapi.json".to_string()),
            spec: Some(json!({ "paths": {} })),
        };
        let err = evaluate(State(state()), Json(req)).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn missing_source_is_rejected() {
        let req = EvaluateRequest {
            url: None,
            spec: None,
        };
        let err = evaluate(State(state()), Json(req)).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn relative_url_is_rejected() {
        let req = EvaluateRequest {
            url: Some("openapi.json".to_string()),
            spec: None,
        };
        let err = evaluate(State(state()), Json(req)).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
