use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

mod evaluate;
mod evaluation;
mod health;
mod history;

pub fn router() -> Router<AppState> {
    let api = Router::new()
        .route("/evaluate", post(evaluate::evaluate))
        .route("/history", get(history::history))
        .route("/evaluation/:id", get(evaluation::get_evaluation));

    Router::new()
        .route("/health", get(health::health))
        .nest("/api", api)
}
