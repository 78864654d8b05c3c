use axum::{Json, Router, extract::State, routing::post};
use serde_json::{Value, json};
use services::runs::CallbackPayload;

use crate::AppState;

/// Completion callback sent by the agent process from inside its execution
/// environment. Always acknowledged with 200 `{"success": true}` — a non-2xx
/// here would make the agent retry-storm; problems are logged instead.
pub async fn runner_webhook(
    State(state): State<AppState>,
    Json(payload): Json<CallbackPayload>,
) -> Json<Value> {
    match state.runs().handle_callback(&payload).await {
        Ok(outcome) => {
            tracing::debug!(run_id = %payload.id, "callback handled: {outcome:?}");
        }
        Err(err) => {
            tracing::error!(run_id = %payload.id, "failed to process completion callback: {err}");
        }
    }

    Json(json!({ "success": true }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/runner/webhook", post(runner_webhook))
}
