use axum::{Json, Router, routing::get};

use crate::AppState;

pub mod callback;
pub mod runs;

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/api", runs::router().merge(callback::router()))
}
