use std::sync::Arc;

use axum::Router;
use services::runs::RunService;

pub mod error;
pub mod middleware;
pub mod routes;

#[derive(Clone)]
pub struct AppState {
    runs: Arc<RunService>,
}

impl AppState {
    pub fn new(runs: Arc<RunService>) -> Self {
        Self { runs }
    }

    pub fn runs(&self) -> &RunService {
        &self.runs
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::router())
        .with_state(state)
}
