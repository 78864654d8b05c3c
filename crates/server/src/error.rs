use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use services::runs::RunServiceError;
use thiserror::Error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Run not found")]
    RunNotFound,
    #[error(transparent)]
    RunService(#[from] RunServiceError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::RunNotFound => StatusCode::NOT_FOUND,
            ApiError::RunService(RunServiceError::QuotaExceeded) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::RunService(RunServiceError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::RunService(_) | ApiError::Database(_) => {
                tracing::error!("internal error serving request: {self}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let message = match status {
            StatusCode::INTERNAL_SERVER_ERROR => "Internal server error".to_string(),
            _ => self.to_string(),
        };

        (status, Json(ApiResponse::<()>::error(&message))).into_response()
    }
}
