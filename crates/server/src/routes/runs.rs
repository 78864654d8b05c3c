use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::run::Run;
use serde::{Deserialize, Serialize};
use services::runs::CreateRunRequest;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::AuthUser};

#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Pagination {
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RunListResponse {
    pub runs: Vec<Run>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RunLogsResponse {
    pub logs: String,
    pub is_running: bool,
    pub run: Run,
}

pub async fn create_run(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateRunRequest>,
) -> Result<ResponseJson<ApiResponse<Run>>, ApiError> {
    let run = state.runs().create_run(&payload, &user_id).await?;
    Ok(ResponseJson(ApiResponse::success(run.redacted())))
}

pub async fn list_runs(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<PaginationQuery>,
) -> Result<ResponseJson<ApiResponse<RunListResponse>>, ApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let page_size = query.page_size.unwrap_or(10).clamp(1, 100);
    let offset = (page - 1) * page_size;

    let pool = &state.runs().db().pool;
    let runs = Run::fetch_page_for_user(pool, &user_id, page_size, offset).await?;
    let total = Run::count_for_user(pool, &user_id).await?;

    Ok(ResponseJson(ApiResponse::success(RunListResponse {
        runs: runs.iter().map(Run::redacted).collect(),
        pagination: Pagination {
            total,
            page,
            page_size,
            total_pages: (total as u64).div_ceil(page_size as u64) as i64,
        },
    })))
}

pub async fn get_run(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Run>>, ApiError> {
    let run = Run::find_by_id_for_user(&state.runs().db().pool, id, &user_id)
        .await?
        .ok_or(ApiError::RunNotFound)?;
    Ok(ResponseJson(ApiResponse::success(run.redacted())))
}

/// Live logs while the execution environment is running, falling back to
/// the persisted output once it is gone.
pub async fn get_run_logs(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<RunLogsResponse>>, ApiError> {
    let run = Run::find_by_id_for_user(&state.runs().db().pool, id, &user_id)
        .await?
        .ok_or(ApiError::RunNotFound)?;

    let (logs, is_running) = state.runs().logs_for_run(&run).await;

    Ok(ResponseJson(ApiResponse::success(RunLogsResponse {
        logs,
        is_running,
        run: run.redacted(),
    })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/runs", get(list_runs).post(create_run))
        .route("/runs/{id}", get(get_run))
        .route("/runs/{id}/logs", get(get_run_logs))
        .route("/runs/create", post(create_run))
}
