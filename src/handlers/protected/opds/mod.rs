use axum::extract::{Path, State};

use crate::app::AppState;
use crate::database::models::Opd;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /api/opds - All organisational units
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Opd>> {
    Ok(ApiResponse::success(state.opds().list().await?))
}

/// GET /api/opds/:id
pub async fn show(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Opd> {
    Ok(ApiResponse::success(state.opds().get(id).await?))
}
