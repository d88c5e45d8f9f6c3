use axum::extract::{Extension, State};

use crate::access::Requester;
use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::DocumentStats;

/// GET /api/documents/stats - Dashboard counts over the requester's readable documents
pub async fn stats(State(state): State<AppState>, Extension(requester): Extension<Requester>) -> ApiResult<DocumentStats> {
    Ok(ApiResponse::success(state.documents().stats(requester.user_id).await?))
}
