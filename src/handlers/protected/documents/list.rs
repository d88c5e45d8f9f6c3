// handlers/protected/documents/list.rs - GET /api/documents handler

use axum::extract::{rejection::QueryRejection, Extension, Query, State};
use serde::Deserialize;

use crate::access::Requester;
use crate::app::AppState;
use crate::database::models::Document;
use crate::handlers::query_params;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub include_private: bool,
}

/// GET /api/documents[?include_private=true] - Every readable document, newest first
///
/// Without `include_private` only public documents are returned, for every role.
pub async fn list(
    State(state): State<AppState>,
    Extension(requester): Extension<Requester>,
    params: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Vec<Document>> {
    let params = query_params(params)?;
    let documents = state
        .documents()
        .list_documents(requester.user_id, params.include_private)
        .await?;
    Ok(ApiResponse::success(documents))
}
