// handlers/protected/find/find_post.rs - POST /api/find/documents handler

use axum::extract::{rejection::JsonRejection, Extension, Json, State};

use crate::access::Requester;
use crate::app::AppState;
use crate::database::models::Document;
use crate::handlers::json_body;
use crate::middleware::{ApiResponse, ApiResult};
use crate::query::{DocumentSearch, Paged};

/// POST /api/find/documents - Filtered, paginated document search
///
/// Every field is optional; active filters combine with AND:
/// ```json
/// {
///   "q": "anggaran",
///   "opd_id": 2,
///   "document_type": "pdf",
///   "date_from": "2024-01-01T00:00:00Z",
///   "date_to": "2024-12-31T23:59:59Z",
///   "tags": "keuangan",
///   "include_private": true,
///   "page": 1,
///   "limit": 20
/// }
/// ```
///
/// Results are limited to public documents unless `include_private` is set, in which case the
/// caller's own unit (or everything, for an admin) is added.
pub async fn find_documents(
    State(state): State<AppState>,
    Extension(requester): Extension<Requester>,
    payload: Result<Json<DocumentSearch>, JsonRejection>,
) -> ApiResult<Paged<Document>> {
    let search = json_body(payload)?;
    let page = state.documents().search_documents(requester.user_id, &search).await?;
    Ok(ApiResponse::success(page))
}
