// handlers/protected/documents/record.rs - /api/documents/:id handlers

use axum::extract::{rejection::JsonRejection, Extension, Json, Path, State};
use serde_json::{json, Value};

use crate::access::{can_mutate, can_upload_to, Requester};
use crate::app::AppState;
use crate::database::models::Document;
use crate::database::DocumentChanges;
use crate::error::ApiError;
use crate::handlers::json_body;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::DownloadInfo;

use super::visible_document;

/// GET /api/documents/:id
pub async fn show(
    State(state): State<AppState>,
    Extension(requester): Extension<Requester>,
    Path(id): Path<i64>,
) -> ApiResult<Document> {
    Ok(ApiResponse::success(visible_document(&state, &requester, id).await?))
}

/// PATCH /api/documents/:id - Partial metadata update
///
/// Only fields present in the body change; `null` clears a nullable field:
/// ```json
/// { "description": "Revisi kedua", "tags": null, "is_public": true }
/// ```
///
/// Moving a document to another unit also requires upload rights on the target unit.
pub async fn update(
    State(state): State<AppState>,
    Extension(requester): Extension<Requester>,
    Path(id): Path<i64>,
    payload: Result<Json<DocumentChanges>, JsonRejection>,
) -> ApiResult<Document> {
    let changes = json_body(payload)?;
    let document = visible_document(&state, &requester, id).await?;

    if !can_mutate(&requester, &document) {
        tracing::warn!("User {} denied edit of document {}", requester.user_id, id);
        return Err(ApiError::forbidden("You may not edit this document"));
    }
    if let Some(target) = changes.opd_id {
        if target != document.opd_id && !can_upload_to(&requester, target) {
            return Err(ApiError::forbidden("You may not move documents to that unit"));
        }
    }

    Ok(ApiResponse::success(state.documents().update_document(id, changes).await?))
}

/// DELETE /api/documents/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(requester): Extension<Requester>,
    Path(id): Path<i64>,
) -> ApiResult<Value> {
    let document = visible_document(&state, &requester, id).await?;

    if !can_mutate(&requester, &document) {
        tracing::warn!("User {} denied delete of document {}", requester.user_id, id);
        return Err(ApiError::forbidden("You may not delete this document"));
    }

    let deleted = state.documents().delete_document(id).await?;
    Ok(ApiResponse::success(json!({ "id": id, "deleted": deleted })))
}

/// GET /api/documents/:id/download - Storage reference for a readable document
pub async fn download(
    State(state): State<AppState>,
    Extension(requester): Extension<Requester>,
    Path(id): Path<i64>,
) -> ApiResult<DownloadInfo> {
    let document = visible_document(&state, &requester, id).await?;
    Ok(ApiResponse::success(DownloadInfo::from(&document)))
}
