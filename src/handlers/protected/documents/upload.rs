// handlers/protected/documents/upload.rs - POST /api/documents handler

use axum::extract::{rejection::JsonRejection, Extension, Json, State};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::access::{can_upload, can_upload_to, Requester};
use crate::app::AppState;
use crate::database::models::{Document, DocumentType};
use crate::error::ApiError;
use crate::handlers::json_body;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::CreateDocument;

/// Metadata for a file the client already placed in storage.
#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub file_path: String,
    pub file_name: String,
    pub file_size: i64,
    pub mime_type: String,
    #[serde(default)]
    pub document_type: Option<DocumentType>,
    /// Defaults to the uploader's own unit.
    #[serde(default)]
    pub opd_id: Option<i64>,
    #[serde(default)]
    pub created_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub is_public: bool,
}

/// POST /api/documents - Register an uploaded document
///
/// ```json
/// {
///   "title": "Laporan Keuangan 2024",
///   "file_path": "uploads/1718000000-laporan.pdf",
///   "file_name": "laporan.pdf",
///   "file_size": 482113,
///   "mime_type": "application/pdf",
///   "opd_id": 2,
///   "tags": "keuangan,2024",
///   "is_public": false
/// }
/// ```
///
/// Admins may target any unit, a pengelola only their own, staf never. The uploader is always
/// the authenticated user.
pub async fn upload(
    State(state): State<AppState>,
    Extension(requester): Extension<Requester>,
    payload: Result<Json<UploadRequest>, JsonRejection>,
) -> ApiResult<Document> {
    let request = json_body(payload)?;

    if !can_upload(&requester) {
        tracing::warn!("User {} ({}) denied upload", requester.user_id, requester.role);
        return Err(ApiError::forbidden("You may not upload documents"));
    }

    let opd_id = request
        .opd_id
        .or(requester.scoped_opd())
        .ok_or_else(|| ApiError::validation_error("opd_id is required", None))?;

    if !can_upload_to(&requester, opd_id) {
        tracing::warn!("User {} ({}) denied upload to unit {}", requester.user_id, requester.role, opd_id);
        return Err(ApiError::forbidden("You may not upload documents to this unit"));
    }

    let document = state
        .documents()
        .create_document(CreateDocument {
            title: request.title,
            description: request.description,
            file_path: request.file_path,
            file_name: request.file_name,
            file_size: request.file_size,
            mime_type: request.mime_type,
            document_type: request.document_type,
            opd_id,
            uploaded_by: requester.user_id,
            created_date: request.created_date,
            tags: request.tags,
            is_public: request.is_public,
        })
        .await?;

    Ok(ApiResponse::created(document))
}
