use axum::extract::{rejection::JsonRejection, Json, Path, State};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::database::models::Opd;
use crate::database::{NewOpd, OpdChanges};
use crate::handlers::json_body;
use crate::middleware::{ApiResponse, ApiResult};

/// POST /api/admin/opds
///
/// ```json
/// { "name": "Dinas Pendidikan", "code": "DISDIK", "description": "Urusan pendidikan" }
/// ```
///
/// A duplicate `code` answers 409 `CONFLICT`.
pub async fn opd_create(
    State(state): State<AppState>,
    payload: Result<Json<NewOpd>, JsonRejection>,
) -> ApiResult<Opd> {
    let input = json_body(payload)?;
    Ok(ApiResponse::created(state.opds().create(input).await?))
}

/// PATCH /api/admin/opds/:id
pub async fn opd_update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<OpdChanges>, JsonRejection>,
) -> ApiResult<Opd> {
    let changes = json_body(payload)?;
    Ok(ApiResponse::success(state.opds().update(id, changes).await?))
}

/// DELETE /api/admin/opds/:id
///
/// A unit that users or documents still reference answers 409 `BLOCKED` with
/// `"reason": "has users"` or `"reason": "has documents"`.
pub async fn opd_delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Value> {
    let deleted = state.opds().delete(id).await?;
    Ok(ApiResponse::success(json!({ "id": id, "deleted": deleted })))
}

/// GET /api/admin/opds/:id/can-delete - Same checks as DELETE without removing anything
pub async fn opd_can_delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Value> {
    state.opds().can_delete(id).await?;
    Ok(ApiResponse::success(json!({ "id": id, "can_delete": true })))
}
