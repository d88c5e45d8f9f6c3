use axum::extract::{rejection::JsonRejection, Json, Path, State};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::database::models::User;
use crate::handlers::json_body;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{CreateUser, UpdateUser};

/// GET /api/admin/users
pub async fn user_list(State(state): State<AppState>) -> ApiResult<Vec<User>> {
    Ok(ApiResponse::success(state.users().list().await?))
}

/// GET /api/admin/users/:id
pub async fn user_show(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<User> {
    Ok(ApiResponse::success(state.users().get(id).await?))
}

/// POST /api/admin/users
///
/// ```json
/// {
///   "username": "siti",
///   "email": "siti@bkpsdm.go.id",
///   "password": "rahasia123",
///   "full_name": "Siti Aminah",
///   "role": "staf",
///   "opd_id": 2
/// }
/// ```
pub async fn user_create(
    State(state): State<AppState>,
    payload: Result<Json<CreateUser>, JsonRejection>,
) -> ApiResult<User> {
    let input = json_body(payload)?;
    Ok(ApiResponse::created(state.users().create(input).await?))
}

/// PATCH /api/admin/users/:id - Partial update; `"opd_id": null` detaches the user from its unit
pub async fn user_update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<UpdateUser>, JsonRejection>,
) -> ApiResult<User> {
    let input = json_body(payload)?;
    Ok(ApiResponse::success(state.users().update(id, input).await?))
}

/// DELETE /api/admin/users/:id - Deactivates the account; the row is kept
pub async fn user_delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Value> {
    let deactivated = state.users().deactivate(id).await?;
    Ok(ApiResponse::success(json!({ "id": id, "deactivated": deactivated })))
}
