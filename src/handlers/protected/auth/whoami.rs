// handlers/protected/auth/whoami.rs - GET /api/auth/whoami handler

use axum::extract::Extension;

use crate::database::models::User;
use crate::middleware::{ApiResponse, ApiResult, ValidatedUser};

/// GET /api/auth/whoami - The stored account behind the presented token
pub async fn whoami(Extension(ValidatedUser(user)): Extension<ValidatedUser>) -> ApiResult<User> {
    Ok(ApiResponse::success(user))
}
