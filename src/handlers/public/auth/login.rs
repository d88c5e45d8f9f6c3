// handlers/public/auth/login.rs - POST /auth/login handler

use axum::extract::{rejection::JsonRejection, Json, State};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::auth::{generate_jwt, Claims};
use crate::database::models::User;
use crate::handlers::json_body;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
    pub expires_in: u64,
}

/// POST /auth/login - Authenticate with username and password and receive a JWT
///
/// Expected Input:
/// ```json
/// { "username": "budi", "password": "rahasia123" }
/// ```
///
/// Expected Output:
/// ```json
/// {
///   "success": true,
///   "data": {
///     "token": "eyJhbGciOiJIUzI1NiI...",
///     "user": { "id": 3, "username": "budi", "role": "pengelola", "opd_id": 1, ... },
///     "expires_in": 86400
///   }
/// }
/// ```
///
/// Unknown user, inactive account and wrong password all answer 401 with the same message.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<LoginResponse> {
    let request = json_body(payload)?;
    let user = state.auth().login(&request.username, &request.password).await?;

    let expiry_hours = state.config.security.jwt_expiry_hours;
    let token = generate_jwt(&Claims::for_user(&user, expiry_hours), &state.config.security.jwt_secret)?;

    Ok(ApiResponse::success(LoginResponse {
        token,
        user,
        expires_in: expiry_hours * 3600,
    }))
}
