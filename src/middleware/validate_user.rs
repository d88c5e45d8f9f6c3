use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::access::Requester;
use crate::app::AppState;
use crate::database::models::User;
use crate::error::ApiError;

use super::auth::AuthUser;

/// The stored account behind the token, reloaded on every request.
#[derive(Clone, Debug)]
pub struct ValidatedUser(pub User);

/// Resolve the JWT subject against the users table.
///
/// Role and unit are taken from the stored row, not the token, so changes apply without re-login.
pub async fn validate_user_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("JWT authentication required before user validation"))?;

    let user = state.store.find_user(auth_user.user_id).await?.ok_or_else(|| {
        tracing::warn!("User validation failed: user {} ({}) no longer exists", auth_user.username, auth_user.user_id);
        ApiError::unauthorized("User no longer exists")
    })?;

    if !user.is_active {
        tracing::warn!("User validation failed: user {} is inactive", user.username);
        return Err(ApiError::forbidden(format!("User '{}' is not active", user.username)));
    }

    if user.role != auth_user.role || user.opd_id != auth_user.unit_id {
        tracing::debug!("Token for {} carries stale role or unit; using stored values", user.username);
    }

    let requester = Requester::from(&user);
    tracing::debug!("User validation successful: {} as {}", user.username, user.role);

    request.extensions_mut().insert(requester);
    request.extensions_mut().insert(ValidatedUser(user));

    Ok(next.run(request).await)
}
