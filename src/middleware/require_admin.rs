use axum::{extract::Request, middleware::Next, response::Response};

use crate::access::Requester;
use crate::error::ApiError;

/// Gate for the administrative tier. Runs after user validation.
pub async fn require_admin_middleware(request: Request, next: Next) -> Result<Response, ApiError> {
    let requester = request
        .extensions()
        .get::<Requester>()
        .ok_or_else(|| ApiError::unauthorized("User validation required before admin check"))?;

    if !requester.role.is_admin() {
        tracing::warn!("User {} ({}) denied admin route", requester.user_id, requester.role);
        return Err(ApiError::forbidden("Administrator access required"));
    }

    Ok(next.run(request).await)
}
