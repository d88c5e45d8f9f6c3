use std::sync::Arc;
use tracing::{info, warn};

use crate::database::models::User;
use crate::database::ArchiveStore;
use crate::services::credentials::verify_password;
use crate::services::error::ServiceError;

/// Credential checks. Token minting happens at the HTTP boundary.
pub struct AuthService {
    store: Arc<dyn ArchiveStore>,
}

impl AuthService {
    pub fn new(store: Arc<dyn ArchiveStore>) -> Self {
        Self { store }
    }

    /// Unknown user, inactive user and wrong password all fail the same way.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, ServiceError> {
        let user = match self.store.find_user_by_username(username.trim()).await? {
            Some(user) => user,
            None => {
                warn!("Login failed for unknown user {}", username);
                return Err(ServiceError::InvalidCredentials);
            }
        };
        if !user.is_active {
            warn!("Login refused for inactive user {}", user.username);
            return Err(ServiceError::InvalidCredentials);
        }
        if !verify_password(password, &user.password_hash) {
            warn!("Login failed for user {}: wrong password", user.username);
            return Err(ServiceError::InvalidCredentials);
        }
        info!("User {} signed in", user.username);
        Ok(user)
    }
}
