use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::access::Role;
use crate::config::AppConfig;
use crate::database::models::User;
use crate::database::{ArchiveStore, NewUser, UserChanges};
use crate::services::credentials::hash_password;
use crate::services::error::ServiceError;
use crate::services::opd_service::required;
use crate::types::double_option;

const MIN_USERNAME_LEN: usize = 3;
const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: Role,
    #[serde(default)]
    pub opd_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUser {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default, deserialize_with = "double_option")]
    pub opd_id: Option<Option<i64>>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

pub struct UserService {
    store: Arc<dyn ArchiveStore>,
    hash_cost: u32,
}

impl UserService {
    pub fn new(store: Arc<dyn ArchiveStore>, config: &AppConfig) -> Self {
        Self {
            store,
            hash_cost: config.security.password_hash_cost,
        }
    }

    pub async fn list(&self) -> Result<Vec<User>, ServiceError> {
        Ok(self.store.list_users().await?)
    }

    pub async fn get(&self, id: i64) -> Result<User, ServiceError> {
        self.store
            .find_user(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("user", id))
    }

    pub async fn create(&self, input: CreateUser) -> Result<User, ServiceError> {
        let username = validate_username(&input.username)?;
        let email = validate_email(&input.email)?;
        validate_password(&input.password)?;
        let full_name = required("full_name", &input.full_name)?;
        // Admins are never bound to a unit
        let opd_id = if input.role.is_admin() { None } else { input.opd_id };

        self.ensure_opd(opd_id).await?;
        self.ensure_unique(Some(&username), Some(&email), None).await?;

        let user = self
            .store
            .insert_user(NewUser {
                username,
                email,
                password_hash: hash_password(&input.password, self.hash_cost)?,
                full_name,
                role: input.role,
                opd_id,
            })
            .await?;
        info!("Created {} user {} ({})", user.role, user.username, user.id);
        Ok(user)
    }

    pub async fn update(&self, id: i64, input: UpdateUser) -> Result<User, ServiceError> {
        self.get(id).await?;

        let username = input.username.as_deref().map(validate_username).transpose()?;
        let email = input.email.as_deref().map(validate_email).transpose()?;
        let full_name = input.full_name.as_deref().map(|n| required("full_name", n)).transpose()?;
        let password_hash = match input.password.as_deref() {
            Some(password) => {
                validate_password(password)?;
                Some(hash_password(password, self.hash_cost)?)
            }
            None => None,
        };
        let opd_id = match input.role {
            Some(Role::Admin) => Some(None),
            _ => input.opd_id,
        };

        if let Some(opd_id) = opd_id {
            self.ensure_opd(opd_id).await?;
        }
        self.ensure_unique(username.as_deref(), email.as_deref(), Some(id)).await?;

        let changes = UserChanges {
            username,
            email,
            password_hash,
            full_name,
            role: input.role,
            opd_id,
            is_active: input.is_active,
        };
        self.store
            .update_user(id, changes)
            .await?
            .ok_or_else(|| ServiceError::not_found("user", id))
    }

    /// Soft delete: the row stays, the account can no longer sign in.
    pub async fn deactivate(&self, id: i64) -> Result<bool, ServiceError> {
        self.get(id).await?;
        let changes = UserChanges { is_active: Some(false), ..Default::default() };
        self.store.update_user(id, changes).await?;
        info!("Deactivated user {}", id);
        Ok(true)
    }

    async fn ensure_opd(&self, opd_id: Option<i64>) -> Result<(), ServiceError> {
        if let Some(opd_id) = opd_id {
            if self.store.find_opd(opd_id).await?.is_none() {
                return Err(ServiceError::not_found("opd", opd_id));
            }
        }
        Ok(())
    }

    async fn ensure_unique(&self, username: Option<&str>, email: Option<&str>, except: Option<i64>) -> Result<(), ServiceError> {
        if let Some(username) = username {
            if let Some(other) = self.store.find_user_by_username(username).await? {
                if Some(other.id) != except {
                    return Err(ServiceError::Conflict(format!("username {}", username)));
                }
            }
        }
        if let Some(email) = email {
            if let Some(other) = self.store.find_user_by_email(email).await? {
                if Some(other.id) != except {
                    return Err(ServiceError::Conflict(format!("email {}", email)));
                }
            }
        }
        Ok(())
    }
}

fn validate_username(username: &str) -> Result<String, ServiceError> {
    let username = username.trim();
    if username.chars().count() < MIN_USERNAME_LEN {
        return Err(ServiceError::invalid(format!(
            "username must be at least {} characters",
            MIN_USERNAME_LEN
        )));
    }
    Ok(username.to_string())
}

fn validate_password(password: &str) -> Result<(), ServiceError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ServiceError::invalid(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// Shape check only: one `@`, non-empty local part, dotted domain, no whitespace.
fn validate_email(email: &str) -> Result<String, ServiceError> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
                && domain.split('.').count() >= 2
                && domain.split('.').all(|part| !part.is_empty())
        }
        None => false,
    };
    if !valid {
        return Err(ServiceError::invalid(format!("invalid email address: {}", email)));
    }
    Ok(email.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::credentials::verify_password;
    use crate::testing::{test_config, Seeded};

    fn input(username: &str, role: Role, opd_id: Option<i64>) -> CreateUser {
        CreateUser {
            username: username.to_string(),
            email: format!("{}@bkpsdm.go.id", username),
            password: "rahasia123".to_string(),
            full_name: "Pegawai".to_string(),
            role,
            opd_id,
        }
    }

    #[test]
    fn email_shape() {
        assert!(validate_email("a@b.go.id").is_ok());
        for bad in ["", "plain", "@b.id", "a@b", "a@@b.id", "a b@c.id", "a@b..id"] {
            assert!(validate_email(bad).is_err(), "{}", bad);
        }
    }

    #[tokio::test]
    async fn create_validates_and_hashes() {
        let seeded = Seeded::new().await;
        let service = UserService::new(seeded.store.clone(), &test_config());

        let user = service.create(input("andi", Role::Staf, Some(seeded.dinkes.id))).await.unwrap();
        assert!(user.is_active);
        assert_ne!(user.password_hash, "rahasia123");
        assert!(verify_password("rahasia123", &user.password_hash));

        assert!(matches!(service.create(input("ab", Role::Staf, None)).await, Err(ServiceError::InvalidArgument(_))));
        let short_password = CreateUser { password: "12345".to_string(), ..input("budi", Role::Staf, None) };
        assert!(matches!(service.create(short_password).await, Err(ServiceError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn create_requires_existing_unit() {
        let seeded = Seeded::new().await;
        let service = UserService::new(seeded.store.clone(), &test_config());
        let err = service.create(input("citra", Role::Pengelola, Some(404))).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(ref what) if what == "opd 404"));
    }

    #[tokio::test]
    async fn admin_is_stored_without_unit() {
        let seeded = Seeded::new().await;
        let service = UserService::new(seeded.store.clone(), &test_config());
        let admin = service.create(input("kepala", Role::Admin, Some(seeded.disdik.id))).await.unwrap();
        assert_eq!(admin.opd_id, None);
    }

    #[tokio::test]
    async fn duplicate_username_or_email_conflicts() {
        let seeded = Seeded::new().await;
        let service = UserService::new(seeded.store.clone(), &test_config());

        assert!(matches!(service.create(input("staf", Role::Staf, None)).await, Err(ServiceError::Conflict(_))));

        let same_email = CreateUser { email: seeded.staf.email.clone(), ..input("dewi", Role::Staf, None) };
        assert!(matches!(service.create(same_email).await, Err(ServiceError::Conflict(_))));

        let rename = UpdateUser { username: Some("staf".to_string()), ..Default::default() };
        assert!(matches!(service.update(seeded.pengelola.id, rename).await, Err(ServiceError::Conflict(_))));

        // Re-submitting one's own username is fine
        let same = UpdateUser { username: Some("staf".to_string()), ..Default::default() };
        assert!(service.update(seeded.staf.id, same).await.is_ok());
    }

    #[tokio::test]
    async fn update_is_partial() {
        let seeded = Seeded::new().await;
        let service = UserService::new(seeded.store.clone(), &test_config());

        let changes = UpdateUser { full_name: Some("Staf Baru".to_string()), ..Default::default() };
        let updated = service.update(seeded.staf.id, changes).await.unwrap();
        assert_eq!(updated.full_name, "Staf Baru");
        assert_eq!(updated.username, seeded.staf.username);
        assert_eq!(updated.opd_id, seeded.staf.opd_id);
        assert_eq!(updated.password_hash, seeded.staf.password_hash);

        let detach = UpdateUser { opd_id: Some(None), ..Default::default() };
        assert_eq!(service.update(seeded.staf.id, detach).await.unwrap().opd_id, None);

        assert!(matches!(service.update(999, UpdateUser::default()).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_is_soft() {
        let seeded = Seeded::new().await;
        let service = UserService::new(seeded.store.clone(), &test_config());

        assert!(service.deactivate(seeded.staf.id).await.unwrap());
        let user = service.get(seeded.staf.id).await.unwrap();
        assert!(!user.is_active);
        assert!(matches!(service.deactivate(999).await, Err(ServiceError::NotFound(_))));
    }
}
