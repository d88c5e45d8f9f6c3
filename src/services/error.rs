use thiserror::Error;

use crate::database::DatabaseError;
use crate::query::QueryError;
use crate::services::opd_guard::BlockReason;

/// Failure taxonomy shared by the archive services.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} already exists")]
    Conflict(String),

    #[error("blocked: {0}")]
    Blocked(BlockReason),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("password hashing failed: {0}")]
    Hashing(#[from] bcrypt::BcryptError),

    #[error(transparent)]
    Database(DatabaseError),
}

impl ServiceError {
    pub fn not_found(entity: &str, id: i64) -> Self {
        ServiceError::NotFound(format!("{} {}", entity, id))
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        ServiceError::InvalidArgument(message.into())
    }
}

impl From<QueryError> for ServiceError {
    fn from(err: QueryError) -> Self {
        ServiceError::InvalidArgument(err.to_string())
    }
}

impl From<DatabaseError> for ServiceError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(what) => ServiceError::NotFound(what),
            DatabaseError::Conflict(constraint) => ServiceError::Conflict(conflict_subject(&constraint).to_string()),
            other => ServiceError::Database(other),
        }
    }
}

/// Human name for a unique constraint, e.g. `users_email_key` -> `email`.
fn conflict_subject(constraint: &str) -> &str {
    match constraint {
        "opds_code_key" => "unit code",
        "users_username_key" => "username",
        "users_email_key" => "email",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violations_become_conflicts() {
        let err: ServiceError = DatabaseError::Conflict("users_email_key".to_string()).into();
        assert!(matches!(&err, ServiceError::Conflict(subject) if subject == "email"));
        assert_eq!(err.to_string(), "email already exists");
    }

    #[test]
    fn pagination_errors_are_invalid_arguments() {
        let err: ServiceError = QueryError::InvalidLimit { limit: 500, max: 100 }.into();
        assert!(matches!(err, ServiceError::InvalidArgument(_)));
    }
}
