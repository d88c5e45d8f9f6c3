use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::access::Role;
use crate::database::models::User;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: i64,
    pub username: String,
    pub role: Role,
    pub unit_id: Option<i64>,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn for_user(user: &User, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub: user.id,
            username: user.username.clone(),
            role: user.role,
            unit_id: user.opd_id,
            iat: now.timestamp(),
            exp,
        }
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT secret not configured")]
    InvalidSecret,

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),
}

pub fn generate_jwt(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key).map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

pub fn validate_jwt(token: &str, secret: &str) -> Result<Claims, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    decode::<Claims>(token, &decoding_key, &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| JwtError::InvalidToken(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims() -> Claims {
        let now = Utc::now().timestamp();
        Claims { sub: 7, username: "budi".to_string(), role: Role::Pengelola, unit_id: Some(3), iat: now, exp: now + 3600 }
    }

    #[test]
    fn token_round_trips_with_same_secret() {
        let original = claims();
        let token = generate_jwt(&original, "s3cret").unwrap();
        assert_eq!(validate_jwt(&token, "s3cret").unwrap(), original);
        assert!(matches!(validate_jwt(&token, "other"), Err(JwtError::InvalidToken(_))));
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let mut expired = claims();
        expired.exp = Utc::now().timestamp() - 3600;
        let token = generate_jwt(&expired, "s3cret").unwrap();
        assert!(validate_jwt(&token, "s3cret").is_err());
    }

    #[test]
    fn empty_secret_is_refused() {
        assert!(matches!(generate_jwt(&claims(), ""), Err(JwtError::InvalidSecret)));
    }
}
