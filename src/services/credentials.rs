use bcrypt::BcryptError;

/// Bcrypt's accepted cost range (the `bcrypt` crate keeps these private).
pub const MIN_COST: u32 = 4;
pub const MAX_COST: u32 = 31;

/// Bcrypt hash in modular crypt format (`$2b$<cost>$...`); the salt is embedded.
pub fn hash_password(password: &str, cost: u32) -> Result<String, BcryptError> {
    bcrypt::hash(password, cost)
}

/// A malformed stored hash never verifies.
pub fn verify_password(password: &str, stored: &str) -> bool {
    bcrypt::verify(password, stored).unwrap_or(false)
}
