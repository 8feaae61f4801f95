//! Password hashing with bcrypt

/// Cost factor for bcrypt hashing. Fixed, not configurable.
#[cfg(not(test))]
const BCRYPT_COST: u32 = 12;

// bcrypt at cost 12 takes seconds in unoptimised test builds
#[cfg(test)]
const BCRYPT_COST: u32 = 4;

/// Bcrypt ignores input beyond 72 bytes, so longer passwords are rejected upstream
pub const MAX_PASSWORD_BYTES: usize = 72;

#[derive(Debug, thiserror::Error)]
#[error("Password hashing failed: {0}")]
pub struct PasswordError(#[from] bcrypt::BcryptError);

/// Hash a password using bcrypt with automatic salt generation
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    Ok(bcrypt::hash(password, BCRYPT_COST)?)
}

/// Verify a password against a bcrypt hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    Ok(bcrypt::verify(password, hash)?)
}
