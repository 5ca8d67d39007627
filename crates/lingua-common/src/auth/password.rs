//! Password hashing for subject sign-in
//!
//! Argon2id with the crate defaults. Hashes are PHC strings, so parameters
//! travel with the hash and can be raised later without a migration.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lingua_core::DomainError;

use crate::error::AppError;

const MIN_PASSWORD_LEN: usize = 8;
const MAX_PASSWORD_LEN: usize = 128;

/// Hash a password using Argon2id
///
/// # Errors
/// Returns an error if hashing fails
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::internal(anyhow::anyhow!("password hashing failed: {e}")))
}

/// Verify a password against a stored PHC hash
///
/// # Errors
/// Returns an error if the stored hash cannot be parsed
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::internal(anyhow::anyhow!("stored password hash is unreadable: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Password service handed to the auth flows
#[derive(Debug, Clone, Default)]
pub struct PasswordService;

impl PasswordService {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Check strength, then hash
    ///
    /// # Errors
    /// Returns `WeakPassword` if the password is rejected, or an internal error
    pub fn hash_new(&self, password: &str) -> Result<String, AppError> {
        validate_password_strength(password)?;
        hash_password(password)
    }

    /// Verify a password and map a mismatch to `InvalidCredentials`
    ///
    /// # Errors
    /// Returns `AppError::InvalidCredentials` if the password doesn't match
    pub fn verify_or_error(&self, password: &str, hash: &str) -> Result<(), AppError> {
        if verify_password(password, hash)? {
            Ok(())
        } else {
            Err(AppError::InvalidCredentials)
        }
    }
}

/// Validate password strength
///
/// Requires 8 to 128 characters with at least one letter and one digit.
///
/// # Errors
/// Returns `DomainError::WeakPassword` describing the first unmet rule
pub fn validate_password_strength(password: &str) -> Result<(), AppError> {
    let weak = |msg: &str| Err(AppError::Domain(DomainError::WeakPassword(msg.to_string())));

    let len = password.chars().count();
    if len < MIN_PASSWORD_LEN {
        return weak("must be at least 8 characters long");
    }
    if len > MAX_PASSWORD_LEN {
        return weak("must be at most 128 characters long");
    }
    if !password.chars().any(char::is_alphabetic) {
        return weak("must contain a letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return weak("must contain a digit");
    }

    Ok(())
}
