/// Password Hashing and Verification
///
/// bcrypt hashing with an embedded salt, plus the password length policy.
/// Hashing is intentionally slow; callers on the request path offload it
/// to the blocking pool.

use bcrypt::{hash, verify, DEFAULT_COST};

use crate::error::{AppError, ValidationError};

const MIN_PASSWORD_LENGTH: usize = 8;
// bcrypt truncates input beyond 72 bytes, so longer passwords would
// silently collide.
const MAX_PASSWORD_BYTES: usize = 72;

/// Hash a password using bcrypt
///
/// The salt is generated internally and embedded in the digest, so
/// verification needs nothing but the digest itself.
///
/// # Errors
/// Returns a validation error if the password violates the length policy,
/// or an internal error if bcrypt fails
pub fn hash_password(password: &str) -> Result<String, AppError> {
    validate_password_policy(password)?;

    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against its stored digest
///
/// A mismatched password is `Ok(false)`, never an error. An error here
/// means the stored digest itself is unusable: a data-integrity problem
/// that is fatal for that record.
pub fn verify_password(password: &str, digest: &str) -> Result<bool, AppError> {
    verify(password, digest)
        .map_err(|e| AppError::Integrity(format!("malformed password digest: {}", e)))
}

/// Validate the password length policy
///
/// - Minimum 8 characters
/// - Maximum 72 bytes (UTF-8 encoded)
pub fn validate_password_policy(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::Validation(ValidationError::TooShort(
            "password".to_string(),
            MIN_PASSWORD_LENGTH,
        )));
    }

    if password.len() > MAX_PASSWORD_BYTES {
        return Err(AppError::Validation(ValidationError::TooLong(
            "password".to_string(),
            MAX_PASSWORD_BYTES,
        )));
    }

    Ok(())
}
