/// Input validators for authentication requests
///
/// Rejects obviously malformed input before any credential lookup happens.
/// Limits double as DoS protection for the bcrypt-bound login path.

use regex::Regex;
use lazy_static::lazy_static;

use crate::error::ValidationError;

const MAX_USERNAME_LENGTH: usize = 64;
const MAX_PASSWORD_LENGTH: usize = 256; // request-level cap, hashing enforces its own

lazy_static! {
    // Usernames are created out-of-band under the same constraint.
    static ref USERNAME_REGEX: Regex = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").unwrap();
}

/// Validates a login username: non-empty, bounded, restricted charset.
///
/// Returns the trimmed username on success. Rejection here is a 400-class
/// validation error and carries no information about account existence.
pub fn is_valid_username(username: &str) -> Result<String, ValidationError> {
    let trimmed = username.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("username".to_string()));
    }

    if trimmed.len() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::TooLong(
            "username".to_string(),
            MAX_USERNAME_LENGTH,
        ));
    }

    if !USERNAME_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("username".to_string()));
    }

    Ok(trimmed.to_string())
}

/// Validates the password field of a login request.
///
/// Only shape checks: the actual credential check happens against the
/// stored digest.
pub fn is_valid_login_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::EmptyField("password".to_string()));
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::TooLong(
            "password".to_string(),
            MAX_PASSWORD_LENGTH,
        ));
    }

    Ok(())
}
