/// Token Issuer and Validator
///
/// Creation and stateless verification of signed, time-boxed access and
/// refresh tokens. Both token kinds are HS256 JWTs over the process-wide
/// signing secret; revocation state for refresh tokens lives in the
/// revocation registry, not here.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::{Claims, TokenKind};
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};

/// Generate a short-lived access token for a user
///
/// # Errors
/// Returns an internal error if signing fails
pub fn issue_access_token(user_id: i64, config: &JwtSettings) -> Result<String, AppError> {
    let claims = Claims::new(
        user_id,
        TokenKind::Access,
        config.access_token_expiry,
        config.issuer.clone(),
    );

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
}

/// Generate a long-lived refresh token for a user
///
/// Returns the signed token together with its freshly allocated token
/// identifier, which the revocation registry is keyed by.
pub fn issue_refresh_token(user_id: i64, config: &JwtSettings) -> Result<(String, Uuid), AppError> {
    let claims = Claims::new(
        user_id,
        TokenKind::Refresh,
        config.refresh_token_expiry,
        config.issuer.clone(),
    );
    let token_id = claims.token_id()?;

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))?;

    Ok((token, token_id))
}

/// Validate a token and extract its claims
///
/// Checks, in order: signature, issuer, expiry (all inside the JWT
/// decode), then the kind discriminator. A malformed or foreign-signed
/// token is an authentication failure, never a server error.
///
/// # Errors
/// Returns `AuthError::TokenExpired` or `AuthError::TokenInvalid`
pub fn decode_token(
    token: &str,
    expected_kind: TokenKind,
    config: &JwtSettings,
) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.issuer]);

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
            AppError::Auth(AuthError::TokenExpired)
        }
        _ => {
            tracing::warn!("JWT validation error: {}", e);
            AppError::Auth(AuthError::TokenInvalid)
        }
    })?;

    if claims.kind != expected_kind {
        tracing::warn!(
            expected = %expected_kind,
            got = %claims.kind,
            "Token kind mismatch"
        );
        return Err(AppError::Auth(AuthError::TokenInvalid));
    }

    Ok(claims)
}

/// Decode a refresh token for logout, tolerating expiry
///
/// Logout must be able to revoke a token that has just expired, so only
/// the signature, issuer, and kind are checked here. Never used on the
/// request gate or the refresh path.
pub fn decode_for_logout(token: &str, config: &JwtSettings) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.issuer]);
    validation.validate_exp = false;

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Auth(AuthError::TokenInvalid))?;

    if claims.kind != TokenKind::Refresh {
        return Err(AppError::Auth(AuthError::TokenInvalid));
    }

    Ok(claims)
}
