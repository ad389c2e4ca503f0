/// Auth Gateway flow orchestration
///
/// The single façade route handlers call: login, refresh, logout, and
/// change-password, combining the credential store, password hasher,
/// token issuer/validator, and revocation registry. Session state is
/// implicit in which tokens are live or revoked; there are no in-memory
/// per-user locks, and every flow is safe under concurrent requests for
/// the same user.

use actix_web::web;
use chrono::Utc;
use sqlx::PgPool;

use crate::auth::claims::TokenKind;
use crate::auth::revocation::{self, RevocationReason};
use crate::auth::store::{self, UserAccount};
use crate::auth::{jwt, password};
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};

/// A freshly issued access + refresh token pair
#[derive(Debug)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Successful login: tokens plus the authenticated account
#[derive(Debug)]
pub struct LoginOutcome {
    pub tokens: TokenPair,
    pub user: UserAccount,
}

fn issue_pair(user_id: i64, config: &JwtSettings) -> Result<TokenPair, AppError> {
    let access_token = jwt::issue_access_token(user_id, config)?;
    let (refresh_token, _token_id) = jwt::issue_refresh_token(user_id, config)?;
    Ok(TokenPair {
        access_token,
        refresh_token,
    })
}

/// Verify a password on the blocking pool so the adaptive hash never
/// stalls the worker servicing other requests.
async fn verify_on_blocking_pool(candidate: String, digest: String) -> Result<bool, AppError> {
    web::block(move || password::verify_password(&candidate, &digest))
        .await
        .map_err(|e| AppError::Internal(format!("Blocking task failed: {}", e)))?
}

/// Authenticate with username and password and issue a token pair
///
/// Unknown username, wrong password, and deactivated account all fail
/// with the same `InvalidCredentials`: the response must not support
/// username enumeration. The specific cause goes to the structured log
/// only. A malformed stored digest is an integrity error and surfaces
/// as such; it is not a credential mismatch.
pub async fn login(
    pool: &PgPool,
    config: &JwtSettings,
    username: &str,
    password_input: &str,
) -> Result<LoginOutcome, AppError> {
    let user = match store::find_user_by_username(pool, username).await? {
        Some(user) => user,
        None => {
            tracing::warn!(username = %username, "Login attempt for unknown username");
            return Err(AppError::Auth(AuthError::InvalidCredentials));
        }
    };

    if !user.is_active {
        tracing::warn!(user_id = user.id, "Login attempt for inactive account");
        return Err(AppError::Auth(AuthError::InvalidCredentials));
    }

    let valid =
        verify_on_blocking_pool(password_input.to_string(), user.password_hash.clone()).await?;
    if !valid {
        tracing::warn!(user_id = user.id, "Login attempt with wrong password");
        return Err(AppError::Auth(AuthError::InvalidCredentials));
    }

    let tokens = issue_pair(user.id, config)?;

    tracing::info!(user_id = user.id, "User logged in");

    Ok(LoginOutcome { tokens, user })
}

/// Rotate a refresh token: consume the presented token, mint a new pair
///
/// Single-use rotation. The consumed token's id is claimed in the
/// revocation registry with one atomic insert; of two concurrent
/// refreshes presenting the same token, exactly one wins and the loser
/// gets `SessionExpired` rather than a second valid pair. Every failure
/// on this path (bad signature, wrong kind, expiry, revoked id, reset
/// watermark, missing or inactive account) means the client must log
/// in again.
pub async fn refresh(
    pool: &PgPool,
    config: &JwtSettings,
    refresh_token: &str,
) -> Result<TokenPair, AppError> {
    let claims = jwt::decode_token(refresh_token, TokenKind::Refresh, config)
        .map_err(|_| AppError::SessionExpired)?;
    let user_id = claims.user_id()?;
    let token_id = claims.token_id()?;

    if revocation::is_user_invalidated(pool, user_id, claims.iat).await? {
        tracing::info!(user_id = user_id, "Refresh token predates credential reset");
        return Err(AppError::SessionExpired);
    }

    let claimed = revocation::revoke_token(
        pool,
        token_id,
        RevocationReason::Rotated,
        claims.expires_at(),
    )
    .await?;
    if !claimed {
        tracing::warn!(
            user_id = user_id,
            token_id = %token_id,
            "Refresh token presented again after rotation or logout"
        );
        return Err(AppError::SessionExpired);
    }

    let user = match store::find_user_by_id(pool, user_id).await? {
        Some(user) if user.is_active => user,
        _ => return Err(AppError::SessionExpired),
    };

    let tokens = issue_pair(user.id, config)?;

    tracing::info!(user_id = user.id, "Token pair rotated");

    Ok(tokens)
}

/// Revoke the refresh token backing a session
///
/// Never fails visibly: an unparseable, foreign, or already-revoked
/// token and even a registry write failure all end in a successful
/// logout from the client's perspective. Expired tokens are still
/// revoked, so a jti cannot come back to life through clock skew.
pub async fn logout(pool: &PgPool, config: &JwtSettings, refresh_token: &str) {
    let claims = match jwt::decode_for_logout(refresh_token, config) {
        Ok(claims) => claims,
        Err(_) => {
            tracing::debug!("Logout with unusable refresh token, nothing to revoke");
            return;
        }
    };

    let token_id = match claims.token_id() {
        Ok(token_id) => token_id,
        Err(e) => {
            tracing::error!(error = %e, "Logout token carried a malformed id");
            return;
        }
    };

    if let Err(e) =
        revocation::revoke_token(pool, token_id, RevocationReason::Logout, claims.expires_at())
            .await
    {
        tracing::error!(token_id = %token_id, error = %e, "Failed to record logout revocation");
    }
}

/// Change a user's password after re-verifying the current one
///
/// On mismatch nothing changes. On success the new digest is stored and
/// every outstanding refresh token of the user is invalidated through
/// the reset watermark, forcing re-login on other devices.
pub async fn change_password(
    pool: &PgPool,
    user_id: i64,
    current_password: &str,
    new_password: &str,
) -> Result<(), AppError> {
    let user = match store::find_user_by_id(pool, user_id).await? {
        Some(user) => user,
        None => return Err(AppError::Auth(AuthError::TokenInvalid)),
    };
    if !user.is_active {
        return Err(AppError::Auth(AuthError::AccountInactive));
    }

    let valid =
        verify_on_blocking_pool(current_password.to_string(), user.password_hash.clone()).await?;
    if !valid {
        tracing::warn!(user_id = user.id, "Password change with wrong current password");
        return Err(AppError::Auth(AuthError::InvalidCredentials));
    }

    let new_password = new_password.to_string();
    let new_hash = web::block(move || password::hash_password(&new_password))
        .await
        .map_err(|e| AppError::Internal(format!("Blocking task failed: {}", e)))??;

    store::update_password_hash(pool, user.id, &new_hash).await?;
    revocation::revoke_all_for_user(pool, user.id, Utc::now()).await?;

    tracing::info!(user_id = user.id, "Password changed, other sessions revoked");

    Ok(())
}

/// Load the account behind a validated access token
///
/// The gate only proves the token; the account may have been deactivated
/// or removed since issuance.
pub async fn current_user(pool: &PgPool, user_id: i64) -> Result<UserAccount, AppError> {
    let user = match store::find_user_by_id(pool, user_id).await? {
        Some(user) => user,
        None => return Err(AppError::Auth(AuthError::TokenInvalid)),
    };
    if !user.is_active {
        return Err(AppError::Auth(AuthError::AccountInactive));
    }

    Ok(user)
}
