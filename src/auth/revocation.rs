/// Session/Revocation Registry
///
/// Refresh tokens are stateless JWTs, so logout and rotation need this
/// registry to make them invalid before natural expiry. It is an
/// append-only set of revoked token identifiers plus a per-user
/// credential-reset watermark; entries are pruned once the underlying
/// token would have expired anyway.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;

/// Why a refresh token was revoked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevocationReason {
    Logout,
    Rotated,
}

impl RevocationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RevocationReason::Logout => "logout",
            RevocationReason::Rotated => "rotated",
        }
    }
}

/// Revoke a refresh token by its identifier
///
/// Idempotent: revoking an already-revoked token is a no-op. The returned
/// flag reports whether THIS call inserted the entry, which makes the
/// insert the atomic check-not-revoked-then-revoke unit rotation relies
/// on: of two concurrent refreshes presenting the same token, exactly one
/// observes `true`.
///
/// `token_expires_at` is the token's natural expiry, recorded so the
/// entry can be swept once it stops mattering.
pub async fn revoke_token(
    pool: &PgPool,
    token_id: Uuid,
    reason: RevocationReason,
    token_expires_at: DateTime<Utc>,
) -> Result<bool, AppError> {
    let result = sqlx::query(
        r#"
        INSERT INTO revoked_tokens (token_id, reason, revoked_at, token_expires_at)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (token_id) DO NOTHING
        "#,
    )
    .bind(token_id)
    .bind(reason.as_str())
    .bind(Utc::now())
    .bind(token_expires_at)
    .execute(pool)
    .await?;

    let newly_revoked = result.rows_affected() == 1;
    if newly_revoked {
        tracing::info!(token_id = %token_id, reason = reason.as_str(), "Refresh token revoked");
    }

    Ok(newly_revoked)
}

/// Check whether a token identifier has been revoked
///
/// Read-only; concurrent checks of the same token are independent.
pub async fn is_token_revoked(pool: &PgPool, token_id: Uuid) -> Result<bool, AppError> {
    let revoked = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM revoked_tokens WHERE token_id = $1)",
    )
    .bind(token_id)
    .fetch_one(pool)
    .await?;

    Ok(revoked)
}

/// Invalidate every outstanding refresh token of a user
///
/// Used on password change. The registry cannot enumerate tokens it has
/// never seen, so mass revocation is a watermark: refresh tokens issued
/// before `reset_at` are rejected from here on. The watermark only moves
/// forward.
pub async fn revoke_all_for_user(
    pool: &PgPool,
    user_id: i64,
    reset_at: DateTime<Utc>,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO credential_resets (user_id, reset_at)
        VALUES ($1, $2)
        ON CONFLICT (user_id)
        DO UPDATE SET reset_at = GREATEST(credential_resets.reset_at, EXCLUDED.reset_at)
        "#,
    )
    .bind(user_id)
    .bind(reset_at)
    .execute(pool)
    .await?;

    tracing::info!(user_id = user_id, "All outstanding refresh tokens invalidated for user");
    Ok(())
}

/// Check whether a token predates its user's credential-reset watermark
///
/// `issued_at` is the token's iat claim (Unix timestamp). Strictly-before
/// comparison: a token minted in the same second as the reset survives,
/// so a login immediately after a password change is not locked out.
pub async fn is_user_invalidated(
    pool: &PgPool,
    user_id: i64,
    issued_at: i64,
) -> Result<bool, AppError> {
    let reset_at = sqlx::query_scalar::<_, DateTime<Utc>>(
        "SELECT reset_at FROM credential_resets WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(match reset_at {
        Some(reset_at) => issued_at < reset_at.timestamp(),
        None => false,
    })
}

/// Remove revocation entries whose token expired before `before`
///
/// Eventual cleanup only: a stale entry is harmless, merely wasted space.
/// Safe to run concurrently with reads and writes.
pub async fn sweep_expired(pool: &PgPool, before: DateTime<Utc>) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM revoked_tokens WHERE token_expires_at < $1")
        .bind(before)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Remove credential-reset watermarks older than `before`
///
/// A watermark stops mattering once every token issued before it has
/// expired naturally; callers pass `now - refresh_ttl`.
pub async fn sweep_stale_resets(pool: &PgPool, before: DateTime<Utc>) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM credential_resets WHERE reset_at < $1")
        .bind(before)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
