/// Credential Store adapter
///
/// Row-level access to the users table, the only part of the user record
/// this subsystem reads or writes. Accounts are created and deleted
/// elsewhere; here they are looked up for authentication and have their
/// password digest replaced.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::error::AppError;

/// A persisted user account
///
/// `password_hash` is opaque and never leaves this module's callers as
/// serialized output; response types copy the public fields explicitly.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserAccount {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Look up a user by exact (case-sensitive) username
pub async fn find_user_by_username(
    pool: &PgPool,
    username: &str,
) -> Result<Option<UserAccount>, AppError> {
    let user = sqlx::query_as::<_, UserAccount>(
        r#"
        SELECT id, username, email, password_hash, is_active, created_at
        FROM users
        WHERE username = $1
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Look up a user by id
pub async fn find_user_by_id(pool: &PgPool, user_id: i64) -> Result<Option<UserAccount>, AppError> {
    let user = sqlx::query_as::<_, UserAccount>(
        r#"
        SELECT id, username, email, password_hash, is_active, created_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Replace a user's password digest
///
/// Row-level atomic; the digest has already been produced by the hasher.
pub async fn update_password_hash(
    pool: &PgPool,
    user_id: i64,
    new_hash: &str,
) -> Result<(), AppError> {
    sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
        .bind(new_hash)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}
