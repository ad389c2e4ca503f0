/// JWT Claims structure
///
/// Payload of both access and refresh tokens (RFC 7519 registered claims
/// plus a token kind discriminator and a unique token identifier).

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::error::AppError;

/// Token kind discriminator embedded in every token.
///
/// A refresh token is never accepted where an access token is required,
/// and vice versa.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Access => write!(f, "access"),
            TokenKind::Refresh => write!(f, "refresh"),
        }
    }
}

/// JWT claims shared by access and refresh tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID, stringified)
    pub sub: String,
    /// Token kind discriminator
    pub kind: TokenKind,
    /// Unique token identifier (UUID), used for revocation tracking
    pub jti: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Issuer
    pub iss: String,
}

impl Claims {
    /// Create new claims for a user
    ///
    /// Allocates a fresh `jti`; `exp` is `expiry_seconds` past now.
    pub fn new(user_id: i64, kind: TokenKind, expiry_seconds: i64, issuer: String) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: user_id.to_string(),
            kind,
            jti: Uuid::new_v4().to_string(),
            exp: now + expiry_seconds,
            iat: now,
            iss: issuer,
        }
    }

    /// Extract user ID from claims
    ///
    /// # Errors
    /// Returns an integrity error if the subject is not a numeric ID.
    /// A token we signed can only carry a corrupt subject if something
    /// went badly wrong.
    pub fn user_id(&self) -> Result<i64, AppError> {
        self.sub
            .parse::<i64>()
            .map_err(|_| AppError::Integrity(format!("non-numeric token subject: {}", self.sub)))
    }

    /// Extract the token identifier from claims
    pub fn token_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.jti)
            .map_err(|_| AppError::Integrity(format!("malformed token id: {}", self.jti)))
    }

    /// Check if token has expired
    pub fn is_expired(&self) -> bool {
        let now = chrono::Utc::now().timestamp();
        self.exp < now
    }

    /// The token's natural expiry as a UTC timestamp
    pub fn expires_at(&self) -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::from_timestamp(self.exp, 0).unwrap_or_else(chrono::Utc::now)
    }
}
