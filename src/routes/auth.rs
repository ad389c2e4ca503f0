/// Authentication Routes
///
/// Login, token refresh, logout, current-user, and password change.
/// Tokens travel both ways: in the JSON body for header-based clients
/// and as httpOnly cookies for browser clients.

use actix_web::cookie::{time::Duration, Cookie, SameSite};
use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::auth::gateway;
use crate::auth::store::UserAccount;
use crate::auth::Claims;
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError, ErrorContext};
use crate::validators::{is_valid_login_password, is_valid_username};

/// User login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Token refresh / logout request body; the token may also arrive as a
/// cookie, so the body is optional end to end.
#[derive(Deserialize, Default)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

/// Password change request
#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Token pair response for refresh
#[derive(Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Login response: token pair plus a profile summary
#[derive(Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserResponse,
}

/// User information response (never includes the credential digest)
#[derive(Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: String,
}

impl From<&UserAccount> for UserResponse {
    fn from(user: &UserAccount) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

fn token_cookie<'a>(name: &'a str, value: &'a str, max_age_secs: i64) -> Cookie<'a> {
    Cookie::build(name, value)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::seconds(max_age_secs))
        .finish()
}

fn removal_cookie(name: &str) -> Cookie<'_> {
    Cookie::build(name, "")
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::ZERO)
        .finish()
}

/// The refresh token from the JSON body if present, else the cookie.
fn presented_refresh_token(
    req: &HttpRequest,
    body: &Option<web::Json<RefreshRequest>>,
) -> Option<String> {
    body.as_ref()
        .and_then(|b| b.refresh_token.clone())
        .or_else(|| req.cookie("refresh_token").map(|c| c.value().to_string()))
}

/// POST /auth/login
///
/// Authenticate with username and password; returns an access and a
/// refresh token in the body and as httpOnly cookies.
///
/// # Errors
/// - 400: Malformed username or password field
/// - 401: Unknown user, wrong password, or inactive account, with one
///   uniform body for all three
/// - 500: Internal server error
pub async fn login(
    form: web::Json<LoginRequest>,
    pool: web::Data<PgPool>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_login");

    let username = is_valid_username(&form.username)?;
    is_valid_login_password(&form.password)?;

    let outcome = gateway::login(
        pool.get_ref(),
        jwt_config.get_ref(),
        &username,
        &form.password,
    )
    .await?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = outcome.user.id,
        "User logged in successfully"
    );

    Ok(HttpResponse::Ok()
        .cookie(token_cookie(
            "access_token",
            &outcome.tokens.access_token,
            jwt_config.access_token_expiry,
        ))
        .cookie(token_cookie(
            "refresh_token",
            &outcome.tokens.refresh_token,
            jwt_config.refresh_token_expiry,
        ))
        .json(LoginResponse {
            access_token: outcome.tokens.access_token.clone(),
            refresh_token: outcome.tokens.refresh_token.clone(),
            token_type: "Bearer".to_string(),
            expires_in: jwt_config.access_token_expiry,
            user: UserResponse::from(&outcome.user),
        }))
}

/// POST /auth/refresh
///
/// Exchange a refresh token for a new access+refresh pair. The consumed
/// token is revoked as part of rotation; presenting it again fails.
///
/// # Errors
/// - 401 MISSING_TOKEN: no refresh token in body or cookie
/// - 401 SESSION_EXPIRED: invalid, expired, revoked, or replayed token;
///   the client must log in again
/// - 500: Internal server error
pub async fn refresh(
    req: HttpRequest,
    body: Option<web::Json<RefreshRequest>>,
    pool: web::Data<PgPool>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("token_refresh");

    let refresh_token = presented_refresh_token(&req, &body)
        .ok_or(AppError::Auth(AuthError::MissingToken))?;

    let tokens = gateway::refresh(pool.get_ref(), jwt_config.get_ref(), &refresh_token).await?;

    tracing::info!(
        request_id = %context.request_id,
        "Token refreshed successfully"
    );

    Ok(HttpResponse::Ok()
        .cookie(token_cookie(
            "access_token",
            &tokens.access_token,
            jwt_config.access_token_expiry,
        ))
        .cookie(token_cookie(
            "refresh_token",
            &tokens.refresh_token,
            jwt_config.refresh_token_expiry,
        ))
        .json(AuthResponse {
            access_token: tokens.access_token.clone(),
            refresh_token: tokens.refresh_token.clone(),
            token_type: "Bearer".to_string(),
            expires_in: jwt_config.access_token_expiry,
        }))
}

/// POST /auth/logout
///
/// Revoke the presented refresh token and clear the auth cookies.
/// Always answers 200: an expired, foreign, or already-revoked token
/// still logs the client out.
pub async fn logout(
    req: HttpRequest,
    body: Option<web::Json<RefreshRequest>>,
    pool: web::Data<PgPool>,
    jwt_config: web::Data<JwtSettings>,
) -> HttpResponse {
    if let Some(refresh_token) = presented_refresh_token(&req, &body) {
        gateway::logout(pool.get_ref(), jwt_config.get_ref(), &refresh_token).await;
    }

    HttpResponse::Ok()
        .cookie(removal_cookie("access_token"))
        .cookie(removal_cookie("refresh_token"))
        .json(serde_json::json!({ "message": "Successfully logged out" }))
}

/// GET /auth/me
///
/// Current authenticated user. Requires a valid access token (header or
/// cookie); claims are injected by the JWT middleware.
///
/// # Errors
/// - 401: Missing/invalid token (middleware), or the account has been
///   removed or deactivated since the token was issued
pub async fn get_current_user(
    claims: web::ReqData<Claims>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let user_id = claims.user_id()?;
    let user = gateway::current_user(pool.get_ref(), user_id).await?;

    Ok(HttpResponse::Ok().json(UserResponse::from(&user)))
}

/// POST /auth/change-password
///
/// Re-verifies the current password, stores the new digest, and revokes
/// the user's outstanding refresh tokens on other devices.
///
/// # Errors
/// - 400: New password violates the length policy
/// - 401: Wrong current password
/// - 500: Internal server error
pub async fn change_password(
    form: web::Json<ChangePasswordRequest>,
    claims: web::ReqData<Claims>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let user_id = claims.user_id()?;
    let context = ErrorContext::new("password_change").with_user_id(user_id.to_string());

    gateway::change_password(
        pool.get_ref(),
        user_id,
        &form.current_password,
        &form.new_password,
    )
    .await?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = user_id,
        "Password changed successfully"
    );

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Password changed successfully" })))
}
