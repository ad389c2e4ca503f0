use std::net::TcpListener;

use serde_json::{json, Value};
use sqlx::{Connection, Executor, PgConnection, PgPool};

use taskboard::auth::password::hash_password;
use taskboard::auth::revocation::{self, RevocationReason};
use taskboard::configuration::{get_configuration, DatabaseSettings};
use taskboard::startup::run;

pub struct TestApp {
    pub address: String,
    pub db_pool: PgPool,
}

async fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let mut configuration = get_configuration().expect("Failed to read configuration.");
    configuration.database.database_name = uuid::Uuid::new_v4().to_string();
    let connection_pool = configure_database(&configuration.database).await;

    let jwt_config = configuration.jwt.clone();
    let server = run(listener, connection_pool.clone(), jwt_config)
        .expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        db_pool: connection_pool,
    }
}

pub async fn configure_database(config: &DatabaseSettings) -> PgPool {
    // Create database
    let mut connection = PgConnection::connect(&config.connection_string_without_db())
        .await
        .expect("Failed to connect to Postgres");
    connection
        .execute(&*format!(r#"CREATE DATABASE "{}";"#, config.database_name))
        .await
        .expect("Failed to create database.");
    // Migrate database
    let connection_pool = PgPool::connect(&config.connection_string())
        .await
        .expect("Failed to connect to Postgres.");
    sqlx::migrate!("./migrations")
        .run(&connection_pool)
        .await
        .expect("Failed to migrate the database.");
    connection_pool
}

/// Accounts are provisioned out-of-band in production; tests seed them
/// directly.
async fn seed_user(
    pool: &PgPool,
    username: &str,
    email: &str,
    password: &str,
    is_active: bool,
) -> i64 {
    let password_hash = hash_password(password).expect("Failed to hash seed password");

    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO users (username, email, password_hash, is_active)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(is_active)
    .fetch_one(pool)
    .await
    .expect("Failed to seed user")
}

async fn login(app: &TestApp, username: &str, password: &str) -> reqwest::Response {
    reqwest::Client::new()
        .post(&format!("{}/auth/login", &app.address))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await
        .expect("Failed to execute request.")
}

fn set_cookie_names(response: &reqwest::Response) -> Vec<String> {
    response
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|c| c.split('=').next())
        .map(|name| name.to_string())
        .collect()
}

// --- Login Tests ---

#[tokio::test]
async fn login_returns_200_for_valid_credentials() {
    let app = spawn_app().await;
    let user_id = seed_user(&app.db_pool, "user1", "user1@example.com", "correctpw1", true).await;

    let response = login(&app, "user1", "correctpw1").await;

    assert_eq!(200, response.status().as_u16());

    let cookie_names = set_cookie_names(&response);
    assert!(cookie_names.contains(&"access_token".to_string()));
    assert!(cookie_names.contains(&"refresh_token".to_string()));

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body.get("access_token").is_some());
    assert!(body.get("refresh_token").is_some());
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["user"]["id"], user_id);
    assert_eq!(body["user"]["username"], "user1");
    assert_eq!(body["user"]["email"], "user1@example.com");
    assert!(body["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn login_returns_401_for_wrong_password() {
    let app = spawn_app().await;
    seed_user(&app.db_pool, "user1", "user1@example.com", "correctpw1", true).await;

    let response = login(&app, "user1", "wrongpassword").await;

    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let app = spawn_app().await;
    seed_user(&app.db_pool, "user1", "user1@example.com", "correctpw1", true).await;
    seed_user(&app.db_pool, "sleeper", "sleeper@example.com", "correctpw1", false).await;

    // Wrong password, unknown username, inactive account with the right
    // password: all three must produce the same status and body fields.
    let wrong_pw: Value = login(&app, "user1", "wrongpassword").await.json().await.unwrap();
    let unknown: Value = login(&app, "ghost", "wrongpassword").await.json().await.unwrap();
    let inactive: Value = login(&app, "sleeper", "correctpw1").await.json().await.unwrap();

    assert_eq!(wrong_pw["message"], unknown["message"]);
    assert_eq!(wrong_pw["code"], unknown["code"]);
    assert_eq!(wrong_pw["message"], inactive["message"]);
    assert_eq!(wrong_pw["code"], inactive["code"]);
}

#[tokio::test]
async fn login_returns_401_for_inactive_user() {
    let app = spawn_app().await;
    seed_user(&app.db_pool, "sleeper", "sleeper@example.com", "correctpw1", false).await;

    let response = login(&app, "sleeper", "correctpw1").await;

    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn login_returns_400_for_missing_fields() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let test_cases = vec![
        (json!({"username": "user1"}), "missing password"),
        (json!({"password": "Pass1234"}), "missing username"),
        (json!({}), "missing all fields"),
    ];

    for (body, reason) in test_cases {
        let response = client
            .post(&format!("{}/auth/login", &app.address))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.");

        assert_eq!(400, response.status().as_u16(),
            "Should reject request: {}", reason);
    }
}

#[tokio::test]
async fn login_returns_400_for_malformed_username() {
    let app = spawn_app().await;

    for username in ["", "   ", "user name", "user;drop"] {
        let response = login(&app, username, "whateverpw").await;
        assert_eq!(400, response.status().as_u16(),
            "Should reject username: {:?}", username);
    }
}

// --- Protected Routes Tests ---

#[tokio::test]
async fn protected_route_returns_401_without_token() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(&format!("{}/auth/me", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn protected_route_returns_401_with_invalid_token() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(&format!("{}/auth/me", &app.address))
        .header("Authorization", "Bearer invalid.token.here")
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["code"], "TOKEN_INVALID");
}

#[tokio::test]
async fn protected_route_rejects_malformed_authorization_header() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let malformed_headers = vec![
        "Bearer",  // missing token
        "Basic dXNlcjpwYXNz",  // not Bearer
        "BearerToken",  // missing space
        "",  // empty
    ];

    for header in malformed_headers {
        let response = client
            .get(&format!("{}/auth/me", &app.address))
            .header("Authorization", header)
            .send()
            .await
            .expect("Failed to execute request.");

        assert_eq!(401, response.status().as_u16(),
            "Should reject malformed header: {}", header);
    }
}

#[tokio::test]
async fn protected_route_rejects_refresh_token_as_bearer() {
    let app = spawn_app().await;
    seed_user(&app.db_pool, "user1", "user1@example.com", "correctpw1", true).await;

    let body: Value = login(&app, "user1", "correctpw1").await.json().await.unwrap();
    let refresh_token = body["refresh_token"].as_str().unwrap();

    let response = reqwest::Client::new()
        .get(&format!("{}/auth/me", &app.address))
        .header("Authorization", format!("Bearer {}", refresh_token))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn get_current_user_returns_200_with_valid_token() {
    let app = spawn_app().await;
    let user_id = seed_user(&app.db_pool, "user1", "user1@example.com", "correctpw1", true).await;

    let body: Value = login(&app, "user1", "correctpw1").await.json().await.unwrap();
    let access_token = body["access_token"].as_str().unwrap();

    let response = reqwest::Client::new()
        .get(&format!("{}/auth/me", &app.address))
        .header("Authorization", format!("Bearer {}", access_token))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());

    let me: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(me["id"], user_id);
    assert_eq!(me["username"], "user1");
    assert_eq!(me["email"], "user1@example.com");
}

#[tokio::test]
async fn access_token_cookie_gates_protected_route() {
    let app = spawn_app().await;
    seed_user(&app.db_pool, "user1", "user1@example.com", "correctpw1", true).await;

    let body: Value = login(&app, "user1", "correctpw1").await.json().await.unwrap();
    let access_token = body["access_token"].as_str().unwrap();

    // Same token, cookie transport instead of the Authorization header.
    let response = reqwest::Client::new()
        .get(&format!("{}/auth/me", &app.address))
        .header("Cookie", format!("access_token={}", access_token))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
}

#[tokio::test]
async fn deactivated_account_is_rejected_at_me_despite_valid_token() {
    let app = spawn_app().await;
    let user_id = seed_user(&app.db_pool, "user1", "user1@example.com", "correctpw1", true).await;

    let body: Value = login(&app, "user1", "correctpw1").await.json().await.unwrap();
    let access_token = body["access_token"].as_str().unwrap();

    sqlx::query("UPDATE users SET is_active = false WHERE id = $1")
        .bind(user_id)
        .execute(&app.db_pool)
        .await
        .expect("Failed to deactivate user");

    let response = reqwest::Client::new()
        .get(&format!("{}/auth/me", &app.address))
        .header("Authorization", format!("Bearer {}", access_token))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
}

// --- Token Refresh Tests ---

#[tokio::test]
async fn refresh_rotates_and_rejects_the_consumed_token() {
    let app = spawn_app().await;
    seed_user(&app.db_pool, "user1", "user1@example.com", "correctpw1", true).await;

    let body: Value = login(&app, "user1", "correctpw1").await.json().await.unwrap();
    let old_refresh_token = body["refresh_token"].as_str().unwrap();

    let client = reqwest::Client::new();
    let response = client
        .post(&format!("{}/auth/refresh", &app.address))
        .json(&json!({ "refresh_token": old_refresh_token }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());

    let refreshed: Value = response.json().await.expect("Failed to parse response");
    let new_access = refreshed["access_token"].as_str().unwrap();
    let new_refresh = refreshed["refresh_token"].as_str().unwrap();
    assert_ne!(old_refresh_token, new_refresh,
        "Refresh token should be rotated on each refresh");

    // The new access token works at the gate.
    let me = client
        .get(&format!("{}/auth/me", &app.address))
        .header("Authorization", format!("Bearer {}", new_access))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, me.status().as_u16());

    // The consumed refresh token is dead: rotation is single-use.
    let replay = client
        .post(&format!("{}/auth/refresh", &app.address))
        .json(&json!({ "refresh_token": old_refresh_token }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, replay.status().as_u16());
    let replay_body: Value = replay.json().await.expect("Failed to parse response");
    assert_eq!(replay_body["code"], "SESSION_EXPIRED");
}

#[tokio::test]
async fn refresh_accepts_the_cookie_transport() {
    let app = spawn_app().await;
    seed_user(&app.db_pool, "user1", "user1@example.com", "correctpw1", true).await;

    let body: Value = login(&app, "user1", "correctpw1").await.json().await.unwrap();
    let refresh_token = body["refresh_token"].as_str().unwrap();

    let response = reqwest::Client::new()
        .post(&format!("{}/auth/refresh", &app.address))
        .header("Cookie", format!("refresh_token={}", refresh_token))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
}

#[tokio::test]
async fn refresh_rejects_an_access_token() {
    let app = spawn_app().await;
    seed_user(&app.db_pool, "user1", "user1@example.com", "correctpw1", true).await;

    let body: Value = login(&app, "user1", "correctpw1").await.json().await.unwrap();
    let access_token = body["access_token"].as_str().unwrap();

    let response = reqwest::Client::new()
        .post(&format!("{}/auth/refresh", &app.address))
        .json(&json!({ "refresh_token": access_token }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["code"], "SESSION_EXPIRED");
}

#[tokio::test]
async fn refresh_returns_401_with_garbage_token() {
    let app = spawn_app().await;

    let response = reqwest::Client::new()
        .post(&format!("{}/auth/refresh", &app.address))
        .json(&json!({ "refresh_token": "definitely.not.valid" }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["code"], "SESSION_EXPIRED");
}

#[tokio::test]
async fn refresh_returns_401_for_missing_token() {
    let app = spawn_app().await;

    let response = reqwest::Client::new()
        .post(&format!("{}/auth/refresh", &app.address))
        .json(&json!({}))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["code"], "MISSING_TOKEN");
}

#[tokio::test]
async fn refresh_rejects_a_token_for_a_deactivated_account() {
    let app = spawn_app().await;
    let user_id = seed_user(&app.db_pool, "user1", "user1@example.com", "correctpw1", true).await;

    let body: Value = login(&app, "user1", "correctpw1").await.json().await.unwrap();
    let refresh_token = body["refresh_token"].as_str().unwrap();

    sqlx::query("UPDATE users SET is_active = false WHERE id = $1")
        .bind(user_id)
        .execute(&app.db_pool)
        .await
        .expect("Failed to deactivate user");

    let response = reqwest::Client::new()
        .post(&format!("{}/auth/refresh", &app.address))
        .json(&json!({ "refresh_token": refresh_token }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
}

// --- Logout Tests ---

#[tokio::test]
async fn logout_revokes_the_refresh_token_and_is_idempotent() {
    let app = spawn_app().await;
    seed_user(&app.db_pool, "user1", "user1@example.com", "correctpw1", true).await;

    let body: Value = login(&app, "user1", "correctpw1").await.json().await.unwrap();
    let refresh_token = body["refresh_token"].as_str().unwrap();

    let client = reqwest::Client::new();
    let logout = |token: String| {
        let client = client.clone();
        let url = format!("{}/auth/logout", &app.address);
        async move {
            client
                .post(&url)
                .json(&json!({ "refresh_token": token }))
                .send()
                .await
                .expect("Failed to execute request.")
        }
    };

    let first = logout(refresh_token.to_string()).await;
    assert_eq!(200, first.status().as_u16());

    // The revoked token can no longer be used to refresh.
    let refresh = client
        .post(&format!("{}/auth/refresh", &app.address))
        .json(&json!({ "refresh_token": refresh_token }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(401, refresh.status().as_u16());

    // Logging out again never raises and has no further effect.
    let second = logout(refresh_token.to_string()).await;
    assert_eq!(200, second.status().as_u16());
}

#[tokio::test]
async fn logout_always_succeeds() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    // No token at all.
    let response = client
        .post(&format!("{}/auth/logout", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());

    // Garbage token.
    let response = client
        .post(&format!("{}/auth/logout", &app.address))
        .json(&json!({ "refresh_token": "garbage" }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());
}

#[tokio::test]
async fn logout_clears_auth_cookies() {
    let app = spawn_app().await;

    let response = reqwest::Client::new()
        .post(&format!("{}/auth/logout", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    let cookie_names = set_cookie_names(&response);
    assert!(cookie_names.contains(&"access_token".to_string()));
    assert!(cookie_names.contains(&"refresh_token".to_string()));
}

// --- Change Password Tests ---

#[tokio::test]
async fn change_password_rejects_wrong_current_password() {
    let app = spawn_app().await;
    seed_user(&app.db_pool, "user1", "user1@example.com", "correctpw1", true).await;

    let body: Value = login(&app, "user1", "correctpw1").await.json().await.unwrap();
    let access_token = body["access_token"].as_str().unwrap();

    let response = reqwest::Client::new()
        .post(&format!("{}/auth/change-password", &app.address))
        .header("Authorization", format!("Bearer {}", access_token))
        .json(&json!({
            "current_password": "not-the-password",
            "new_password": "brand-new-pw1"
        }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());

    // Stored digest unchanged: the old password still logs in.
    let relogin = login(&app, "user1", "correctpw1").await;
    assert_eq!(200, relogin.status().as_u16());
}

#[tokio::test]
async fn change_password_rejects_short_new_password() {
    let app = spawn_app().await;
    seed_user(&app.db_pool, "user1", "user1@example.com", "correctpw1", true).await;

    let body: Value = login(&app, "user1", "correctpw1").await.json().await.unwrap();
    let access_token = body["access_token"].as_str().unwrap();

    let response = reqwest::Client::new()
        .post(&format!("{}/auth/change-password", &app.address))
        .header("Authorization", format!("Bearer {}", access_token))
        .json(&json!({
            "current_password": "correctpw1",
            "new_password": "short"
        }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn change_password_swaps_the_working_credential() {
    let app = spawn_app().await;
    seed_user(&app.db_pool, "user1", "user1@example.com", "correctpw1", true).await;

    let body: Value = login(&app, "user1", "correctpw1").await.json().await.unwrap();
    let access_token = body["access_token"].as_str().unwrap();

    let response = reqwest::Client::new()
        .post(&format!("{}/auth/change-password", &app.address))
        .header("Authorization", format!("Bearer {}", access_token))
        .json(&json!({
            "current_password": "correctpw1",
            "new_password": "brand-new-pw1"
        }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());

    let old = login(&app, "user1", "correctpw1").await;
    assert_eq!(401, old.status().as_u16());

    let new = login(&app, "user1", "brand-new-pw1").await;
    assert_eq!(200, new.status().as_u16());
}

#[tokio::test]
async fn change_password_revokes_refresh_tokens_on_other_devices() {
    let app = spawn_app().await;
    seed_user(&app.db_pool, "user1", "user1@example.com", "correctpw1", true).await;

    // Two devices, two sessions.
    let device_a: Value = login(&app, "user1", "correctpw1").await.json().await.unwrap();
    let device_b: Value = login(&app, "user1", "correctpw1").await.json().await.unwrap();
    let access_a = device_a["access_token"].as_str().unwrap();
    let refresh_b = device_b["refresh_token"].as_str().unwrap();

    // The invalidation watermark has one-second granularity; make sure
    // the change lands in a later second than the logins.
    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;

    let response = reqwest::Client::new()
        .post(&format!("{}/auth/change-password", &app.address))
        .header("Authorization", format!("Bearer {}", access_a))
        .json(&json!({
            "current_password": "correctpw1",
            "new_password": "brand-new-pw1"
        }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());

    // Device B's refresh token predates the change and is now dead.
    let refresh = reqwest::Client::new()
        .post(&format!("{}/auth/refresh", &app.address))
        .json(&json!({ "refresh_token": refresh_b }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, refresh.status().as_u16());
    let body: Value = refresh.json().await.expect("Failed to parse response");
    assert_eq!(body["code"], "SESSION_EXPIRED");

    // A fresh login with the new password works immediately.
    let relogin = login(&app, "user1", "brand-new-pw1").await;
    assert_eq!(200, relogin.status().as_u16());
}

// --- Session Lifecycle Scenario ---

#[tokio::test]
async fn full_session_lifecycle() {
    let app = spawn_app().await;
    let user_id = seed_user(&app.db_pool, "user1", "user1@example.com", "correctpw1", true).await;
    let client = reqwest::Client::new();

    // Login.
    let session: Value = login(&app, "user1", "correctpw1").await.json().await.unwrap();
    let access = session["access_token"].as_str().unwrap();
    let refresh = session["refresh_token"].as_str().unwrap();

    // The access token resolves to the right user.
    let me: Value = client
        .get(&format!("{}/auth/me", &app.address))
        .header("Authorization", format!("Bearer {}", access))
        .send()
        .await
        .expect("Failed to execute request.")
        .json()
        .await
        .unwrap();
    assert_eq!(me["id"], user_id);

    // Rotate.
    let rotated: Value = client
        .post(&format!("{}/auth/refresh", &app.address))
        .json(&json!({ "refresh_token": refresh }))
        .send()
        .await
        .expect("Failed to execute request.")
        .json()
        .await
        .unwrap();
    let refresh2 = rotated["refresh_token"].as_str().unwrap();

    // The consumed refresh token is gone.
    let replay = client
        .post(&format!("{}/auth/refresh", &app.address))
        .json(&json!({ "refresh_token": refresh }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(401, replay.status().as_u16());

    // Logout the rotated session.
    let logout = client
        .post(&format!("{}/auth/logout", &app.address))
        .json(&json!({ "refresh_token": refresh2 }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, logout.status().as_u16());

    // The logged-out refresh token no longer works either.
    let after_logout = client
        .post(&format!("{}/auth/refresh", &app.address))
        .json(&json!({ "refresh_token": refresh2 }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(401, after_logout.status().as_u16());
}

// --- Revocation Registry Tests ---

#[tokio::test]
async fn revoke_is_idempotent_and_first_caller_wins() {
    let app = spawn_app().await;
    let token_id = uuid::Uuid::new_v4();
    let expires_at = chrono::Utc::now() + chrono::Duration::days(7);

    let first = revocation::revoke_token(&app.db_pool, token_id, RevocationReason::Rotated, expires_at)
        .await
        .expect("Failed to revoke");
    let second = revocation::revoke_token(&app.db_pool, token_id, RevocationReason::Logout, expires_at)
        .await
        .expect("Repeat revoke must not error");

    assert!(first, "First revocation claims the token");
    assert!(!second, "Second revocation is a no-op");
    assert!(revocation::is_token_revoked(&app.db_pool, token_id).await.unwrap());
}

#[tokio::test]
async fn sweep_removes_only_expired_entries() {
    let app = spawn_app().await;
    let now = chrono::Utc::now();

    let expired_id = uuid::Uuid::new_v4();
    let live_id = uuid::Uuid::new_v4();
    revocation::revoke_token(&app.db_pool, expired_id, RevocationReason::Logout, now - chrono::Duration::hours(1))
        .await
        .unwrap();
    revocation::revoke_token(&app.db_pool, live_id, RevocationReason::Logout, now + chrono::Duration::hours(1))
        .await
        .unwrap();

    let removed = revocation::sweep_expired(&app.db_pool, now).await.unwrap();

    assert_eq!(1, removed);
    assert!(!revocation::is_token_revoked(&app.db_pool, expired_id).await.unwrap());
    assert!(revocation::is_token_revoked(&app.db_pool, live_id).await.unwrap());
}
