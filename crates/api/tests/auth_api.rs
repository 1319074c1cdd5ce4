//! HTTP-level integration tests for the auth endpoints.
//!
//! Tests cover registration, login, token refresh with rotation, logout,
//! and the validation and uniqueness failure paths.

mod common;

use axum::http::StatusCode;
use common::{body_json, post_json, post_json_auth};
use sqlx::PgPool;

use ecuflow_api::auth::password::hash_password;
use ecuflow_core::roles::ROLE_OPERATOR;
use ecuflow_db::models::user::CreateUser;
use ecuflow_db::repositories::{RoleRepo, UserRepo};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Register a user via the API and return the JSON auth response.
async fn register_user(app: axum::Router, username: &str, password: &str) -> serde_json::Value {
    let body = serde_json::json!({
        "username": username,
        "email": format!("{username}@test.com"),
        "password": password,
        "display_name": format!("{username} display"),
    });
    let response = post_json(app, "/api/v1/auth/register", body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

/// Log in a user via the API and return the JSON auth response.
async fn login_user(app: axum::Router, username: &str, password: &str) -> serde_json::Value {
    let body = serde_json::json!({ "username": username, "password": password });
    let response = post_json(app, "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

/// Registration creates a requester account and returns tokens.
#[sqlx::test(migrations = "../../db/migrations")]
async fn register_creates_requester(pool: PgPool) {
    let app = common::build_test_app(pool).await;

    let json = register_user(app, "fresh", "long-enough-password").await;

    assert!(json["access_token"].is_string());
    assert!(json["refresh_token"].is_string());
    assert_eq!(json["user"]["username"], "fresh");
    assert_eq!(json["user"]["role"], "requester");
}

/// Registering the same username twice returns 409.
#[sqlx::test(migrations = "../../db/migrations")]
async fn register_duplicate_username_conflicts(pool: PgPool) {
    let app = common::build_test_app(pool.clone()).await;
    register_user(app, "dupe", "long-enough-password").await;

    let app = common::build_test_app(pool).await;
    let body = serde_json::json!({
        "username": "dupe",
        "email": "other@test.com",
        "password": "long-enough-password",
        "display_name": "Other",
    });
    let response = post_json(app, "/api/v1/auth/register", body).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

/// A malformed registration (short password, bad email) returns 400.
#[sqlx::test(migrations = "../../db/migrations")]
async fn register_rejects_invalid_input(pool: PgPool) {
    let app = common::build_test_app(pool).await;

    let body = serde_json::json!({
        "username": "x",
        "email": "not-an-email",
        "password": "short",
        "display_name": "",
    });
    let response = post_json(app, "/api/v1/auth/register", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

/// Successful login returns 200 with tokens and user info.
#[sqlx::test(migrations = "../../db/migrations")]
async fn login_success(pool: PgPool) {
    let app = common::build_test_app(pool.clone()).await;
    let registered = register_user(app, "loginuser", "long-enough-password").await;

    let app = common::build_test_app(pool).await;
    let json = login_user(app, "loginuser", "long-enough-password").await;

    assert!(json["access_token"].is_string());
    assert_eq!(json["user"]["id"], registered["user"]["id"]);
    assert_eq!(json["user"]["role"], "requester");
}

/// Login with an incorrect password returns 401.
#[sqlx::test(migrations = "../../db/migrations")]
async fn login_wrong_password(pool: PgPool) {
    let app = common::build_test_app(pool.clone()).await;
    register_user(app, "wrongpw", "long-enough-password").await;

    let app = common::build_test_app(pool).await;
    let body = serde_json::json!({ "username": "wrongpw", "password": "incorrect" });
    let response = post_json(app, "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// Login with a nonexistent username returns 401.
#[sqlx::test(migrations = "../../db/migrations")]
async fn login_nonexistent_user(pool: PgPool) {
    let app = common::build_test_app(pool).await;

    let body = serde_json::json!({ "username": "ghost", "password": "whatever" });
    let response = post_json(app, "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// Operators created out of band can log in and carry the operator role.
#[sqlx::test(migrations = "../../db/migrations")]
async fn login_operator_role_in_claims(pool: PgPool) {
    let role = RoleRepo::find_by_name(&pool, ROLE_OPERATOR)
        .await
        .unwrap()
        .expect("operator role seeded");
    let hashed = hash_password("operator-password").unwrap();
    UserRepo::create(
        &pool,
        &CreateUser {
            username: "ops".into(),
            email: "ops@test.com".into(),
            password_hash: hashed,
            display_name: "Ops".into(),
            role_id: role.id,
        },
    )
    .await
    .unwrap();

    let app = common::build_test_app(pool).await;
    let json = login_user(app, "ops", "operator-password").await;
    assert_eq!(json["user"]["role"], "operator");
}

// ---------------------------------------------------------------------------
// Refresh / logout
// ---------------------------------------------------------------------------

/// A valid refresh token returns new tokens and rotates the old one out.
#[sqlx::test(migrations = "../../db/migrations")]
async fn token_refresh_rotates(pool: PgPool) {
    let app = common::build_test_app(pool.clone()).await;
    let registered = register_user(app, "refresher", "long-enough-password").await;
    let refresh_token = registered["refresh_token"].as_str().unwrap();

    let app = common::build_test_app(pool.clone()).await;
    let body = serde_json::json!({ "refresh_token": refresh_token });
    let response = post_json(app, "/api/v1/auth/refresh", body).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_ne!(
        json["refresh_token"].as_str().unwrap(),
        refresh_token,
        "refresh token must rotate on use"
    );

    // The old token is revoked and cannot be used again.
    let app = common::build_test_app(pool).await;
    let body = serde_json::json!({ "refresh_token": refresh_token });
    let response = post_json(app, "/api/v1/auth/refresh", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// Logout revokes all sessions and returns 204.
#[sqlx::test(migrations = "../../db/migrations")]
async fn logout_revokes_sessions(pool: PgPool) {
    let app = common::build_test_app(pool.clone()).await;
    let registered = register_user(app, "leaver", "long-enough-password").await;
    let access_token = registered["access_token"].as_str().unwrap();
    let refresh_token = registered["refresh_token"].as_str().unwrap();

    let app = common::build_test_app(pool.clone()).await;
    let response = post_json_auth(
        app,
        "/api/v1/auth/logout",
        serde_json::json!({}),
        access_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // The refresh token no longer works.
    let app = common::build_test_app(pool).await;
    let body = serde_json::json!({ "refresh_token": refresh_token });
    let response = post_json(app, "/api/v1/auth/refresh", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
