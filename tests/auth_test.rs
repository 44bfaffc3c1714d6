#![allow(clippy::unwrap_used)]

mod common;

use axum::Router;
use axum::http::StatusCode;
use migration::{Migrator, MigratorTrait};
use serde_json::json;
use tempfile::TempDir;

use gamehub_api::config::{Config, Environment};
use gamehub_api::state::AppState;
use gamehub_api::storage::AssetStore;

async fn test_app() -> (Router, TempDir) {
    let db = sea_orm::Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();

    let uploads = tempfile::tempdir().unwrap();

    let state = AppState {
        db,
        config: Config {
            database_url: String::new(),
            server_host: std::net::IpAddr::from([127, 0, 0, 1]),
            server_port: 0,
            environment: Environment::Development,
            log_level: "warn".to_string(),
            jwt_secret: "test-secret-key-for-testing-only-32chars".to_string(),
            jwt_expiration_secs: 900,
            upload_dir: uploads.path().to_string_lossy().into_owned(),
            placeholder_image: "https://picsum.photos/400/225".to_string(),
            frontend_url: "http://localhost:3001".to_string(),
        },
        assets: AssetStore::new(uploads.path()),
    };

    (gamehub_api::routes::router().with_state(state), uploads)
}

fn signup_body(suffix: &str) -> serde_json::Value {
    json!({
        "email": format!("player{suffix}@example.com"),
        "username": format!("player{suffix}"),
        "password": "SecurePass123!",
    })
}

#[tokio::test]
async fn signup_returns_user_and_token() {
    let (app, _uploads) = test_app().await;

    let (status, body) =
        common::post_json(&app, "/api/v1/auth/signup/email", &signup_body("s1")).await;

    assert_eq!(status, StatusCode::CREATED, "{body}");
    let v: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(v["user"]["email"], "players1@example.com");
    assert_eq!(v["user"]["username"], "players1");
    assert_eq!(v["user"]["role"], "user");
    assert!(v["token"].is_string());
}

#[tokio::test]
async fn signup_rejects_duplicate_email() {
    let (app, _uploads) = test_app().await;

    let (status, _) =
        common::post_json(&app, "/api/v1/auth/signup/email", &signup_body("s2")).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = common::post_json(
        &app,
        "/api/v1/auth/signup/email",
        &json!({
            "email": "players2@example.com",
            "username": "different_name",
            "password": "SecurePass123!",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn signup_rejects_invalid_input() {
    let (app, _uploads) = test_app().await;

    let (status, _) = common::post_json(
        &app,
        "/api/v1/auth/signup/email",
        &json!({ "email": "not-an-email", "username": "okname", "password": "SecurePass123!" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = common::post_json(
        &app,
        "/api/v1/auth/signup/email",
        &json!({ "email": "ok@example.com", "username": "okname", "password": "short" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn signin_round_trip() {
    let (app, _uploads) = test_app().await;

    common::post_json(&app, "/api/v1/auth/signup/email", &signup_body("s3")).await;

    let (status, body) = common::post_json(
        &app,
        "/api/v1/auth/signin/email",
        &json!({ "email": "players3@example.com", "password": "SecurePass123!" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let v: serde_json::Value = serde_json::from_str(&body).unwrap();
    let token = v["token"].as_str().unwrap();

    // The issued token authenticates protected routes
    let (status, body) = common::get_with_auth(&app, "/api/v1/users/me", token).await;
    assert_eq!(status, StatusCode::OK, "{body}");
}

#[tokio::test]
async fn signin_rejects_wrong_password() {
    let (app, _uploads) = test_app().await;

    common::post_json(&app, "/api/v1/auth/signup/email", &signup_body("s4")).await;

    let (status, _) = common::post_json(
        &app,
        "/api/v1/auth/signin/email",
        &json!({ "email": "players4@example.com", "password": "WrongPass123!" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn signin_unknown_email_is_unauthorized() {
    let (app, _uploads) = test_app().await;

    let (status, _) = common::post_json(
        &app,
        "/api/v1/auth/signin/email",
        &json!({ "email": "ghost@example.com", "password": "SecurePass123!" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_route_rejects_missing_and_bad_tokens() {
    let (app, _uploads) = test_app().await;

    let (status, _) = common::get(&app, "/api/v1/users/me").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = common::get_with_auth(&app, "/api/v1/users/me", "not-a-jwt").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
