#![allow(clippy::unwrap_used)]

mod common;

use axum::Router;
use axum::http::StatusCode;
use migration::{Migrator, MigratorTrait};
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

#[tokio::test]
async fn root_health_is_ok() {
    let (app, _uploads) = test_app().await;

    let (status, body) = common::get(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    let v: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(v["status"], "ok");
}

#[tokio::test]
async fn api_health_reports_database_status() {
    let (app, _uploads) = test_app().await;

    let (status, body) = common::get(&app, "/api/v1/health").await;

    assert_eq!(status, StatusCode::OK);
    let v: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(v["status"], "ok");
    assert_eq!(v["database"], "connected");
}
