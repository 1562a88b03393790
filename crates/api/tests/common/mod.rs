//! Common test utilities for integration tests.
//!
//! These helpers run against a real PostgreSQL database named by
//! `TEST_DATABASE_URL`. When the variable is unset, `test_pool` returns
//! `None` and the tests return early.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request},
    Router,
};
use domain::services::InMemoryAssetStore;
use pickup_api::{app::create_app, config::Config};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Connects to the test database and applies migrations.
pub async fn test_pool() -> Option<PgPool> {
    let database_url = std::env::var("TEST_DATABASE_URL").ok()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    run_migrations(&pool).await;
    Some(pool)
}

/// Applies every migration file in order, ignoring ones already applied.
pub async fn run_migrations(pool: &PgPool) {
    let migration_dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .join("persistence/src/migrations");

    let mut entries: Vec<_> = std::fs::read_dir(&migration_dir)
        .expect("Failed to read migrations directory")
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().map(|ext| ext == "sql").unwrap_or(false))
        .collect();

    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let sql = std::fs::read_to_string(entry.path()).expect("Failed to read migration file");
        // Re-running a migration fails on existing objects.
        let _ = sqlx::raw_sql(&sql).execute(pool).await;
    }
}

/// Test configuration pointing at the test database.
///
/// Signed links are issued by the in-memory asset store, so the route must
/// verify with the same secret.
pub fn test_config() -> Config {
    let url = std::env::var("TEST_DATABASE_URL").unwrap_or_default();
    Config::load_for_test(&[
        ("database.url", url.as_str()),
        ("assets.signing_secret", InMemoryAssetStore::SIGNING_SECRET),
    ])
    .expect("Failed to build test config")
}

/// App on PostgreSQL with thumbnails kept in memory.
pub fn create_test_app(pool: PgPool) -> (Router, Arc<InMemoryAssetStore>) {
    let assets = Arc::new(InMemoryAssetStore::new());
    let app = create_app(test_config(), pool, assets.clone());
    (app, assets)
}

/// A user, a location and one court on it, unique per call.
pub struct Fixture {
    pub user_id: i64,
    pub address: String,
    pub postal_code: String,
    pub court_number: i32,
}

pub async fn seed_fixture(pool: &PgPool) -> Fixture {
    let user_id = seed_user(pool).await;
    let address = format!("{} Test Ave", &Uuid::new_v4().simple().to_string()[..12]);
    let postal_code = "V1V1V1".to_string();

    sqlx::query("INSERT INTO locations (address, postal_code, city) VALUES ($1, $2, 'Kelowna')")
        .bind(&address)
        .bind(&postal_code)
        .execute(pool)
        .await
        .expect("Failed to seed location");

    sqlx::query("INSERT INTO courts (court_number, address, postal_code) VALUES (1, $1, $2)")
        .bind(&address)
        .bind(&postal_code)
        .execute(pool)
        .await
        .expect("Failed to seed court");

    Fixture {
        user_id,
        address,
        postal_code,
        court_number: 1,
    }
}

pub async fn seed_user(pool: &PgPool) -> i64 {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO users (email, first_name, last_name)
        VALUES ($1, 'Test', 'Player')
        RETURNING user_id
        "#,
    )
    .bind(format!("player_{}@example.com", Uuid::new_v4()))
    .fetch_one(pool)
    .await
    .expect("Failed to seed user")
}

const BOUNDARY: &str = "pickup-integration-boundary";

/// Builds the multipart create-game request for `fixture`.
pub fn create_game_request(
    fixture: &Fixture,
    date_time: &str,
    capacity: i32,
    format: &str,
    title: &str,
    thumbnail: Option<(&str, &[u8])>,
) -> Request<Body> {
    let mut body = Vec::new();
    let mut text = |name: &str, value: String| {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    };

    text(
        "location",
        serde_json::json!({
            "address": fixture.address,
            "postalCode": fixture.postal_code,
            "courtNumber": fixture.court_number,
        })
        .to_string(),
    );
    text(
        "reservation",
        serde_json::json!({ "dateTime": date_time }).to_string(),
    );
    text(
        "game",
        serde_json::json!({ "capacity": capacity, "type": format }).to_string(),
    );
    text(
        "gameInvite",
        serde_json::json!({ "title": title, "description": "Integration game" }).to_string(),
    );
    text("userID", fixture.user_id.to_string());

    if let Some((file_name, bytes)) = thumbnail {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"thumbnail\"; filename=\"{}\"\r\nContent-Type: image/png\r\n\r\n",
                BOUNDARY, file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri("/api/v1/games")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

pub fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn parse_response_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null)
}
