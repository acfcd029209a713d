//! Common test utilities

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tower::util::ServiceExt;

use game_platform::api::{build_router, AppState};
use game_platform::clock::FixedClock;
use game_platform::Config;

/// Wednesday 2018-07-18 12:00 UTC, the instant test clocks start at
pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2018, 7, 18, 12, 0, 0).unwrap()
}

/// Default configuration with the cheapest password hashing
pub fn test_config() -> Config {
    Config::from_lookup(|key| match key {
        "PASSWORD_HASH_COST" => Some("4".to_string()),
        _ => None,
    })
    .unwrap()
}

/// Router over the memory drivers, with a clock frozen at [`test_now`]
pub fn test_app() -> (Router, Arc<FixedClock>) {
    let clock = Arc::new(FixedClock::new(test_now()));
    let state = AppState::in_memory(&test_config(), clock.clone());
    (build_router(state), clock)
}

/// Send a request and return the status with the parsed JSON body (`Null` when empty)
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    user: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(user) = user {
        builder = builder.header("X-Request-User-Id", user);
    }

    let body = match body {
        Some(json) => Body::from(json.to_string()),
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, json)
}

/// Register a user and return its id
pub async fn create_user(app: &Router, email: &str, username: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/v1/users",
        None,
        Some(serde_json::json!({
            "email": email,
            "username": username,
            "password": "hunter22"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "User creation failed: {body}");
    body["id"].as_str().unwrap().to_string()
}

/// Credit a user's purse with GBP
pub async fn fund_user(app: &Router, user_id: &str, amount: i64) {
    let (status, body) = send(
        app,
        "POST",
        &format!("/api/v1/users/{}/purse/credit", user_id),
        None,
        Some(serde_json::json!({ "amount": { "amount": amount, "currency": "GBP" } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "Credit failed: {body}");
}

/// Schedule a GBP game with a 500 buy-in and return its id
pub async fn create_game(app: &Router, start: DateTime<Utc>, players: u32) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/v1/games",
        None,
        Some(serde_json::json!({
            "game_type": "GENERAL_KNOWLEDGE",
            "buy_in": { "amount": 500, "currency": "GBP" },
            "max": { "amount": 1000, "currency": "GBP" },
            "min": { "amount": 100, "currency": "GBP" },
            "start": start,
            "players": players
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "Game creation failed: {body}");
    body["id"].as_str().unwrap().to_string()
}

/// Connect to DATABASE_URL and empty every table
pub async fn setup_test_db() -> PgPool {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    sqlx::query(
        "TRUNCATE TABLE entry_fees, game_entries, admin_bank, user_purses, games, users CASCADE",
    )
        .execute(&pool)
        .await
        .expect("Failed to clean up DB");

    pool
}
