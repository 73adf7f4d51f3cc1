//! Test utilities for handler and router tests.

use crate::config::Config;
use crate::types::BranchId;
use crate::{AppState, build_router};
use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{Value, json};
use sqlx::PgPool;

/// Configuration for tests: metrics stay off since the Prometheus recorder is process-global.
pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        enable_metrics: false,
        enable_otel_export: false,
        ..Default::default()
    }
}

pub fn test_server(pool: PgPool) -> TestServer {
    test_server_with(pool, test_config())
}

pub fn test_server_with(pool: PgPool, config: Config) -> TestServer {
    let state = AppState::builder().db(pool).config(config).build();
    let router = build_router(&state).expect("Failed to build router");
    TestServer::new(router).expect("Failed to create test server")
}

/// Insert a branch directly; there is no API for managing branches.
pub async fn create_branch(pool: &PgPool, slug: &str) -> BranchId {
    sqlx::query_scalar("INSERT INTO branches (slug, name) VALUES ($1, $2) RETURNING id")
        .bind(slug)
        .bind(format!("Branch {slug}"))
        .fetch_one(pool)
        .await
        .expect("Failed to create branch")
}

pub async fn create_section(server: &TestServer, name: &str) -> i64 {
    let response = server.post("/api/postgres/sections").json(&json!({ "name": name })).await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()["data"]["id"].as_i64().expect("section id")
}

pub async fn create_table(server: &TestServer, section_id: i64, number: &str, capacity: i32) -> i64 {
    let response = server
        .post("/api/postgres/tables")
        .json(&json!({
            "section_id": section_id,
            "table_number": number,
            "capacity": capacity,
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()["data"]["id"].as_i64().expect("table id")
}

/// Book two guests in the default branch and return the created reservation.
pub async fn create_reservation(server: &TestServer, table_id: Option<i64>, date: &str, time: &str) -> Value {
    let response = server
        .post("/api/postgres/reservations")
        .json(&json!({
            "table_id": table_id,
            "customer_name": "Ada Lovelace",
            "customer_phone": "555-0100",
            "guest_count": 2,
            "reservation_date": date,
            "reservation_time": time,
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()["data"].clone()
}
