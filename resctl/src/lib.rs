//! # resctl: Reservation Control Layer
//!
//! `resctl` is the admin backend for a restaurant franchise: staff use it to manage reservations,
//! dining sections, tables and table categories, and to read the occupancy calendar, the daily
//! dashboard and reservation reports. Every branch of the franchise is a tenant with its own,
//! fully isolated data.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for the HTTP layer and
//! uses PostgreSQL (through [sqlx](https://github.com/launchbadge/sqlx)) for all persistence.
//!
//! ### Request Flow
//!
//! The JSON API lives under `/api/postgres`, and again under `/{tenant}/api/postgres`. For every
//! request the [`tenancy::Tenant`] extractor resolves the branch from the path, the tenant header
//! or the configured default, and the handler passes that branch id to the repositories in
//! [`db::handlers`], which scope every statement by it. Reservation writes run in a transaction
//! together with their audit row in `reservation_history`.
//!
//! ### Core Components
//!
//! The **API layer** ([`api`]) holds the handlers and the request/response models, all
//! documented with `utoipa` and served as an OpenAPI document with a Scalar UI at `/docs`.
//!
//! The **database layer** ([`db`]) uses the repository pattern: one repository per table, each
//! borrowing a connection or transaction for the duration of a request.
//!
//! The **domain layer** is plain Rust without I/O: [`booking`] holds the reservation lifecycle
//! and booking windows, [`occupancy`] the calendar aggregation and [`reports`] the date and time
//! bucketing.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use resctl::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = resctl::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     resctl::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Database Setup
//!
//! Migrations are embedded and run on startup:
//!
//! ```no_run
//! # use sqlx::PgPool;
//! # async fn example(pool: PgPool) -> Result<(), sqlx::migrate::MigrateError> {
//! resctl::migrator().run(&pool).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.
pub mod api;
pub mod booking;
pub mod config;
pub mod db;
pub mod errors;
pub mod occupancy;
mod openapi;
pub mod reports;
pub mod telemetry;
pub mod tenancy;
pub mod types;

#[cfg(test)]
pub mod test_utils;

use crate::config::CorsOrigin;
use crate::openapi::ApiDoc;
use axum::http::HeaderValue;
use axum::{
    Json, Router, http,
    routing::{delete, get, patch, post, put},
};
use axum_prometheus::PrometheusMetricLayer;
use bon::Builder;
pub use config::Config;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

/// Path the JSON API is served under, with or without a leading `/{tenant}` segment.
pub const API_PREFIX: &str = "/api/postgres";

/// Application state shared across all request handlers.
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .db(pool)
///     .config(config)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
}

/// Get the resctl database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    for origin in &config.cors.allowed_origins {
        let header_value = match origin {
            CorsOrigin::Wildcard => "*".parse::<HeaderValue>()?,
            CorsOrigin::Url(url) => url.as_str().trim_end_matches('/').parse::<HeaderValue>()?,
        };
        origins.push(header_value);
    }

    let mut cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            http::Method::GET,
            http::Method::POST,
            http::Method::PUT,
            http::Method::PATCH,
            http::Method::DELETE,
        ])
        .allow_headers([
            http::header::CONTENT_TYPE,
            http::HeaderName::from_bytes(config.tenancy.tenant_header.as_bytes())?,
        ])
        .allow_credentials(config.cors.allow_credentials)
        .expose_headers(vec![http::header::LOCATION]);

    if let Some(max_age) = config.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// The JSON API, mounted once per prefix by [`build_router`].
fn api_routes(state: &AppState) -> Router {
    Router::new()
        // Reservations
        .route(
            "/reservations",
            get(api::handlers::reservations::list_reservations).post(api::handlers::reservations::create_reservation),
        )
        .route("/reservations/{id}", get(api::handlers::reservations::get_reservation))
        .route(
            "/reservations/{id}/status",
            patch(api::handlers::reservations::update_reservation_status),
        )
        .route("/update-reservation", put(api::handlers::reservations::update_reservation))
        .route("/delete-reservation", delete(api::handlers::reservations::delete_reservation))
        .route(
            "/reservation-history",
            get(api::handlers::reservations::list_reservation_history),
        )
        // Sections
        .route("/list-sections", get(api::handlers::sections::list_active_sections))
        .route("/sections", get(api::handlers::sections::list_sections))
        .route("/sections", post(api::handlers::sections::create_section))
        .route("/sections/{id}", put(api::handlers::sections::update_section))
        .route("/sections/{id}", delete(api::handlers::sections::delete_section))
        // Tables
        .route("/tables", get(api::handlers::tables::list_tables))
        .route("/tables", post(api::handlers::tables::create_table))
        .route("/tables/{id}", put(api::handlers::tables::update_table))
        .route("/tables/{id}", delete(api::handlers::tables::delete_table))
        .route("/tables/{id}/status", patch(api::handlers::tables::update_table_status))
        // Table categories
        .route(
            "/table-categories",
            get(api::handlers::table_categories::list_table_categories)
                .post(api::handlers::table_categories::create_table_category),
        )
        .route(
            "/table-categories/{id}",
            put(api::handlers::table_categories::update_table_category)
                .delete(api::handlers::table_categories::delete_table_category),
        )
        // Derived views
        .route("/occupancy", get(api::handlers::analytics::get_occupancy))
        .route("/dashboard", get(api::handlers::analytics::get_dashboard))
        .route("/reports", get(api::handlers::analytics::get_reports))
        // Diagnostics
        .route("/db-test", get(api::handlers::system::db_test))
        .with_state(state.clone())
}

/// Build the main application router with all endpoints and middleware.
///
/// This function constructs the complete Axum router with:
/// - The JSON API under `/api/postgres` and `/{tenant}/api/postgres`
/// - `/healthz`, the OpenAPI document and the Scalar UI
/// - Optional Prometheus metrics at `/internal/metrics`
/// - CORS configuration
/// - Tracing middleware
///
/// Everything is nested under `base_path` when one is configured.
///
/// # Errors
///
/// Returns an error if CORS configuration is invalid.
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    let api = api_routes(state);

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .nest(API_PREFIX, api.clone())
        .nest(&format!("/{{{}}}{API_PREFIX}", tenancy::TENANT_PATH_PARAM), api)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    // Create CORS layer from config
    let cors_layer = create_cors_layer(&state.config)?;
    let mut router = router.layer(cors_layer);

    // Add Prometheus metrics if enabled. Domain counters recorded through the `metrics` facade
    // end up in the same registry.
    if state.config.enable_metrics {
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
        router = router
            .route("/internal/metrics", get(|| async move { metric_handle.render() }))
            .layer(prometheus_layer);
    }

    // Add tracing layer
    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    let base_path = state.config.base_path.as_str();
    if base_path.is_empty() {
        Ok(router)
    } else {
        debug!(base_path, "Nesting router under base path");
        Ok(Router::new().nest(base_path, router))
    }
}

/// Main application struct that owns all resources.
///
/// # Lifecycle
///
/// 1. **Create**: [`Application::new`] connects the pool, runs migrations and builds the router
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and starts handling requests
/// 3. **Shutdown**: When the shutdown signal is received, drains requests and closes the pool
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting reservation service with configuration: {:#?}", config);

        let pool = db::pools::connect(&config.database).await?;
        migrator().run(&pool).await?;
        info!("Database migrations applied");

        let app_state = AppState::builder().db(pool.clone()).config(config.clone()).build();
        let router = build_router(&app_state)?;

        Ok(Self { router, config, pool })
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Reservation service listening on http://{}, API at http://localhost:{}{}{}",
            bind_addr, self.config.port, self.config.base_path, API_PREFIX
        );

        // Run the server with graceful shutdown
        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        // Close database connections
        info!("Closing database connections...");
        self.pool.close().await;

        // Shutdown telemetry
        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::test_utils::{test_config, test_server, test_server_with};
    use axum_test::TestServer;
    use serde_json::Value;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_healthz_and_openapi(pool: PgPool) {
        let server = test_server(pool);

        let health = server.get("/healthz").await;
        health.assert_status_ok();
        health.assert_text("OK");

        let doc: Value = server.get("/api-docs/openapi.json").await.json();
        assert!(doc["paths"]["/reservations"].is_object());

        server.get("/docs").await.assert_status_ok();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_base_path_nests_everything(pool: PgPool) {
        let mut config = test_config();
        config.base_path = "/admin".to_string();
        let server = test_server_with(pool, config);

        server.get("/admin/healthz").await.assert_status_ok();
        server.get("/admin/api/postgres/sections").await.assert_status_ok();
        server.get("/api/postgres/sections").await.assert_status_not_found();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_tenant_path_and_numeric_id(pool: PgPool) {
        let server = test_server(pool);

        server.get("/main/api/postgres/sections").await.assert_status_ok();
        server.get("/1/api/postgres/sections").await.assert_status_ok();
        server.get("/42/api/postgres/sections").await.assert_status_not_found();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_metrics_endpoint_absent_when_disabled(pool: PgPool) {
        let server: TestServer = test_server(pool);
        server.get("/internal/metrics").await.assert_status_not_found();
    }
}
