use crate::AppState;
use crate::api::models::response::ApiResponse;
use crate::api::models::system::DbTestResponse;
use crate::errors::Result;
use axum::extract::State;
use chrono::{DateTime, Utc};

#[utoipa::path(
    get,
    path = "/db-test",
    tag = "system",
    summary = "Database connectivity check",
    responses(
        (status = 200, description = "Database reachable", body = ApiResponse<DbTestResponse>),
        (status = 500, description = "Database unreachable"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn db_test(State(state): State<AppState>) -> Result<ApiResponse<DbTestResponse>> {
    let mut conn = state.db.acquire().await?;
    let (server_time, version): (DateTime<Utc>, String) = sqlx::query_as("SELECT NOW(), version()")
        .fetch_one(&mut *conn)
        .await?;

    Ok(ApiResponse::ok(DbTestResponse { server_time, version }))
}
