//! API models for service diagnostics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Result of the database connectivity check.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DbTestResponse {
    /// `NOW()` as reported by the database
    pub server_time: DateTime<Utc>,
    /// `version()` string of the PostgreSQL server
    pub version: String,
}
