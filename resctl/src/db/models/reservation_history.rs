//! Database models for the reservation audit trail.

use crate::types::{BranchId, HistoryId, ReservationId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// What happened to the reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    Created,
    Updated,
    StatusChanged,
    Deleted,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ReservationHistoryDBResponse {
    pub id: HistoryId,
    pub branch_id: BranchId,
    pub reservation_id: ReservationId,
    pub action: HistoryAction,
    pub snapshot: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
