//! Database models for tables.

use crate::api::models::tables::{TableCreate, TableUpdate};
use crate::booking::TableStatus;
use crate::types::{BranchId, SectionId, TableCategoryId, TableId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

pub const DEFAULT_MIN_RESERVATION_DURATION: i32 = 60;
pub const DEFAULT_MAX_RESERVATION_DURATION: i32 = 180;
pub const DEFAULT_RESERVATION_INTERVAL: i32 = 15;

/// Database request for creating a table
#[derive(Debug, Clone)]
pub struct TableCreateDBRequest {
    pub section_id: SectionId,
    pub category_id: Option<TableCategoryId>,
    pub table_number: String,
    pub capacity: i32,
    pub status: TableStatus,
    pub min_reservation_duration: i32,
    pub max_reservation_duration: i32,
    pub reservation_interval: i32,
    pub is_active: bool,
}

impl From<TableCreate> for TableCreateDBRequest {
    fn from(create: TableCreate) -> Self {
        Self {
            section_id: create.section_id,
            category_id: create.category_id,
            table_number: create.table_number.trim().to_string(),
            capacity: create.capacity,
            status: create.status.unwrap_or(TableStatus::Available),
            min_reservation_duration: create.min_reservation_duration.unwrap_or(DEFAULT_MIN_RESERVATION_DURATION),
            max_reservation_duration: create.max_reservation_duration.unwrap_or(DEFAULT_MAX_RESERVATION_DURATION),
            reservation_interval: create.reservation_interval.unwrap_or(DEFAULT_RESERVATION_INTERVAL),
            is_active: create.is_active.unwrap_or(true),
        }
    }
}

/// Database request for updating a table
#[derive(Debug, Clone, Default)]
pub struct TableUpdateDBRequest {
    pub section_id: Option<SectionId>,
    pub category_id: Option<Option<TableCategoryId>>,
    pub table_number: Option<String>,
    pub capacity: Option<i32>,
    pub status: Option<TableStatus>,
    pub min_reservation_duration: Option<i32>,
    pub max_reservation_duration: Option<i32>,
    pub reservation_interval: Option<i32>,
    pub is_active: Option<bool>,
}

impl From<TableUpdate> for TableUpdateDBRequest {
    fn from(update: TableUpdate) -> Self {
        Self {
            section_id: update.section_id,
            category_id: update.category_id,
            table_number: update.table_number.map(|n| n.trim().to_string()),
            capacity: update.capacity,
            status: update.status,
            min_reservation_duration: update.min_reservation_duration,
            max_reservation_duration: update.max_reservation_duration,
            reservation_interval: update.reservation_interval,
            is_active: update.is_active,
        }
    }
}

/// Table row with section and category names joined in
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TableDBResponse {
    pub id: TableId,
    pub branch_id: BranchId,
    pub section_id: SectionId,
    pub section_name: Option<String>,
    pub category_id: Option<TableCategoryId>,
    pub category_name: Option<String>,
    pub table_number: String,
    pub capacity: i32,
    pub status: TableStatus,
    pub min_reservation_duration: i32,
    pub max_reservation_duration: i32,
    pub reservation_interval: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Tables per coarse status, for the dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TableStatusCounts {
    pub available: i64,
    pub reserved: i64,
    pub occupied: i64,
    pub total: i64,
}
