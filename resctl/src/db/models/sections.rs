//! Database models for sections.

use crate::api::models::sections::{SectionCreate, SectionUpdate};
use crate::types::{BranchId, SectionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database request for creating a section
#[derive(Debug, Clone)]
pub struct SectionCreateDBRequest {
    pub name: String,
    pub description: Option<String>,
    pub is_smoking: bool,
    pub is_outdoor: bool,
    pub is_vip: bool,
    pub is_active: bool,
}

impl From<SectionCreate> for SectionCreateDBRequest {
    fn from(create: SectionCreate) -> Self {
        Self {
            name: create.name.trim().to_string(),
            description: create.description,
            is_smoking: create.is_smoking,
            is_outdoor: create.is_outdoor,
            is_vip: create.is_vip,
            is_active: create.is_active.unwrap_or(true),
        }
    }
}

/// Database request for updating a section
#[derive(Debug, Clone, Default)]
pub struct SectionUpdateDBRequest {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub is_smoking: Option<bool>,
    pub is_outdoor: Option<bool>,
    pub is_vip: Option<bool>,
    pub is_active: Option<bool>,
}

impl From<SectionUpdate> for SectionUpdateDBRequest {
    fn from(update: SectionUpdate) -> Self {
        Self {
            name: update.name.map(|n| n.trim().to_string()),
            description: update.description,
            is_smoking: update.is_smoking,
            is_outdoor: update.is_outdoor,
            is_vip: update.is_vip,
            is_active: update.is_active,
        }
    }
}

/// Section row plus the aggregates derived from its active tables
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SectionDBResponse {
    pub id: SectionId,
    pub branch_id: BranchId,
    pub name: String,
    pub description: Option<String>,
    pub is_smoking: bool,
    pub is_outdoor: bool,
    pub is_vip: bool,
    pub is_active: bool,
    pub table_count: i64,
    pub total_capacity: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
