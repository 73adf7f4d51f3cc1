//! API request/response models for sections (seating areas).

use super::reservations::require_text;
use crate::db::models::sections::SectionDBResponse;
use crate::errors::Error;
use crate::types::{BranchId, SectionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;
use utoipa::ToSchema;

/// Request body for creating a section.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SectionCreate {
    /// Unique within the branch
    #[schema(example = "Terrace")]
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_smoking: bool,
    #[serde(default)]
    pub is_outdoor: bool,
    #[serde(default)]
    pub is_vip: bool,
    /// Defaults to true
    pub is_active: Option<bool>,
}

impl SectionCreate {
    pub fn validate(&self) -> Result<(), Error> {
        require_text("name", &self.name)
    }
}

/// Request body for updating a section. Only provided fields change.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SectionUpdate {
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub is_smoking: Option<bool>,
    pub is_outdoor: Option<bool>,
    pub is_vip: Option<bool>,
    pub is_active: Option<bool>,
}

impl SectionUpdate {
    pub fn validate(&self) -> Result<(), Error> {
        match &self.name {
            Some(name) => require_text("name", name),
            None => Ok(()),
        }
    }
}

/// A section with the capacity derived from its active tables.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SectionResponse {
    pub id: SectionId,
    pub branch_id: BranchId,
    pub name: String,
    pub description: Option<String>,
    pub is_smoking: bool,
    pub is_outdoor: bool,
    pub is_vip: bool,
    pub is_active: bool,
    /// Number of active tables in the section
    pub table_count: i64,
    /// Sum of the active tables' capacity
    pub total_capacity: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SectionDBResponse> for SectionResponse {
    fn from(db: SectionDBResponse) -> Self {
        Self {
            id: db.id,
            branch_id: db.branch_id,
            name: db.name,
            description: db.description,
            is_smoking: db.is_smoking,
            is_outdoor: db.is_outdoor,
            is_vip: db.is_vip,
            is_active: db.is_active,
            table_count: db.table_count,
            total_capacity: db.total_capacity,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
