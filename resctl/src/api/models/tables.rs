//! API request/response models for reservable tables.

use super::reservations::{require_positive, require_text};
use crate::booking::TableStatus;
use crate::db::models::tables::TableDBResponse;
use crate::errors::Error;
use crate::types::{BranchId, SectionId, TableCategoryId, TableId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

/// Query parameters for listing tables
#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListTablesQuery {
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub section_id: Option<SectionId>,
    pub status: Option<TableStatus>,
}

/// Request body for creating a table.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TableCreate {
    pub section_id: SectionId,
    pub category_id: Option<TableCategoryId>,
    /// Unique within the branch
    #[schema(example = "T12")]
    pub table_number: String,
    #[schema(example = 4)]
    pub capacity: i32,
    /// Defaults to `available`
    pub status: Option<TableStatus>,
    /// Minutes; defaults to 60
    pub min_reservation_duration: Option<i32>,
    /// Minutes; defaults to 180
    pub max_reservation_duration: Option<i32>,
    /// Booking slot granularity in minutes; defaults to 15
    pub reservation_interval: Option<i32>,
    /// Defaults to true
    pub is_active: Option<bool>,
}

impl TableCreate {
    pub fn validate(&self) -> Result<(), Error> {
        require_text("table_number", &self.table_number)?;
        require_positive("capacity", Some(self.capacity))?;
        require_positive("min_reservation_duration", self.min_reservation_duration)?;
        require_positive("max_reservation_duration", self.max_reservation_duration)?;
        require_positive("reservation_interval", self.reservation_interval)?;
        if let (Some(min), Some(max)) = (self.min_reservation_duration, self.max_reservation_duration)
            && min > max
        {
            return Err(Error::bad_request(
                "min_reservation_duration cannot exceed max_reservation_duration",
            ));
        }
        Ok(())
    }
}

/// Request body for updating a table. Only provided fields change; `category_id: null`
/// detaches the category.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct TableUpdate {
    pub section_id: Option<SectionId>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    #[schema(value_type = Option<i64>)]
    pub category_id: Option<Option<TableCategoryId>>,
    pub table_number: Option<String>,
    pub capacity: Option<i32>,
    pub status: Option<TableStatus>,
    pub min_reservation_duration: Option<i32>,
    pub max_reservation_duration: Option<i32>,
    pub reservation_interval: Option<i32>,
    pub is_active: Option<bool>,
}

impl TableUpdate {
    pub fn validate(&self) -> Result<(), Error> {
        if let Some(number) = &self.table_number {
            require_text("table_number", number)?;
        }
        require_positive("capacity", self.capacity)?;
        require_positive("min_reservation_duration", self.min_reservation_duration)?;
        require_positive("max_reservation_duration", self.max_reservation_duration)?;
        require_positive("reservation_interval", self.reservation_interval)?;
        Ok(())
    }
}

/// Request body for `PATCH /tables/{id}/status`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TableStatusUpdate {
    pub status: TableStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TableResponse {
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

impl From<TableDBResponse> for TableResponse {
    fn from(db: TableDBResponse) -> Self {
        Self {
            id: db.id,
            branch_id: db.branch_id,
            section_id: db.section_id,
            section_name: db.section_name,
            category_id: db.category_id,
            category_name: db.category_name,
            table_number: db.table_number,
            capacity: db.capacity,
            status: db.status,
            min_reservation_duration: db.min_reservation_duration,
            max_reservation_duration: db.max_reservation_duration,
            reservation_interval: db.reservation_interval,
            is_active: db.is_active,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_validation() {
        let mut create: TableCreate = serde_json::from_value(json!({
            "section_id": 1,
            "table_number": "T1",
            "capacity": 4
        }))
        .unwrap();
        assert!(create.validate().is_ok());

        create.capacity = 0;
        assert!(create.validate().is_err());

        create.capacity = 4;
        create.min_reservation_duration = Some(120);
        create.max_reservation_duration = Some(60);
        assert!(create.validate().is_err());
    }

    #[test]
    fn test_update_category_can_be_cleared() {
        let update: TableUpdate = serde_json::from_value(json!({"category_id": null})).unwrap();
        assert_eq!(update.category_id, Some(None));

        let untouched: TableUpdate = serde_json::from_value(json!({"capacity": 6})).unwrap();
        assert_eq!(untouched.category_id, None);
    }
}
