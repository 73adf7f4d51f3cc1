//! API request/response models for table categories.

use super::reservations::{require_positive, require_text};
use crate::db::models::table_categories::TableCategoryDBResponse;
use crate::errors::Error;
use crate::types::{BranchId, TableCategoryId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;
use utoipa::ToSchema;

/// Request body for creating a table category.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TableCategoryCreate {
    #[schema(example = "Booth")]
    pub name: String,
    pub description: Option<String>,
    /// Defaults to 1
    pub min_capacity: Option<i32>,
    /// Defaults to 4
    pub max_capacity: Option<i32>,
    /// Deposit/price classification (sent/returned as string to preserve precision)
    #[schema(value_type = Option<String>, example = "25.00")]
    pub price: Option<Decimal>,
}

impl TableCategoryCreate {
    pub fn validate(&self) -> Result<(), Error> {
        require_text("name", &self.name)?;
        validate_capacity_range(self.min_capacity, self.max_capacity)?;
        validate_price(self.price)
    }
}

/// Request body for updating a table category. Only provided fields change.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct TableCategoryUpdate {
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub min_capacity: Option<i32>,
    pub max_capacity: Option<i32>,
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
}

impl TableCategoryUpdate {
    pub fn validate(&self) -> Result<(), Error> {
        if let Some(name) = &self.name {
            require_text("name", name)?;
        }
        validate_capacity_range(self.min_capacity, self.max_capacity)?;
        validate_price(self.price)
    }
}

fn validate_capacity_range(min: Option<i32>, max: Option<i32>) -> Result<(), Error> {
    require_positive("min_capacity", min)?;
    require_positive("max_capacity", max)?;
    if let (Some(min), Some(max)) = (min, max)
        && min > max
    {
        return Err(Error::bad_request("min_capacity cannot exceed max_capacity"));
    }
    Ok(())
}

fn validate_price(price: Option<Decimal>) -> Result<(), Error> {
    match price {
        Some(p) if p.is_sign_negative() => Err(Error::bad_request("price cannot be negative")),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TableCategoryResponse {
    pub id: TableCategoryId,
    pub branch_id: BranchId,
    pub name: String,
    pub description: Option<String>,
    pub min_capacity: i32,
    pub max_capacity: i32,
    #[schema(value_type = String)]
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TableCategoryDBResponse> for TableCategoryResponse {
    fn from(db: TableCategoryDBResponse) -> Self {
        Self {
            id: db.id,
            branch_id: db.branch_id,
            name: db.name,
            description: db.description,
            min_capacity: db.min_capacity,
            max_capacity: db.max_capacity,
            price: db.price,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
