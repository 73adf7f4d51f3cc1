//! Database models for table categories.

use crate::api::models::table_categories::{TableCategoryCreate, TableCategoryUpdate};
use crate::types::{BranchId, TableCategoryId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database request for creating a table category
#[derive(Debug, Clone)]
pub struct TableCategoryCreateDBRequest {
    pub name: String,
    pub description: Option<String>,
    pub min_capacity: i32,
    pub max_capacity: i32,
    pub price: Decimal,
}

impl From<TableCategoryCreate> for TableCategoryCreateDBRequest {
    fn from(create: TableCategoryCreate) -> Self {
        Self {
            name: create.name.trim().to_string(),
            description: create.description,
            min_capacity: create.min_capacity.unwrap_or(1),
            max_capacity: create.max_capacity.unwrap_or(4),
            price: create.price.unwrap_or(Decimal::ZERO),
        }
    }
}

/// Database request for updating a table category
#[derive(Debug, Clone, Default)]
pub struct TableCategoryUpdateDBRequest {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub min_capacity: Option<i32>,
    pub max_capacity: Option<i32>,
    pub price: Option<Decimal>,
}

impl From<TableCategoryUpdate> for TableCategoryUpdateDBRequest {
    fn from(update: TableCategoryUpdate) -> Self {
        Self {
            name: update.name.map(|n| n.trim().to_string()),
            description: update.description,
            min_capacity: update.min_capacity,
            max_capacity: update.max_capacity,
            price: update.price,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TableCategoryDBResponse {
    pub id: TableCategoryId,
    pub branch_id: BranchId,
    pub name: String,
    pub description: Option<String>,
    pub min_capacity: i32,
    pub max_capacity: i32,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
