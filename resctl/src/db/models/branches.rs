//! Database models for branches (tenants).

use crate::types::BranchId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A franchise branch. Every other record is scoped to one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct BranchDBResponse {
    pub id: BranchId,
    pub slug: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}
