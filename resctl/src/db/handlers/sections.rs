//! Database repository for sections.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::sections::{SectionCreateDBRequest, SectionDBResponse, SectionUpdateDBRequest},
};
use crate::types::{BranchId, Operation, SectionId};
use sqlx::{PgConnection, QueryBuilder};
use tracing::instrument;

/// Filter for listing sections
#[derive(Debug, Clone, Default)]
pub struct SectionFilter {
    /// Only sections with `is_active = true`
    pub active_only: bool,
}

impl SectionFilter {
    pub fn active_only() -> Self {
        Self { active_only: true }
    }
}

// Sections joined with the aggregates of their active tables
const SELECT_SECTIONS: &str = r#"
    SELECT s.id, s.branch_id, s.name, s.description, s.is_smoking, s.is_outdoor, s.is_vip, s.is_active,
           COUNT(t.id) AS table_count,
           COALESCE(SUM(t.capacity), 0)::BIGINT AS total_capacity,
           s.created_at, s.updated_at
    FROM sections s
    LEFT JOIN tables t ON t.section_id = s.id AND t.is_active
"#;

pub struct Sections<'c> {
    db: &'c mut PgConnection,
    branch_id: BranchId,
}

#[async_trait::async_trait]
impl<'c> Repository for Sections<'c> {
    type CreateRequest = SectionCreateDBRequest;
    type UpdateRequest = SectionUpdateDBRequest;
    type Response = SectionDBResponse;
    type Id = SectionId;
    type Filter = SectionFilter;

    #[instrument(skip(self, request), fields(branch_id = self.branch_id, name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let section = sqlx::query_as::<_, SectionDBResponse>(
            r#"
            INSERT INTO sections (branch_id, name, description, is_smoking, is_outdoor, is_vip, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, branch_id, name, description, is_smoking, is_outdoor, is_vip, is_active,
                      0::BIGINT AS table_count, 0::BIGINT AS total_capacity, created_at, updated_at
            "#,
        )
        .bind(self.branch_id)
        .bind(&request.name)
        .bind(&request.description)
        .bind(request.is_smoking)
        .bind(request.is_outdoor)
        .bind(request.is_vip)
        .bind(request.is_active)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(section)
    }

    #[instrument(skip(self), fields(branch_id = self.branch_id), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let section = sqlx::query_as::<_, SectionDBResponse>(&format!(
            "{SELECT_SECTIONS} WHERE s.id = $1 AND s.branch_id = $2 GROUP BY s.id"
        ))
        .bind(id)
        .bind(self.branch_id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(section)
    }

    #[instrument(skip(self), fields(branch_id = self.branch_id), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new(SELECT_SECTIONS);
        query.push(" WHERE s.branch_id = ");
        query.push_bind(self.branch_id);
        if filter.active_only {
            query.push(" AND s.is_active");
        }
        query.push(" GROUP BY s.id ORDER BY s.name");

        let sections = query.build_query_as::<SectionDBResponse>().fetch_all(&mut *self.db).await?;

        Ok(sections)
    }

    #[instrument(skip(self), fields(branch_id = self.branch_id), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let table_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tables WHERE section_id = $1 AND branch_id = $2")
            .bind(id)
            .bind(self.branch_id)
            .fetch_one(&mut *self.db)
            .await?;

        if table_count > 0 {
            return Err(DbError::ProtectedEntity {
                operation: Operation::Delete,
                reason: format!("it still has {table_count} table(s); move or delete them first"),
                entity_type: "section".to_string(),
                entity_id: Some(id.to_string()),
            });
        }

        let result = sqlx::query("DELETE FROM sections WHERE id = $1 AND branch_id = $2")
            .bind(id)
            .bind(self.branch_id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(branch_id = self.branch_id), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let updated: Option<SectionId> = sqlx::query_scalar(
            r#"
            UPDATE sections SET
                name = COALESCE($3, name),
                description = CASE WHEN $4 THEN $5 ELSE description END,
                is_smoking = COALESCE($6, is_smoking),
                is_outdoor = COALESCE($7, is_outdoor),
                is_vip = COALESCE($8, is_vip),
                is_active = COALESCE($9, is_active),
                updated_at = NOW()
            WHERE id = $1 AND branch_id = $2
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(self.branch_id)
        .bind(&request.name)
        .bind(request.description.is_some())
        .bind(request.description.as_ref().and_then(|inner| inner.as_ref()))
        .bind(request.is_smoking)
        .bind(request.is_outdoor)
        .bind(request.is_vip)
        .bind(request.is_active)
        .fetch_optional(&mut *self.db)
        .await?;

        if updated.is_none() {
            return Err(DbError::NotFound);
        }

        self.get_by_id(id).await?.ok_or(DbError::NotFound)
    }
}

impl<'c> Sections<'c> {
    pub fn new(db: &'c mut PgConnection, branch_id: BranchId) -> Self {
        Self { db, branch_id }
    }
}
