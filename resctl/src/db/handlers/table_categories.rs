//! Database repository for table categories.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::table_categories::{TableCategoryCreateDBRequest, TableCategoryDBResponse, TableCategoryUpdateDBRequest},
};
use crate::types::{BranchId, TableCategoryId};
use sqlx::PgConnection;
use tracing::instrument;

const CATEGORY_COLUMNS: &str = "id, branch_id, name, description, min_capacity, max_capacity, price, created_at, updated_at";

pub struct TableCategories<'c> {
    db: &'c mut PgConnection,
    branch_id: BranchId,
}

#[async_trait::async_trait]
impl<'c> Repository for TableCategories<'c> {
    type CreateRequest = TableCategoryCreateDBRequest;
    type UpdateRequest = TableCategoryUpdateDBRequest;
    type Response = TableCategoryDBResponse;
    type Id = TableCategoryId;
    type Filter = ();

    #[instrument(skip(self, request), fields(branch_id = self.branch_id, name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let category = sqlx::query_as::<_, TableCategoryDBResponse>(&format!(
            "INSERT INTO table_categories (branch_id, name, description, min_capacity, max_capacity, price) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(self.branch_id)
        .bind(&request.name)
        .bind(&request.description)
        .bind(request.min_capacity)
        .bind(request.max_capacity)
        .bind(request.price)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(category)
    }

    #[instrument(skip(self), fields(branch_id = self.branch_id), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let category = sqlx::query_as::<_, TableCategoryDBResponse>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM table_categories WHERE id = $1 AND branch_id = $2"
        ))
        .bind(id)
        .bind(self.branch_id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(category)
    }

    #[instrument(skip(self, _filter), fields(branch_id = self.branch_id), err)]
    async fn list(&mut self, _filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let categories = sqlx::query_as::<_, TableCategoryDBResponse>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM table_categories WHERE branch_id = $1 ORDER BY min_capacity, name"
        ))
        .bind(self.branch_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(categories)
    }

    /// Tables in the category keep existing; their `category_id` is cleared by the foreign key.
    #[instrument(skip(self), fields(branch_id = self.branch_id), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM table_categories WHERE id = $1 AND branch_id = $2")
            .bind(id)
            .bind(self.branch_id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(branch_id = self.branch_id), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let category = sqlx::query_as::<_, TableCategoryDBResponse>(&format!(
            r#"
            UPDATE table_categories SET
                name = COALESCE($3, name),
                description = CASE WHEN $4 THEN $5 ELSE description END,
                min_capacity = COALESCE($6, min_capacity),
                max_capacity = COALESCE($7, max_capacity),
                price = COALESCE($8, price),
                updated_at = NOW()
            WHERE id = $1 AND branch_id = $2
            RETURNING {CATEGORY_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(self.branch_id)
        .bind(&request.name)
        .bind(request.description.is_some())
        .bind(request.description.as_ref().and_then(|inner| inner.as_ref()))
        .bind(request.min_capacity)
        .bind(request.max_capacity)
        .bind(request.price)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(category)
    }
}

impl<'c> TableCategories<'c> {
    pub fn new(db: &'c mut PgConnection, branch_id: BranchId) -> Self {
        Self { db, branch_id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use sqlx::PgPool;

    fn category(name: &str, min: i32, max: i32) -> TableCategoryCreateDBRequest {
        TableCategoryCreateDBRequest {
            name: name.to_string(),
            description: None,
            min_capacity: min,
            max_capacity: max,
            price: Decimal::new(2000, 2),
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_orders_by_capacity(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = TableCategories::new(&mut conn, 1);
        repo.create(&category("Family", 6, 10)).await.unwrap();
        repo.create(&category("Couple", 2, 2)).await.unwrap();
        repo.create(&category("Bar", 1, 2)).await.unwrap();

        let names: Vec<_> = repo.list(&()).await.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Bar", "Couple", "Family"]);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_rejects_inverted_range(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = TableCategories::new(&mut conn, 1);
        let created = repo.create(&category("Booth", 2, 6)).await.unwrap();

        let updated = repo
            .update(
                created.id,
                &TableCategoryUpdateDBRequest {
                    price: Some(Decimal::new(3550, 2)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.price, Decimal::new(3550, 2));
        assert_eq!(updated.max_capacity, 6);

        // Only min is sent, so the inversion is caught by the database
        let err = repo
            .update(
                created.id,
                &TableCategoryUpdateDBRequest {
                    min_capacity: Some(8),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_clears_table_category(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let created = TableCategories::new(&mut conn, 1).create(&category("Window", 1, 4)).await.unwrap();

        let section_id: i64 = sqlx::query_scalar("INSERT INTO sections (branch_id, name) VALUES (1, 'Hall') RETURNING id")
            .fetch_one(&pool)
            .await
            .unwrap();
        let table_id: i64 = sqlx::query_scalar(
            "INSERT INTO tables (branch_id, section_id, category_id, table_number, capacity) VALUES (1, $1, $2, 'W1', 2) RETURNING id",
        )
        .bind(section_id)
        .bind(created.id)
        .fetch_one(&pool)
        .await
        .unwrap();

        assert!(TableCategories::new(&mut conn, 1).delete(created.id).await.unwrap());
        assert!(!TableCategories::new(&mut conn, 1).delete(created.id).await.unwrap());

        let category_id: Option<i64> = sqlx::query_scalar("SELECT category_id FROM tables WHERE id = $1")
            .bind(table_id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(category_id, None);
    }
}
