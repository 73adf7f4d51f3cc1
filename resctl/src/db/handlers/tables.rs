//! Database repository for tables.

use crate::booking::TableStatus;
use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::tables::{TableCreateDBRequest, TableDBResponse, TableStatusCounts, TableUpdateDBRequest},
};
use crate::types::{BranchId, SectionId, TableId};
use sqlx::{FromRow, PgConnection, QueryBuilder};
use tracing::instrument;

/// Filter for listing tables
#[derive(Debug, Clone, Default)]
pub struct TableFilter {
    pub section_id: Option<SectionId>,
    pub status: Option<TableStatus>,
    pub active_only: bool,
}

impl TableFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_section(mut self, section_id: SectionId) -> Self {
        self.section_id = Some(section_id);
        self
    }

    pub fn with_status(mut self, status: TableStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn active_only(mut self) -> Self {
        self.active_only = true;
        self
    }
}

const TABLE_COLUMNS: &str = r#"
    t.id, t.branch_id, t.section_id, s.name AS section_name, t.category_id, c.name AS category_name,
    t.table_number, t.capacity, t.status, t.min_reservation_duration, t.max_reservation_duration,
    t.reservation_interval, t.is_active, t.created_at, t.updated_at
"#;

// Wraps a statement that returns table rows as `t` so names can be joined in
fn joined(source: &str) -> String {
    format!(
        "WITH t AS ({source}) SELECT {TABLE_COLUMNS} FROM t \
         LEFT JOIN sections s ON s.id = t.section_id \
         LEFT JOIN table_categories c ON c.id = t.category_id"
    )
}

#[derive(FromRow)]
struct StatusCount {
    status: TableStatus,
    count: i64,
}

pub struct Tables<'c> {
    db: &'c mut PgConnection,
    branch_id: BranchId,
}

#[async_trait::async_trait]
impl<'c> Repository for Tables<'c> {
    type CreateRequest = TableCreateDBRequest;
    type UpdateRequest = TableUpdateDBRequest;
    type Response = TableDBResponse;
    type Id = TableId;
    type Filter = TableFilter;

    #[instrument(skip(self, request), fields(branch_id = self.branch_id, table_number = %request.table_number), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let sql = joined(
            r#"
            INSERT INTO tables (branch_id, section_id, category_id, table_number, capacity, status,
                                min_reservation_duration, max_reservation_duration, reservation_interval, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        );
        let table = sqlx::query_as::<_, TableDBResponse>(&sql)
            .bind(self.branch_id)
            .bind(request.section_id)
            .bind(request.category_id)
            .bind(&request.table_number)
            .bind(request.capacity)
            .bind(request.status)
            .bind(request.min_reservation_duration)
            .bind(request.max_reservation_duration)
            .bind(request.reservation_interval)
            .bind(request.is_active)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(table)
    }

    #[instrument(skip(self), fields(branch_id = self.branch_id), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let sql = joined("SELECT * FROM tables WHERE id = $1 AND branch_id = $2");
        let table = sqlx::query_as::<_, TableDBResponse>(&sql)
            .bind(id)
            .bind(self.branch_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(table)
    }

    #[instrument(skip(self), fields(branch_id = self.branch_id), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT ");
        query.push(TABLE_COLUMNS);
        query.push(
            " FROM tables t LEFT JOIN sections s ON s.id = t.section_id \
             LEFT JOIN table_categories c ON c.id = t.category_id WHERE t.branch_id = ",
        );
        query.push_bind(self.branch_id);

        if let Some(section_id) = filter.section_id {
            query.push(" AND t.section_id = ");
            query.push_bind(section_id);
        }
        if let Some(status) = filter.status {
            query.push(" AND t.status = ");
            query.push_bind(status);
        }
        if filter.active_only {
            query.push(" AND t.is_active");
        }

        // Natural-ish ordering: T2 before T10
        query.push(" ORDER BY s.name, LENGTH(t.table_number), t.table_number");

        let tables = query.build_query_as::<TableDBResponse>().fetch_all(&mut *self.db).await?;

        Ok(tables)
    }

    #[instrument(skip(self), fields(branch_id = self.branch_id), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tables WHERE id = $1 AND branch_id = $2")
            .bind(id)
            .bind(self.branch_id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(branch_id = self.branch_id), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let sql = joined(
            r#"
            UPDATE tables SET
                section_id = COALESCE($3, section_id),
                category_id = CASE WHEN $4 THEN $5 ELSE category_id END,
                table_number = COALESCE($6, table_number),
                capacity = COALESCE($7, capacity),
                status = COALESCE($8, status),
                min_reservation_duration = COALESCE($9, min_reservation_duration),
                max_reservation_duration = COALESCE($10, max_reservation_duration),
                reservation_interval = COALESCE($11, reservation_interval),
                is_active = COALESCE($12, is_active),
                updated_at = NOW()
            WHERE id = $1 AND branch_id = $2
            RETURNING *
            "#,
        );
        let table = sqlx::query_as::<_, TableDBResponse>(&sql)
            .bind(id)
            .bind(self.branch_id)
            .bind(request.section_id)
            .bind(request.category_id.is_some())
            .bind(request.category_id.flatten())
            .bind(&request.table_number)
            .bind(request.capacity)
            .bind(request.status)
            .bind(request.min_reservation_duration)
            .bind(request.max_reservation_duration)
            .bind(request.reservation_interval)
            .bind(request.is_active)
            .fetch_optional(&mut *self.db)
            .await?
            .ok_or(DbError::NotFound)?;

        Ok(table)
    }
}

impl<'c> Tables<'c> {
    pub fn new(db: &'c mut PgConnection, branch_id: BranchId) -> Self {
        Self { db, branch_id }
    }

    /// Fetch a table and lock its row until the surrounding transaction ends.
    ///
    /// Bookings for one table serialize on this lock, so two concurrent writes cannot both
    /// pass the overlap check.
    #[instrument(skip(self), fields(branch_id = self.branch_id), err)]
    pub async fn get_for_update(&mut self, id: TableId) -> Result<Option<TableDBResponse>> {
        let sql = joined("SELECT * FROM tables WHERE id = $1 AND branch_id = $2 FOR UPDATE");
        let table = sqlx::query_as::<_, TableDBResponse>(&sql)
            .bind(id)
            .bind(self.branch_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(table)
    }

    #[instrument(skip(self), fields(branch_id = self.branch_id), err)]
    pub async fn update_status(&mut self, id: TableId, status: TableStatus) -> Result<TableDBResponse> {
        self.update(
            id,
            &TableUpdateDBRequest {
                status: Some(status),
                ..Default::default()
            },
        )
        .await
    }

    /// Active tables per coarse status
    #[instrument(skip(self), fields(branch_id = self.branch_id), err)]
    pub async fn status_counts(&mut self) -> Result<TableStatusCounts> {
        let rows = sqlx::query_as::<_, StatusCount>(
            "SELECT status, COUNT(*) AS count FROM tables WHERE branch_id = $1 AND is_active GROUP BY status",
        )
        .bind(self.branch_id)
        .fetch_all(&mut *self.db)
        .await?;

        let mut counts = TableStatusCounts::default();
        for row in rows {
            match row.status {
                TableStatus::Available => counts.available = row.count,
                TableStatus::Reserved => counts.reserved = row.count,
                TableStatus::Occupied => counts.occupied = row.count,
            }
            counts.total += row.count;
        }

        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::Sections;
    use crate::db::models::sections::SectionCreateDBRequest;
    use crate::db::models::table_categories::TableCategoryCreateDBRequest;
    use crate::db::handlers::TableCategories;
    use rust_decimal::Decimal;
    use sqlx::PgPool;

    async fn section(conn: &mut PgConnection, name: &str) -> SectionId {
        Sections::new(conn, 1)
            .create(&SectionCreateDBRequest {
                name: name.to_string(),
                description: None,
                is_smoking: false,
                is_outdoor: false,
                is_vip: false,
                is_active: true,
            })
            .await
            .unwrap()
            .id
    }

    fn table(section_id: SectionId, number: &str, capacity: i32) -> TableCreateDBRequest {
        TableCreateDBRequest {
            section_id,
            category_id: None,
            table_number: number.to_string(),
            capacity,
            status: TableStatus::Available,
            min_reservation_duration: 60,
            max_reservation_duration: 180,
            reservation_interval: 15,
            is_active: true,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_joins_section_and_category(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let section_id = section(&mut conn, "Main Hall").await;
        let category = TableCategories::new(&mut conn, 1)
            .create(&TableCategoryCreateDBRequest {
                name: "Booth".to_string(),
                description: None,
                min_capacity: 2,
                max_capacity: 6,
                price: Decimal::new(1500, 2),
            })
            .await
            .unwrap();

        let mut request = table(section_id, "B1", 4);
        request.category_id = Some(category.id);
        let created = Tables::new(&mut conn, 1).create(&request).await.unwrap();

        assert_eq!(created.section_name.as_deref(), Some("Main Hall"));
        assert_eq!(created.category_name.as_deref(), Some("Booth"));
        assert_eq!(created.status, TableStatus::Available);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_filters_and_orders(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let hall = section(&mut conn, "Hall").await;
        let patio = section(&mut conn, "Patio").await;

        let mut repo = Tables::new(&mut conn, 1);
        repo.create(&table(hall, "T10", 4)).await.unwrap();
        repo.create(&table(hall, "T2", 2)).await.unwrap();
        let p1 = repo.create(&table(patio, "P1", 6)).await.unwrap();
        repo.update_status(p1.id, TableStatus::Occupied).await.unwrap();

        let hall_tables = repo.list(&TableFilter::new().with_section(hall)).await.unwrap();
        let numbers: Vec<_> = hall_tables.iter().map(|t| t.table_number.as_str()).collect();
        assert_eq!(numbers, vec!["T2", "T10"]);

        let occupied = repo.list(&TableFilter::new().with_status(TableStatus::Occupied)).await.unwrap();
        assert_eq!(occupied.len(), 1);
        assert_eq!(occupied[0].id, p1.id);

        let counts = repo.status_counts().await.unwrap();
        assert_eq!(
            counts,
            TableStatusCounts {
                available: 2,
                reserved: 0,
                occupied: 1,
                total: 3
            }
        );
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_and_clear_category(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let hall = section(&mut conn, "Hall").await;
        let category = TableCategories::new(&mut conn, 1)
            .create(&TableCategoryCreateDBRequest {
                name: "Window".to_string(),
                description: None,
                min_capacity: 1,
                max_capacity: 4,
                price: Decimal::ZERO,
            })
            .await
            .unwrap();

        let mut repo = Tables::new(&mut conn, 1);
        let created = repo.create(&table(hall, "W1", 2)).await.unwrap();

        let with_category = repo
            .update(
                created.id,
                &TableUpdateDBRequest {
                    category_id: Some(Some(category.id)),
                    capacity: Some(3),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(with_category.category_name.as_deref(), Some("Window"));
        assert_eq!(with_category.capacity, 3);

        let cleared = repo
            .update(
                created.id,
                &TableUpdateDBRequest {
                    category_id: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(cleared.category_id, None);
        assert_eq!(cleared.capacity, 3);
        assert_eq!(cleared.table_number, "W1");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_number_and_bad_capacity(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let hall = section(&mut conn, "Hall").await;
        let mut repo = Tables::new(&mut conn, 1);
        repo.create(&table(hall, "T1", 4)).await.unwrap();

        let duplicate = repo.create(&table(hall, "T1", 2)).await.unwrap_err();
        assert!(matches!(
            duplicate,
            DbError::UniqueViolation { conflicting_value: Some(ref v), .. } if v == "T1"
        ));

        let zero = repo.create(&table(hall, "T9", 0)).await.unwrap_err();
        assert!(matches!(zero, DbError::CheckViolation { .. }));
    }
}
