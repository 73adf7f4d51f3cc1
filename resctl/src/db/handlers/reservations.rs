//! Database repository for reservations.

use crate::booking::{ReservationStatus, ReservationWindow};
use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::reservations::{ReservationCreateDBRequest, ReservationDBResponse, ReservationUpdateDBRequest},
};
use crate::types::{BranchId, ReservationId, SectionId, TableId};
use chrono::{NaiveDate, NaiveTime};
use sqlx::{PgConnection, Postgres, QueryBuilder};
use tracing::instrument;

/// Filter for listing reservations
#[derive(Debug, Clone)]
pub struct ReservationFilter {
    pub skip: i64,
    pub limit: i64,
    pub date: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<ReservationStatus>,
    pub table_id: Option<TableId>,
    pub section_id: Option<SectionId>,
    /// Case-insensitive match on customer name, phone, email or table number
    pub search: Option<String>,
}

impl ReservationFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            date: None,
            start_date: None,
            end_date: None,
            status: None,
            table_id: None,
            section_id: None,
            search: None,
        }
    }

    pub fn on_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn between(mut self, start_date: Option<NaiveDate>, end_date: Option<NaiveDate>) -> Self {
        self.start_date = start_date;
        self.end_date = end_date;
        self
    }

    pub fn with_status(mut self, status: ReservationStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_table(mut self, table_id: TableId) -> Self {
        self.table_id = Some(table_id);
        self
    }

    pub fn with_section(mut self, section_id: SectionId) -> Self {
        self.section_id = Some(section_id);
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        let search = search.into();
        if !search.trim().is_empty() {
            self.search = Some(search.trim().to_string());
        }
        self
    }
}

const RESERVATION_COLUMNS: &str = r#"
    r.id, r.branch_id, r.table_id, t.table_number, t.section_id, s.name AS section_name,
    c.name AS category_name,
    COALESCE(s.is_smoking, FALSE) AS is_smoking,
    COALESCE(s.is_outdoor, FALSE) AS is_outdoor,
    COALESCE(s.is_vip, FALSE) AS is_vip,
    r.customer_name, r.customer_phone, r.customer_email, r.guest_count,
    r.reservation_date, r.reservation_time, r.duration_minutes, r.status,
    r.notes, r.special_notes, r.version, r.created_at, r.updated_at
"#;

const RESERVATION_JOINS: &str = r#"
    LEFT JOIN tables t ON t.id = r.table_id
    LEFT JOIN sections s ON s.id = t.section_id
    LEFT JOIN table_categories c ON c.id = t.category_id
"#;

fn select_reservations() -> String {
    format!("SELECT {RESERVATION_COLUMNS} FROM reservations r {RESERVATION_JOINS}")
}

// Wraps a data-modifying statement returning reservation rows so the joins apply to its output
fn joined(source: &str) -> String {
    format!("WITH r AS ({source}) SELECT {RESERVATION_COLUMNS} FROM r {RESERVATION_JOINS}")
}

fn blocking_statuses() -> Vec<String> {
    ReservationStatus::ALL
        .iter()
        .filter(|status| status.blocks_table())
        .map(|status| status.as_str().to_string())
        .collect()
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, branch_id: BranchId, filter: &ReservationFilter) {
    query.push(" WHERE r.branch_id = ");
    query.push_bind(branch_id);

    if let Some(date) = filter.date {
        query.push(" AND r.reservation_date = ");
        query.push_bind(date);
    }
    if let Some(start_date) = filter.start_date {
        query.push(" AND r.reservation_date >= ");
        query.push_bind(start_date);
    }
    if let Some(end_date) = filter.end_date {
        query.push(" AND r.reservation_date <= ");
        query.push_bind(end_date);
    }
    if let Some(status) = filter.status {
        query.push(" AND r.status = ");
        query.push_bind(status);
    }
    if let Some(table_id) = filter.table_id {
        query.push(" AND r.table_id = ");
        query.push_bind(table_id);
    }
    if let Some(section_id) = filter.section_id {
        query.push(" AND t.section_id = ");
        query.push_bind(section_id);
    }
    if let Some(search) = &filter.search {
        let pattern = format!("%{search}%");
        query.push(" AND (r.customer_name ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR r.customer_phone ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR r.customer_email ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR t.table_number ILIKE ");
        query.push_bind(pattern);
        query.push(")");
    }
}

pub struct Reservations<'c> {
    db: &'c mut PgConnection,
    branch_id: BranchId,
}

#[async_trait::async_trait]
impl<'c> Repository for Reservations<'c> {
    type CreateRequest = ReservationCreateDBRequest;
    type UpdateRequest = ReservationUpdateDBRequest;
    type Response = ReservationDBResponse;
    type Id = ReservationId;
    type Filter = ReservationFilter;

    #[instrument(skip(self, request), fields(branch_id = self.branch_id, table_id = ?request.table_id), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let sql = joined(
            r#"
            INSERT INTO reservations (branch_id, table_id, customer_name, customer_phone, customer_email, guest_count,
                                      reservation_date, reservation_time, duration_minutes, status, notes, special_notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        );
        let reservation = sqlx::query_as::<_, ReservationDBResponse>(&sql)
            .bind(self.branch_id)
            .bind(request.table_id)
            .bind(&request.customer_name)
            .bind(&request.customer_phone)
            .bind(&request.customer_email)
            .bind(request.guest_count)
            .bind(request.reservation_date)
            .bind(request.reservation_time)
            .bind(request.duration_minutes)
            .bind(request.status)
            .bind(&request.notes)
            .bind(&request.special_notes)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(reservation)
    }

    #[instrument(skip(self), fields(branch_id = self.branch_id), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let sql = format!("{} WHERE r.id = $1 AND r.branch_id = $2", select_reservations());
        let reservation = sqlx::query_as::<_, ReservationDBResponse>(&sql)
            .bind(id)
            .bind(self.branch_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(reservation)
    }

    #[instrument(skip(self, filter), fields(branch_id = self.branch_id, skip = filter.skip, limit = filter.limit), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new(select_reservations());
        push_filters(&mut query, self.branch_id, filter);
        query.push(" ORDER BY r.reservation_date, r.reservation_time, r.id LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let reservations = query.build_query_as::<ReservationDBResponse>().fetch_all(&mut *self.db).await?;

        Ok(reservations)
    }

    #[instrument(skip(self), fields(branch_id = self.branch_id), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM reservations WHERE id = $1 AND branch_id = $2")
            .bind(id)
            .bind(self.branch_id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Applies the provided fields and bumps `version`.
    #[instrument(skip(self, request), fields(branch_id = self.branch_id), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let sql = joined(
            r#"
            UPDATE reservations SET
                table_id = CASE WHEN $3 THEN $4 ELSE table_id END,
                customer_name = COALESCE($5, customer_name),
                customer_phone = COALESCE($6, customer_phone),
                customer_email = CASE WHEN $7 THEN $8 ELSE customer_email END,
                guest_count = COALESCE($9, guest_count),
                reservation_date = COALESCE($10, reservation_date),
                reservation_time = COALESCE($11, reservation_time),
                duration_minutes = COALESCE($12, duration_minutes),
                status = COALESCE($13, status),
                notes = CASE WHEN $14 THEN $15 ELSE notes END,
                special_notes = CASE WHEN $16 THEN $17 ELSE special_notes END,
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1 AND branch_id = $2
            RETURNING *
            "#,
        );
        let reservation = sqlx::query_as::<_, ReservationDBResponse>(&sql)
            .bind(id)
            .bind(self.branch_id)
            .bind(request.table_id.is_some())
            .bind(request.table_id.flatten())
            .bind(&request.customer_name)
            .bind(&request.customer_phone)
            .bind(request.customer_email.is_some())
            .bind(request.customer_email.as_ref().and_then(|inner| inner.as_ref()))
            .bind(request.guest_count)
            .bind(request.reservation_date)
            .bind(request.reservation_time)
            .bind(request.duration_minutes)
            .bind(request.status)
            .bind(request.notes.is_some())
            .bind(request.notes.as_ref().and_then(|inner| inner.as_ref()))
            .bind(request.special_notes.is_some())
            .bind(request.special_notes.as_ref().and_then(|inner| inner.as_ref()))
            .fetch_optional(&mut *self.db)
            .await?
            .ok_or(DbError::NotFound)?;

        Ok(reservation)
    }
}

impl<'c> Reservations<'c> {
    pub fn new(db: &'c mut PgConnection, branch_id: BranchId) -> Self {
        Self { db, branch_id }
    }

    /// Fetch a reservation and lock its row until the surrounding transaction ends.
    #[instrument(skip(self), fields(branch_id = self.branch_id), err)]
    pub async fn get_for_update(&mut self, id: ReservationId) -> Result<Option<ReservationDBResponse>> {
        let sql = format!("{} WHERE r.id = $1 AND r.branch_id = $2 FOR UPDATE OF r", select_reservations());
        let reservation = sqlx::query_as::<_, ReservationDBResponse>(&sql)
            .bind(id)
            .bind(self.branch_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(reservation)
    }

    /// Total matching `filter`, ignoring its skip and limit
    #[instrument(skip(self, filter), fields(branch_id = self.branch_id), err)]
    pub async fn count(&mut self, filter: &ReservationFilter) -> Result<i64> {
        let mut query = QueryBuilder::new(format!("SELECT COUNT(*) FROM reservations r {RESERVATION_JOINS}"));
        push_filters(&mut query, self.branch_id, filter);

        let count: i64 = query.build_query_scalar().fetch_one(&mut *self.db).await?;

        Ok(count)
    }

    /// Every reservation dated within `[start, end]`, in schedule order.
    #[instrument(skip(self), fields(branch_id = self.branch_id), err)]
    pub async fn list_in_range(&mut self, start: NaiveDate, end: NaiveDate) -> Result<Vec<ReservationDBResponse>> {
        let sql = format!(
            "{} WHERE r.branch_id = $1 AND r.reservation_date BETWEEN $2 AND $3 \
             ORDER BY r.reservation_date, r.reservation_time, r.id",
            select_reservations()
        );
        let reservations = sqlx::query_as::<_, ReservationDBResponse>(&sql)
            .bind(self.branch_id)
            .bind(start)
            .bind(end)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(reservations)
    }

    /// Reservations still holding `table_id` at any point of `window`, other than `exclude`.
    /// Compared on absolute timestamps, so bookings running past midnight are found from either side.
    #[instrument(skip(self), fields(branch_id = self.branch_id), err)]
    pub async fn find_blocking(
        &mut self,
        table_id: TableId,
        window: &ReservationWindow,
        exclude: Option<ReservationId>,
    ) -> Result<Vec<ReservationDBResponse>> {
        let sql = format!(
            "{} WHERE r.branch_id = $1 AND r.table_id = $2 \
             AND r.reservation_date + r.reservation_time < $3 \
             AND r.reservation_date + r.reservation_time + make_interval(mins => r.duration_minutes) > $4 \
             AND r.status = ANY($5) AND ($6::BIGINT IS NULL OR r.id <> $6) \
             ORDER BY r.reservation_date, r.reservation_time",
            select_reservations()
        );
        let reservations = sqlx::query_as::<_, ReservationDBResponse>(&sql)
            .bind(self.branch_id)
            .bind(table_id)
            .bind(window.end)
            .bind(window.start)
            .bind(blocking_statuses())
            .bind(exclude)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(reservations)
    }

    /// Reservations on `date` that still hold a table, from `from` onwards when given.
    #[instrument(skip(self), fields(branch_id = self.branch_id), err)]
    pub async fn upcoming(&mut self, date: NaiveDate, from: Option<NaiveTime>, limit: i64) -> Result<Vec<ReservationDBResponse>> {
        let sql = format!(
            "{} WHERE r.branch_id = $1 AND r.reservation_date = $2 AND r.status = ANY($3) \
             AND ($4::TIME IS NULL OR r.reservation_time >= $4) \
             ORDER BY r.reservation_time, r.id LIMIT $5",
            select_reservations()
        );
        let reservations = sqlx::query_as::<_, ReservationDBResponse>(&sql)
            .bind(self.branch_id)
            .bind(date)
            .bind(blocking_statuses())
            .bind(from)
            .bind(limit)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(reservations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    async fn seed_table(pool: &PgPool) -> TableId {
        let section_id: i64 =
            sqlx::query_scalar("INSERT INTO sections (branch_id, name, is_vip) VALUES (1, 'Lounge', TRUE) RETURNING id")
                .fetch_one(pool)
                .await
                .unwrap();
        sqlx::query_scalar("INSERT INTO tables (branch_id, section_id, table_number, capacity) VALUES (1, $1, 'L1', 4) RETURNING id")
            .bind(section_id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    fn booking(table_id: Option<TableId>, name: &str, day: u32, at: NaiveTime) -> ReservationCreateDBRequest {
        ReservationCreateDBRequest {
            table_id,
            customer_name: name.to_string(),
            customer_phone: "+44 20 7946 0000".to_string(),
            customer_email: None,
            guest_count: 2,
            reservation_date: date(day),
            reservation_time: at,
            duration_minutes: 90,
            status: ReservationStatus::Pending,
            notes: None,
            special_notes: None,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_joins_table_details(pool: PgPool) {
        let table_id = seed_table(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Reservations::new(&mut conn, 1);

        let created = repo.create(&booking(Some(table_id), "Ada", 1, time(19, 0))).await.unwrap();
        assert_eq!(created.table_number.as_deref(), Some("L1"));
        assert_eq!(created.section_name.as_deref(), Some("Lounge"));
        assert!(created.is_vip);
        assert!(!created.is_smoking);
        assert_eq!(created.version, 1);

        let walk_in = repo.create(&booking(None, "Bo", 1, time(12, 0))).await.unwrap();
        assert_eq!(walk_in.table_number, None);
        assert!(!walk_in.is_vip);

        assert_eq!(repo.get_by_id(created.id).await.unwrap(), Some(created));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_filters_and_count(pool: PgPool) {
        let table_id = seed_table(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Reservations::new(&mut conn, 1);

        repo.create(&booking(Some(table_id), "Alice Smith", 1, time(18, 0))).await.unwrap();
        repo.create(&booking(None, "Bob Jones", 2, time(19, 0))).await.unwrap();
        repo.create(&booking(None, "Carol Smith", 3, time(20, 0))).await.unwrap();

        let range = ReservationFilter::new(0, 10).between(Some(date(1)), Some(date(2)));
        assert_eq!(repo.list(&range).await.unwrap().len(), 2);
        assert_eq!(repo.count(&range).await.unwrap(), 2);

        let smiths = ReservationFilter::new(0, 10).with_search("smith");
        let names: Vec<_> = repo.list(&smiths).await.unwrap().into_iter().map(|r| r.customer_name).collect();
        assert_eq!(names, vec!["Alice Smith", "Carol Smith"]);

        let by_table = ReservationFilter::new(0, 10).with_table(table_id);
        assert_eq!(repo.count(&by_table).await.unwrap(), 1);

        let paged = ReservationFilter::new(1, 1);
        let page = repo.list(&paged).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].customer_name, "Bob Jones");
        assert_eq!(repo.count(&paged).await.unwrap(), 3);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_bumps_version_and_keeps_other_fields(pool: PgPool) {
        let table_id = seed_table(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Reservations::new(&mut conn, 1);

        let mut request = booking(Some(table_id), "Ada", 1, time(19, 0));
        request.notes = Some("Window seat".to_string());
        let created = repo.create(&request).await.unwrap();

        let confirmed = repo
            .update(created.id, &ReservationUpdateDBRequest::status_only(ReservationStatus::Confirmed))
            .await
            .unwrap();
        assert_eq!(confirmed.status, ReservationStatus::Confirmed);
        assert_eq!(confirmed.version, 2);
        assert_eq!(confirmed.notes.as_deref(), Some("Window seat"));
        assert_eq!(confirmed.table_id, Some(table_id));
        assert_eq!(confirmed.reservation_time, created.reservation_time);

        let unassigned = repo
            .update(
                created.id,
                &ReservationUpdateDBRequest {
                    table_id: Some(None),
                    notes: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(unassigned.table_id, None);
        assert_eq!(unassigned.section_name, None);
        assert_eq!(unassigned.notes, None);
        assert_eq!(unassigned.version, 3);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_find_blocking_skips_cancelled_and_self(pool: PgPool) {
        let table_id = seed_table(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Reservations::new(&mut conn, 1);

        let first = repo.create(&booking(Some(table_id), "Ada", 1, time(18, 0))).await.unwrap();
        let mut cancelled = booking(Some(table_id), "Bo", 1, time(20, 0));
        cancelled.status = ReservationStatus::Cancelled;
        repo.create(&cancelled).await.unwrap();
        repo.create(&booking(Some(table_id), "Cy", 2, time(18, 0))).await.unwrap();

        let evening = ReservationWindow::new(date(1), time(17, 0), 240);
        let blocking = repo.find_blocking(table_id, &evening, None).await.unwrap();
        assert_eq!(blocking.len(), 1);
        assert_eq!(blocking[0].id, first.id);

        assert!(repo.find_blocking(table_id, &evening, Some(first.id)).await.unwrap().is_empty());

        // Half-open: starting when the 18:00 booking ends is free
        let after = ReservationWindow::new(date(1), time(19, 30), 60);
        assert!(repo.find_blocking(table_id, &after, None).await.unwrap().is_empty());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_find_blocking_across_midnight(pool: PgPool) {
        let table_id = seed_table(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Reservations::new(&mut conn, 1);

        let late = repo.create(&booking(Some(table_id), "Ada", 1, time(23, 0))).await.unwrap();

        // 23:00 + 90 minutes runs until 00:30 on day 2
        let early_next = ReservationWindow::new(date(2), time(0, 15), 60);
        let blocking = repo.find_blocking(table_id, &early_next, None).await.unwrap();
        assert_eq!(blocking.len(), 1);
        assert_eq!(blocking[0].id, late.id);

        let free_next = ReservationWindow::new(date(2), time(0, 30), 60);
        assert!(repo.find_blocking(table_id, &free_next, None).await.unwrap().is_empty());

        // And from the other side: a day-1 booking reaching into an existing day-2 one
        let breakfast = repo.create(&booking(Some(table_id), "Bo", 2, time(1, 0))).await.unwrap();
        let overnight = ReservationWindow::new(date(1), time(23, 45), 120);
        let ids: Vec<_> = repo
            .find_blocking(table_id, &overnight, None)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![late.id, breakfast.id]);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_upcoming_from_time(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Reservations::new(&mut conn, 1);

        repo.create(&booking(None, "Early", 1, time(12, 0))).await.unwrap();
        repo.create(&booking(None, "Late", 1, time(21, 0))).await.unwrap();
        repo.create(&booking(None, "Later", 1, time(22, 0))).await.unwrap();

        let all = repo.upcoming(date(1), None, 10).await.unwrap();
        assert_eq!(all.len(), 3);

        let after = repo.upcoming(date(1), Some(time(20, 0)), 1).await.unwrap();
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].customer_name, "Late");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_other_branch_cannot_touch_reservation(pool: PgPool) {
        let other: BranchId = sqlx::query_scalar("INSERT INTO branches (slug, name) VALUES ('north', 'North') RETURNING id")
            .fetch_one(&pool)
            .await
            .unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let created = Reservations::new(&mut conn, 1)
            .create(&booking(None, "Ada", 1, time(19, 0)))
            .await
            .unwrap();

        let mut foreign = Reservations::new(&mut conn, other);
        assert!(foreign.get_by_id(created.id).await.unwrap().is_none());
        assert_eq!(foreign.count(&ReservationFilter::new(0, 10)).await.unwrap(), 0);
        assert!(!foreign.delete(created.id).await.unwrap());
        assert!(matches!(
            foreign.update(created.id, &ReservationUpdateDBRequest::default()).await,
            Err(DbError::NotFound)
        ));
    }
}
