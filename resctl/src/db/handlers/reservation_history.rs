//! Database repository for the reservation audit trail.
//!
//! History rows are append-only. They are written in the same transaction as the change they
//! describe and keep the full reservation row as JSON, so they outlive the reservation itself.

use crate::db::{
    errors::{DbError, Result},
    models::{
        reservation_history::{HistoryAction, ReservationHistoryDBResponse},
        reservations::ReservationDBResponse,
    },
};
use crate::types::{BranchId, ReservationId};
use sqlx::{PgConnection, QueryBuilder};
use tracing::instrument;

/// Filter for listing history rows
#[derive(Debug, Clone)]
pub struct HistoryFilter {
    pub skip: i64,
    pub limit: i64,
    pub reservation_id: Option<ReservationId>,
}

impl HistoryFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            reservation_id: None,
        }
    }

    pub fn for_reservation(mut self, reservation_id: ReservationId) -> Self {
        self.reservation_id = Some(reservation_id);
        self
    }
}

pub struct ReservationHistory<'c> {
    db: &'c mut PgConnection,
    branch_id: BranchId,
}

impl<'c> ReservationHistory<'c> {
    pub fn new(db: &'c mut PgConnection, branch_id: BranchId) -> Self {
        Self { db, branch_id }
    }

    #[instrument(skip(self, reservation), fields(branch_id = self.branch_id, reservation_id = reservation.id), err)]
    pub async fn record(
        &mut self,
        action: HistoryAction,
        reservation: &ReservationDBResponse,
    ) -> Result<ReservationHistoryDBResponse> {
        let snapshot = serde_json::to_value(reservation).map_err(|e| DbError::Other(e.into()))?;

        let entry = sqlx::query_as::<_, ReservationHistoryDBResponse>(
            r#"
            INSERT INTO reservation_history (branch_id, reservation_id, action, snapshot)
            VALUES ($1, $2, $3, $4)
            RETURNING id, branch_id, reservation_id, action, snapshot, created_at
            "#,
        )
        .bind(self.branch_id)
        .bind(reservation.id)
        .bind(action)
        .bind(snapshot)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(entry)
    }

    /// Newest first
    #[instrument(skip(self), fields(branch_id = self.branch_id), err)]
    pub async fn list(&mut self, filter: &HistoryFilter) -> Result<Vec<ReservationHistoryDBResponse>> {
        let mut query = QueryBuilder::new(
            "SELECT id, branch_id, reservation_id, action, snapshot, created_at FROM reservation_history WHERE branch_id = ",
        );
        query.push_bind(self.branch_id);
        if let Some(reservation_id) = filter.reservation_id {
            query.push(" AND reservation_id = ");
            query.push_bind(reservation_id);
        }
        query.push(" ORDER BY created_at DESC, id DESC LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let entries = query
            .build_query_as::<ReservationHistoryDBResponse>()
            .fetch_all(&mut *self.db)
            .await?;

        Ok(entries)
    }

    #[instrument(skip(self), fields(branch_id = self.branch_id), err)]
    pub async fn count(&mut self, filter: &HistoryFilter) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM reservation_history WHERE branch_id = $1 AND ($2::BIGINT IS NULL OR reservation_id = $2)",
        )
        .bind(self.branch_id)
        .bind(filter.reservation_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(count)
    }
}
