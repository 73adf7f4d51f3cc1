//! Database models for reservations.

use crate::api::models::reservations::{ReservationCreate, ReservationUpdate};
use crate::booking::{ReservationStatus, ReservationWindow};
use crate::types::{BranchId, ReservationId, SectionId, TableId};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database request for creating a reservation
#[derive(Debug, Clone)]
pub struct ReservationCreateDBRequest {
    pub table_id: Option<TableId>,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub guest_count: i32,
    pub reservation_date: NaiveDate,
    pub reservation_time: NaiveTime,
    pub duration_minutes: i32,
    pub status: ReservationStatus,
    pub notes: Option<String>,
    pub special_notes: Option<String>,
}

impl ReservationCreateDBRequest {
    /// `duration_minutes` is the resolved duration: the request's, else the table's minimum,
    /// else the configured default.
    pub fn new(create: ReservationCreate, duration_minutes: i32) -> Self {
        Self {
            table_id: create.table_id,
            customer_name: create.customer_name.trim().to_string(),
            customer_phone: create.customer_phone.trim().to_string(),
            customer_email: create.customer_email,
            guest_count: create.guest_count,
            reservation_date: create.reservation_date,
            reservation_time: create.reservation_time,
            duration_minutes,
            status: create.status.unwrap_or(ReservationStatus::Pending),
            notes: create.notes,
            special_notes: create.special_notes,
        }
    }

    pub fn window(&self) -> ReservationWindow {
        ReservationWindow::new(self.reservation_date, self.reservation_time, self.duration_minutes)
    }
}

/// Database request for updating a reservation. `None` leaves a column unchanged; the nested
/// options on nullable columns distinguish "clear" from "keep".
#[derive(Debug, Clone, Default)]
pub struct ReservationUpdateDBRequest {
    pub table_id: Option<Option<TableId>>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<Option<String>>,
    pub guest_count: Option<i32>,
    pub reservation_date: Option<NaiveDate>,
    pub reservation_time: Option<NaiveTime>,
    pub duration_minutes: Option<i32>,
    pub status: Option<ReservationStatus>,
    pub notes: Option<Option<String>>,
    pub special_notes: Option<Option<String>>,
}

impl ReservationUpdateDBRequest {
    pub fn status_only(status: ReservationStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// The time window the reservation would hold once this update is applied to `current`.
    pub fn window_after(&self, current: &ReservationDBResponse) -> ReservationWindow {
        ReservationWindow::new(
            self.reservation_date.unwrap_or(current.reservation_date),
            self.reservation_time.unwrap_or(current.reservation_time),
            self.duration_minutes.unwrap_or(current.duration_minutes),
        )
    }

    /// The table the reservation would hold once this update is applied to `current`.
    pub fn table_after(&self, current: &ReservationDBResponse) -> Option<TableId> {
        match self.table_id {
            Some(table_id) => table_id,
            None => current.table_id,
        }
    }
}

impl From<ReservationUpdate> for ReservationUpdateDBRequest {
    fn from(update: ReservationUpdate) -> Self {
        Self {
            table_id: update.table_id,
            customer_name: update.customer_name.map(|n| n.trim().to_string()),
            customer_phone: update.customer_phone.map(|p| p.trim().to_string()),
            customer_email: update.customer_email,
            guest_count: update.guest_count,
            reservation_date: update.reservation_date,
            reservation_time: update.reservation_time,
            duration_minutes: update.duration_minutes,
            status: update.status,
            notes: update.notes,
            special_notes: update.special_notes,
        }
    }
}

/// Reservation row with table, section and category details joined in.
///
/// Also serialized as-is into `reservation_history.snapshot`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ReservationDBResponse {
    pub id: ReservationId,
    pub branch_id: BranchId,
    pub table_id: Option<TableId>,
    pub table_number: Option<String>,
    pub section_id: Option<SectionId>,
    pub section_name: Option<String>,
    pub category_name: Option<String>,
    pub is_smoking: bool,
    pub is_outdoor: bool,
    pub is_vip: bool,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub guest_count: i32,
    pub reservation_date: NaiveDate,
    pub reservation_time: NaiveTime,
    pub duration_minutes: i32,
    pub status: ReservationStatus,
    pub notes: Option<String>,
    pub special_notes: Option<String>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
