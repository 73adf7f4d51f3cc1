//! API request/response models for reservations and their audit history.

use super::pagination::Pagination;
use crate::booking::{ReservationStatus, deserialize_optional_time, deserialize_time};
use crate::db::models::reservation_history::{HistoryAction, ReservationHistoryDBResponse};
use crate::db::models::reservations::ReservationDBResponse;
use crate::errors::Error;
use crate::types::{BranchId, HistoryId, ReservationId, SectionId, TableId};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

/// Query parameters for listing reservations
#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListReservationsQuery {
    /// Pagination parameters
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Only reservations on this date (takes precedence over the range)
    #[param(value_type = Option<String>, format = Date)]
    pub date: Option<NaiveDate>,
    /// Range start, inclusive
    #[param(value_type = Option<String>, format = Date)]
    pub start_date: Option<NaiveDate>,
    /// Range end, inclusive
    #[param(value_type = Option<String>, format = Date)]
    pub end_date: Option<NaiveDate>,
    pub status: Option<ReservationStatus>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub table_id: Option<TableId>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub section_id: Option<SectionId>,
    /// Case-insensitive substring match on customer name, phone or email
    pub search: Option<String>,
}

/// `?reservationId=` as sent by the dashboard's update and delete calls.
#[derive(Debug, Clone, Copy, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReservationIdQuery {
    #[serde(rename = "reservationId")]
    pub reservation_id: ReservationId,
}

/// Request body for creating a reservation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReservationCreate {
    /// Table to hold; may be assigned later
    pub table_id: Option<TableId>,
    #[schema(example = "Ada Lovelace")]
    pub customer_name: String,
    #[schema(example = "+44 20 7946 0000")]
    pub customer_phone: String,
    pub customer_email: Option<String>,
    #[schema(example = 4)]
    pub guest_count: i32,
    #[schema(value_type = String, format = Date, example = "2025-03-14")]
    pub reservation_date: NaiveDate,
    /// `HH:MM` or `HH:MM:SS`
    #[serde(deserialize_with = "deserialize_time")]
    #[schema(value_type = String, example = "19:30")]
    pub reservation_time: NaiveTime,
    /// Defaults to the table's minimum reservation duration
    pub duration_minutes: Option<i32>,
    /// Defaults to `pending`
    pub status: Option<ReservationStatus>,
    pub notes: Option<String>,
    pub special_notes: Option<String>,
}

impl ReservationCreate {
    pub fn validate(&self) -> Result<(), Error> {
        require_text("customer_name", &self.customer_name)?;
        require_text("customer_phone", &self.customer_phone)?;
        require_positive("guest_count", Some(self.guest_count))?;
        require_positive("duration_minutes", self.duration_minutes)?;
        Ok(())
    }
}

/// Partial update of a reservation. Absent fields are left unchanged; nullable fields can be
/// cleared with an explicit `null`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ReservationUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    #[schema(value_type = Option<i64>)]
    pub table_id: Option<Option<TableId>>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub customer_email: Option<Option<String>>,
    pub guest_count: Option<i32>,
    #[schema(value_type = Option<String>, format = Date)]
    pub reservation_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_optional_time")]
    #[schema(value_type = Option<String>, example = "20:00")]
    pub reservation_time: Option<NaiveTime>,
    pub duration_minutes: Option<i32>,
    pub status: Option<ReservationStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub notes: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub special_notes: Option<Option<String>>,
    /// Reject the write with 409 unless the stored version still matches
    pub expected_version: Option<i32>,
}

impl ReservationUpdate {
    pub fn validate(&self) -> Result<(), Error> {
        if let Some(name) = &self.customer_name {
            require_text("customer_name", name)?;
        }
        if let Some(phone) = &self.customer_phone {
            require_text("customer_phone", phone)?;
        }
        require_positive("guest_count", self.guest_count)?;
        require_positive("duration_minutes", self.duration_minutes)?;
        Ok(())
    }

    /// Whether the update changes anything besides the status.
    pub fn touches_details(&self) -> bool {
        self.table_id.is_some()
            || self.customer_name.is_some()
            || self.customer_phone.is_some()
            || self.customer_email.is_some()
            || self.guest_count.is_some()
            || self.reservation_date.is_some()
            || self.reservation_time.is_some()
            || self.duration_minutes.is_some()
            || self.notes.is_some()
            || self.special_notes.is_some()
    }
}

/// Request body for `PATCH /reservations/{id}/status`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReservationStatusUpdate {
    pub status: ReservationStatus,
    pub expected_version: Option<i32>,
}

/// A reservation with its table, section and category denormalized.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReservationResponse {
    pub id: ReservationId,
    pub branch_id: BranchId,
    pub table_id: Option<TableId>,
    pub table_number: Option<String>,
    pub section_id: Option<SectionId>,
    pub section_name: Option<String>,
    pub category_name: Option<String>,
    /// Inherited from the table's section
    pub is_smoking: bool,
    pub is_outdoor: bool,
    pub is_vip: bool,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub guest_count: i32,
    #[schema(value_type = String, format = Date)]
    pub reservation_date: NaiveDate,
    #[schema(value_type = String, example = "19:30:00")]
    pub reservation_time: NaiveTime,
    pub duration_minutes: i32,
    pub status: ReservationStatus,
    pub notes: Option<String>,
    pub special_notes: Option<String>,
    /// Incremented on every write
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ReservationDBResponse> for ReservationResponse {
    fn from(db: ReservationDBResponse) -> Self {
        Self {
            id: db.id,
            branch_id: db.branch_id,
            table_id: db.table_id,
            table_number: db.table_number,
            section_id: db.section_id,
            section_name: db.section_name,
            category_name: db.category_name,
            is_smoking: db.is_smoking,
            is_outdoor: db.is_outdoor,
            is_vip: db.is_vip,
            customer_name: db.customer_name,
            customer_phone: db.customer_phone,
            customer_email: db.customer_email,
            guest_count: db.guest_count,
            reservation_date: db.reservation_date,
            reservation_time: db.reservation_time,
            duration_minutes: db.duration_minutes,
            status: db.status,
            notes: db.notes,
            special_notes: db.special_notes,
            version: db.version,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// Query parameters for listing reservation history
#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListHistoryQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Only entries for this reservation
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub reservation_id: Option<ReservationId>,
}

/// One audit entry. `snapshot` is the reservation as it was right after the action (right
/// before it, for deletions).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReservationHistoryResponse {
    pub id: HistoryId,
    pub reservation_id: ReservationId,
    pub action: HistoryAction,
    #[schema(value_type = Object)]
    pub snapshot: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl From<ReservationHistoryDBResponse> for ReservationHistoryResponse {
    fn from(db: ReservationHistoryDBResponse) -> Self {
        Self {
            id: db.id,
            reservation_id: db.reservation_id,
            action: db.action,
            snapshot: db.snapshot,
            created_at: db.created_at,
        }
    }
}

pub(crate) fn require_text(field: &str, value: &str) -> Result<(), Error> {
    if value.trim().is_empty() {
        return Err(Error::bad_request(format!("{field} is required")));
    }
    Ok(())
}

pub(crate) fn require_positive(field: &str, value: Option<i32>) -> Result<(), Error> {
    match value {
        Some(v) if v <= 0 => Err(Error::bad_request(format!("{field} must be greater than 0"))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_accepts_short_time() {
        let create: ReservationCreate = serde_json::from_value(json!({
            "customer_name": "Ada",
            "customer_phone": "555-0100",
            "guest_count": 2,
            "reservation_date": "2025-03-14",
            "reservation_time": "19:30"
        }))
        .unwrap();
        assert_eq!(create.reservation_time, NaiveTime::from_hms_opt(19, 30, 0).unwrap());
        assert!(create.validate().is_ok());
    }

    #[test]
    fn test_create_validation() {
        let mut create: ReservationCreate = serde_json::from_value(json!({
            "customer_name": "  ",
            "customer_phone": "555-0100",
            "guest_count": 2,
            "reservation_date": "2025-03-14",
            "reservation_time": "19:30:00"
        }))
        .unwrap();
        assert!(create.validate().is_err());

        create.customer_name = "Ada".to_string();
        create.guest_count = 0;
        assert!(create.validate().is_err());
    }

    #[test]
    fn test_update_distinguishes_null_from_absent() {
        let update: ReservationUpdate = serde_json::from_value(json!({"notes": null, "status": "confirmed"})).unwrap();
        assert_eq!(update.notes, Some(None));
        assert_eq!(update.special_notes, None);
        assert_eq!(update.table_id, None);
        assert!(update.touches_details());

        let status_only: ReservationUpdate = serde_json::from_value(json!({"status": "confirmed"})).unwrap();
        assert!(!status_only.touches_details());
    }

    #[test]
    fn test_update_rejects_bad_time() {
        let result = serde_json::from_value::<ReservationUpdate>(json!({"reservation_time": "half past seven"}));
        assert!(result.is_err());
    }
}
