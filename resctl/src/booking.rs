//! Reservation lifecycle and booking windows.
//!
//! The status lifecycle staff move a reservation through:
//!
//! ```text
//! pending ──► awaiting_payment ──► payment_received ──┐
//!    │                                                 ├──► customer_arrived ──► completed
//!    └──────────────► confirmed ◄──────────────────────┘
//!                         │
//!                         └──► customer_no_show / customer_cancelled / cancelled
//! ```
//!
//! `customer_cancelled` and `cancelled` are reachable from every non-terminal
//! state. Whether writes enforce the table is decided by configuration; see
//! [`crate::config::ReservationsConfig`].

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Reservation status, stored as TEXT in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Pending,
    AwaitingPayment,
    PaymentReceived,
    Confirmed,
    CustomerArrived,
    CustomerNoShow,
    CustomerCancelled,
    Cancelled,
    Completed,
}

impl ReservationStatus {
    /// Every status, in lifecycle order. Reports use this order for their buckets.
    pub const ALL: [ReservationStatus; 9] = [
        ReservationStatus::Pending,
        ReservationStatus::AwaitingPayment,
        ReservationStatus::PaymentReceived,
        ReservationStatus::Confirmed,
        ReservationStatus::CustomerArrived,
        ReservationStatus::CustomerNoShow,
        ReservationStatus::CustomerCancelled,
        ReservationStatus::Cancelled,
        ReservationStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::AwaitingPayment => "awaiting_payment",
            ReservationStatus::PaymentReceived => "payment_received",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::CustomerArrived => "customer_arrived",
            ReservationStatus::CustomerNoShow => "customer_no_show",
            ReservationStatus::CustomerCancelled => "customer_cancelled",
            ReservationStatus::Cancelled => "cancelled",
            ReservationStatus::Completed => "completed",
        }
    }

    /// Statuses reachable in one step from this one (excluding staying put).
    pub fn allowed_transitions(&self) -> &'static [ReservationStatus] {
        use ReservationStatus::*;
        match self {
            Pending => &[AwaitingPayment, Confirmed, CustomerCancelled, Cancelled],
            AwaitingPayment => &[PaymentReceived, CustomerCancelled, Cancelled],
            PaymentReceived => &[Confirmed, CustomerArrived, CustomerNoShow, CustomerCancelled, Cancelled],
            Confirmed => &[CustomerArrived, CustomerNoShow, CustomerCancelled, Cancelled],
            CustomerArrived => &[Completed],
            CustomerNoShow | CustomerCancelled | Cancelled | Completed => &[],
        }
    }

    /// Whether moving to `next` follows the lifecycle. Re-applying the current status is allowed.
    pub fn can_transition_to(&self, next: ReservationStatus) -> bool {
        *self == next || self.allowed_transitions().contains(&next)
    }

    pub fn is_terminal(&self) -> bool {
        self.allowed_transitions().is_empty()
    }

    /// Active reservations count toward occupancy and report guest totals.
    pub fn is_active(&self) -> bool {
        !matches!(
            self,
            ReservationStatus::CustomerNoShow | ReservationStatus::CustomerCancelled | ReservationStatus::Cancelled
        )
    }

    /// Whether the reservation still holds its table for its time window.
    pub fn blocks_table(&self) -> bool {
        self.is_active() && *self != ReservationStatus::Completed
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReservationStatus::ALL
            .iter()
            .find(|status| status.as_str() == s)
            .copied()
            .ok_or_else(|| format!("Unknown reservation status '{s}'"))
    }
}

/// Coarse table status shown on the floor plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TableStatus {
    Available,
    Reserved,
    Occupied,
}

/// Parse a reservation time as entered by staff: `HH:MM` or `HH:MM:SS`.
pub fn parse_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .ok()
}

/// Serde helper accepting both `HH:MM` and `HH:MM:SS`.
pub fn deserialize_time<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
where
    D: Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    parse_time(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid time '{s}', expected HH:MM or HH:MM:SS")))
}

/// Optional variant of [`deserialize_time`] for partial updates.
pub fn deserialize_optional_time<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Deserialize::deserialize(deserializer)?;
    match s {
        None => Ok(None),
        Some(s) => parse_time(&s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid time '{s}', expected HH:MM or HH:MM:SS"))),
    }
}

/// Hour bucket (0-23) a reservation time falls into.
pub fn hour_slot(time: NaiveTime) -> u32 {
    time.hour()
}

/// The span of time a reservation holds its table.
///
/// Bounds are absolute, so a window running past midnight collides with early bookings on the
/// following day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservationWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl ReservationWindow {
    pub fn new(date: NaiveDate, time: NaiveTime, duration_minutes: i32) -> Self {
        let start = date.and_time(time);
        let end = start
            .checked_add_signed(Duration::minutes(i64::from(duration_minutes.max(0))))
            .unwrap_or(NaiveDateTime::MAX);
        Self { start, end }
    }

    /// Half-open overlap: a booking ending at 20:00 does not collide with one starting at 20:00.
    pub fn overlaps(&self, other: &ReservationWindow) -> bool {
        self.start < other.end && other.start < self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    #[test]
    fn test_observed_lifecycle_transitions() {
        use ReservationStatus::*;

        assert!(Pending.can_transition_to(AwaitingPayment));
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(CustomerCancelled));
        assert!(AwaitingPayment.can_transition_to(PaymentReceived));
        for from in [PaymentReceived, Confirmed] {
            assert!(from.can_transition_to(CustomerArrived));
            assert!(from.can_transition_to(CustomerNoShow));
            assert!(from.can_transition_to(CustomerCancelled));
        }
        assert!(CustomerArrived.can_transition_to(Completed));
    }

    #[test]
    fn test_illegal_transitions_rejected() {
        use ReservationStatus::*;

        assert!(!Pending.can_transition_to(CustomerArrived));
        assert!(!AwaitingPayment.can_transition_to(CustomerArrived));
        assert!(!Confirmed.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(Confirmed));
        assert!(!CustomerNoShow.can_transition_to(CustomerArrived));
    }

    #[test]
    fn test_same_status_is_always_allowed() {
        for status in ReservationStatus::ALL {
            assert!(status.can_transition_to(status), "{status} -> {status}");
        }
    }

    #[test]
    fn test_terminal_statuses() {
        let terminal: Vec<_> = ReservationStatus::ALL.into_iter().filter(|s| s.is_terminal()).collect();
        assert_eq!(
            terminal,
            vec![
                ReservationStatus::CustomerNoShow,
                ReservationStatus::CustomerCancelled,
                ReservationStatus::Cancelled,
                ReservationStatus::Completed
            ]
        );
    }

    #[test]
    fn test_active_and_blocking() {
        assert!(ReservationStatus::Completed.is_active());
        assert!(!ReservationStatus::Completed.blocks_table());
        assert!(!ReservationStatus::Cancelled.is_active());
        assert!(ReservationStatus::Confirmed.blocks_table());
    }

    #[test]
    fn test_status_string_roundtrip_matches_serde() {
        for status in ReservationStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            assert_eq!(status.as_str().parse::<ReservationStatus>().unwrap(), status);
        }
        assert!("seated".parse::<ReservationStatus>().is_err());
    }

    #[test]
    fn test_parse_time_formats() {
        assert_eq!(parse_time("19:30"), Some(time(19, 30)));
        assert_eq!(parse_time("19:30:00"), Some(time(19, 30)));
        assert_eq!(parse_time(" 07:05 "), Some(time(7, 5)));
        assert_eq!(parse_time("7pm"), None);
        assert_eq!(parse_time("25:00"), None);
    }

    #[test]
    fn test_hour_slot() {
        assert_eq!(hour_slot(time(19, 59)), 19);
        assert_eq!(hour_slot(time(0, 0)), 0);
    }

    #[test]
    fn test_windows_overlap_half_open() {
        let a = ReservationWindow::new(date(), time(18, 0), 120);
        let b = ReservationWindow::new(date(), time(19, 0), 60);
        let c = ReservationWindow::new(date(), time(20, 0), 60);

        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_windows_on_different_dates_same_time_do_not_overlap() {
        let a = ReservationWindow::new(date(), time(18, 0), 120);
        let b = ReservationWindow::new(date().succ_opt().unwrap(), time(18, 0), 120);
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn test_window_past_midnight_reaches_next_day() {
        let late = ReservationWindow::new(date(), time(23, 0), 120);
        let later = ReservationWindow::new(date(), time(23, 30), 60);
        let early_next = ReservationWindow::new(date().succ_opt().unwrap(), time(0, 30), 60);
        let after = ReservationWindow::new(date().succ_opt().unwrap(), time(1, 0), 60);

        assert_eq!(late.end, date().succ_opt().unwrap().and_time(time(1, 0)));
        assert!(late.overlaps(&later));
        assert!(late.overlaps(&early_next));
        assert!(early_next.overlaps(&late));
        assert!(!late.overlaps(&after));
    }

    #[test]
    fn test_window_at_calendar_end_saturates() {
        let window = ReservationWindow::new(NaiveDate::MAX, time(23, 0), 120);
        assert_eq!(window.end, NaiveDateTime::MAX);
        assert!(window.overlaps(&ReservationWindow::new(NaiveDate::MAX, time(23, 30), 15)));
    }
}
