//! API models for the derived views: occupancy calendar, dashboard and reports.

use super::reservations::ReservationResponse;
use crate::db::models::tables::TableStatusCounts;
use crate::errors::Error;
use crate::occupancy::{CalendarView, DailyOccupancy};
use crate::reports::ReportSummary;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Days covered by a report when no start date is given, ending on the end date.
pub const DEFAULT_REPORT_DAYS: u64 = 30;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OccupancyQuery {
    /// Anchor date, defaults to today
    #[param(value_type = Option<String>, format = Date)]
    pub date: Option<NaiveDate>,
    /// `day`, `week` (Monday to Sunday) or `month`; defaults to `day`
    #[param(inline)]
    pub view: Option<CalendarView>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DashboardQuery {
    /// Defaults to today
    #[param(value_type = Option<String>, format = Date)]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReportsQuery {
    /// Inclusive; defaults to 29 days before `end_date`
    #[param(value_type = Option<String>, format = Date)]
    pub start_date: Option<NaiveDate>,
    /// Inclusive; defaults to today
    #[param(value_type = Option<String>, format = Date)]
    pub end_date: Option<NaiveDate>,
}

impl ReportsQuery {
    /// The inclusive range to report on, given today's date.
    pub fn range(&self, today: NaiveDate) -> Result<(NaiveDate, NaiveDate), Error> {
        let end = self.end_date.unwrap_or(today);
        let start = match self.start_date {
            Some(start) => start,
            None => end.checked_sub_days(Days::new(DEFAULT_REPORT_DAYS - 1)).unwrap_or(end),
        };
        if start > end {
            return Err(Error::bad_request("start_date cannot be after end_date"));
        }
        Ok((start, end))
    }
}

/// Everything the dashboard home screen shows for one day.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DashboardResponse {
    pub date: NaiveDate,
    pub summary: ReportSummary,
    /// Reservations still holding a table, in time order
    pub upcoming: Vec<ReservationResponse>,
    pub tables: TableStatusCounts,
    pub occupancy: DailyOccupancy,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, month, day).unwrap()
    }

    #[test]
    fn test_report_range_defaults() {
        let today = date(3, 31);
        assert_eq!(ReportsQuery::default().range(today).unwrap(), (date(3, 2), today));

        let only_end = ReportsQuery {
            start_date: None,
            end_date: Some(date(2, 28)),
        };
        assert_eq!(only_end.range(today).unwrap(), (date(1, 30), date(2, 28)));
    }

    #[test]
    fn test_inverted_report_range_rejected() {
        let query = ReportsQuery {
            start_date: Some(date(3, 10)),
            end_date: Some(date(3, 1)),
        };
        assert!(matches!(query.range(date(3, 31)), Err(Error::BadRequest { .. })));
    }
}
