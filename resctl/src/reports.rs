//! Date and time bucketing for reports and the dashboard.
//!
//! Buckets count every reservation regardless of status, so cancelled and no-show bookings
//! stay visible in the trends. Guest sums only include active reservations.

use crate::booking::{ReservationStatus, hour_slot};
use crate::occupancy::ReservationSnapshot;
use crate::types::SectionId;
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StatusCount {
    pub status: ReservationStatus,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReportSummary {
    pub total_reservations: i64,
    /// Guests across active reservations
    pub total_guests: i64,
    /// Guests per active reservation
    pub average_party_size: f64,
    /// One entry per status, in lifecycle order
    pub by_status: Vec<StatusCount>,
    /// Percentage of reservations marked `customer_no_show`
    pub no_show_rate: f64,
    /// Percentage of reservations cancelled by either side
    pub cancellation_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub reservations: i64,
    pub guests: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HourBucket {
    pub hour: u32,
    pub reservations: i64,
    pub guests: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WeekdayBucket {
    #[schema(example = "Monday")]
    pub weekday: String,
    pub reservations: i64,
    pub guests: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SectionBucket {
    /// `None` for reservations without a table
    pub section_id: Option<SectionId>,
    pub section_name: String,
    pub reservations: i64,
    pub guests: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Report {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub summary: ReportSummary,
    pub by_day: Vec<DayBucket>,
    pub by_hour: Vec<HourBucket>,
    pub by_weekday: Vec<WeekdayBucket>,
    pub by_section: Vec<SectionBucket>,
}

impl Report {
    pub fn build(start_date: NaiveDate, end_date: NaiveDate, reservations: &[ReservationSnapshot]) -> Self {
        let in_range = filter_by_date_range(reservations, start_date, end_date);
        Self {
            start_date,
            end_date,
            summary: summarize(&in_range),
            by_day: by_day(&in_range),
            by_hour: by_hour(&in_range),
            by_weekday: by_weekday(&in_range),
            by_section: by_section(&in_range),
        }
    }
}

pub const UNASSIGNED_SECTION: &str = "Unassigned";

#[derive(Default)]
struct Counter {
    reservations: i64,
    guests: i64,
}

impl Counter {
    fn add(&mut self, reservation: &ReservationSnapshot) {
        self.reservations += 1;
        if reservation.status.is_active() {
            self.guests += i64::from(reservation.guest_count);
        }
    }
}

/// Reservations dated within `[start, end]`, both ends included.
pub fn filter_by_date_range(reservations: &[ReservationSnapshot], start: NaiveDate, end: NaiveDate) -> Vec<ReservationSnapshot> {
    reservations
        .iter()
        .filter(|r| r.date >= start && r.date <= end)
        .cloned()
        .collect()
}

fn percentage(part: i64, whole: i64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}

pub fn summarize(reservations: &[ReservationSnapshot]) -> ReportSummary {
    let mut per_status: HashMap<ReservationStatus, i64> = HashMap::new();
    let mut active = Counter::default();
    for reservation in reservations {
        *per_status.entry(reservation.status).or_default() += 1;
        if reservation.status.is_active() {
            active.add(reservation);
        }
    }

    let total = reservations.len() as i64;
    let count_of = |status: ReservationStatus| per_status.get(&status).copied().unwrap_or(0);
    let cancelled = count_of(ReservationStatus::CustomerCancelled) + count_of(ReservationStatus::Cancelled);

    ReportSummary {
        total_reservations: total,
        total_guests: active.guests,
        average_party_size: if active.reservations == 0 {
            0.0
        } else {
            active.guests as f64 / active.reservations as f64
        },
        by_status: ReservationStatus::ALL
            .iter()
            .map(|status| StatusCount {
                status: *status,
                count: count_of(*status),
            })
            .collect(),
        no_show_rate: percentage(count_of(ReservationStatus::CustomerNoShow), total),
        cancellation_rate: percentage(cancelled, total),
    }
}

/// Dates with at least one reservation, ascending.
pub fn by_day(reservations: &[ReservationSnapshot]) -> Vec<DayBucket> {
    let mut days: BTreeMap<NaiveDate, Counter> = BTreeMap::new();
    for reservation in reservations {
        days.entry(reservation.date).or_default().add(reservation);
    }
    days.into_iter()
        .map(|(date, c)| DayBucket {
            date,
            reservations: c.reservations,
            guests: c.guests,
        })
        .collect()
}

/// Hours with at least one reservation, ascending.
pub fn by_hour(reservations: &[ReservationSnapshot]) -> Vec<HourBucket> {
    let mut hours: BTreeMap<u32, Counter> = BTreeMap::new();
    for reservation in reservations {
        hours.entry(hour_slot(reservation.time)).or_default().add(reservation);
    }
    hours
        .into_iter()
        .map(|(hour, c)| HourBucket {
            hour,
            reservations: c.reservations,
            guests: c.guests,
        })
        .collect()
}

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// All seven weekdays, Monday first, including empty ones.
pub fn by_weekday(reservations: &[ReservationSnapshot]) -> Vec<WeekdayBucket> {
    let mut counters: [Counter; 7] = Default::default();
    for reservation in reservations {
        counters[reservation.date.weekday().num_days_from_monday() as usize].add(reservation);
    }
    WEEK.iter()
        .zip(counters)
        .map(|(day, c)| WeekdayBucket {
            weekday: weekday_name(*day).to_string(),
            reservations: c.reservations,
            guests: c.guests,
        })
        .collect()
}

/// Per section, busiest first. Reservations without a table are grouped as "Unassigned".
pub fn by_section(reservations: &[ReservationSnapshot]) -> Vec<SectionBucket> {
    let mut sections: HashMap<Option<SectionId>, (String, Counter)> = HashMap::new();
    for reservation in reservations {
        let (_, counter) = sections.entry(reservation.section_id).or_insert_with(|| {
            let name = match (reservation.section_id, reservation.section_name.as_deref()) {
                (Some(_), Some(name)) => name.to_string(),
                (Some(id), None) => format!("Section {id}"),
                (None, _) => UNASSIGNED_SECTION.to_string(),
            };
            (name, Counter::default())
        });
        counter.add(reservation);
    }

    let mut buckets: Vec<_> = sections
        .into_iter()
        .map(|(section_id, (section_name, c))| SectionBucket {
            section_id,
            section_name,
            reservations: c.reservations,
            guests: c.guests,
        })
        .collect();
    buckets.sort_by(|a, b| b.reservations.cmp(&a.reservations).then_with(|| a.section_name.cmp(&b.section_name)));
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    fn snapshot(day: u32, hour: u32, guests: i32, status: ReservationStatus, section: Option<(SectionId, &str)>) -> ReservationSnapshot {
        ReservationSnapshot {
            id: 0,
            date: date(day),
            time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
            guest_count: guests,
            status,
            section_id: section.map(|(id, _)| id),
            section_name: section.map(|(_, name)| name.to_string()),
        }
    }

    fn sample() -> Vec<ReservationSnapshot> {
        use ReservationStatus::*;
        vec![
            snapshot(10, 19, 4, Completed, Some((1, "Hall"))),
            snapshot(10, 19, 2, CustomerNoShow, Some((1, "Hall"))),
            snapshot(11, 12, 6, Confirmed, Some((2, "Patio"))),
            snapshot(12, 20, 3, Cancelled, None),
            snapshot(14, 20, 2, Pending, None),
        ]
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let all = sample();
        let inside = filter_by_date_range(&all, date(10), date(12));
        assert_eq!(inside.len(), 4);
        assert_eq!(filter_by_date_range(&all, date(14), date(14)).len(), 1);
        assert!(filter_by_date_range(&all, date(15), date(20)).is_empty());
    }

    #[test]
    fn test_summary_rates() {
        let summary = summarize(&sample());
        assert_eq!(summary.total_reservations, 5);
        assert_eq!(summary.total_guests, 12);
        assert_eq!(summary.average_party_size, 4.0);
        assert_eq!(summary.no_show_rate, 20.0);
        assert_eq!(summary.cancellation_rate, 20.0);
        assert_eq!(summary.by_status.len(), ReservationStatus::ALL.len());
        assert_eq!(
            summary.by_status[0],
            StatusCount {
                status: ReservationStatus::Pending,
                count: 1
            }
        );

        let empty = summarize(&[]);
        assert_eq!(empty.no_show_rate, 0.0);
        assert_eq!(empty.average_party_size, 0.0);
    }

    #[test]
    fn test_time_buckets() {
        let all = sample();

        let days: Vec<_> = by_day(&all).into_iter().map(|d| (d.date, d.reservations, d.guests)).collect();
        assert_eq!(
            days,
            vec![(date(10), 2, 4), (date(11), 1, 6), (date(12), 1, 0), (date(14), 1, 2)]
        );

        let hours: Vec<_> = by_hour(&all).into_iter().map(|h| (h.hour, h.reservations)).collect();
        assert_eq!(hours, vec![(12, 1), (19, 2), (20, 2)]);

        // 2025-03-10 is a Monday
        let weekdays = by_weekday(&all);
        assert_eq!(weekdays.len(), 7);
        assert_eq!(weekdays[0].weekday, "Monday");
        assert_eq!(weekdays[0].reservations, 2);
        assert_eq!(weekdays[3].reservations, 0);
        assert_eq!(weekdays[4].weekday, "Friday");
        assert_eq!(weekdays[4].reservations, 1);
    }

    #[test]
    fn test_section_buckets_group_unassigned() {
        let sections = by_section(&sample());
        let names: Vec<_> = sections.iter().map(|s| (s.section_name.as_str(), s.reservations)).collect();
        assert_eq!(names, vec![("Hall", 2), ("Unassigned", 2), ("Patio", 1)]);
        assert_eq!(sections[1].section_id, None);
        assert_eq!(sections[1].guests, 2);
    }

    #[test]
    fn test_report_applies_range() {
        let report = Report::build(date(11), date(14), &sample());
        assert_eq!(report.summary.total_reservations, 3);
        assert_eq!(report.by_day.len(), 3);
    }
}
