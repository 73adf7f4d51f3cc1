//! Occupancy aggregation for the calendar views.
//!
//! Pure functions over reservation and table snapshots already loaded for one branch. The
//! rate of a section in a bucket is the guests seated there divided by the section's
//! capacity, as a percentage:
//!
//! ```text
//! rate = Σ guest_count / Σ capacity(active tables in section) × 100
//! ```
//!
//! `rate` is not clamped, so overbooking shows up as values above 100. `display_rate` is the
//! same number clamped to `[0, 100]` for bar widths. Only reservations whose status
//! [`is_active`](ReservationStatus::is_active) count, and reservations without a table belong
//! to no section.

use crate::booking::{ReservationStatus, hour_slot};
use crate::db::models::{reservations::ReservationDBResponse, tables::TableDBResponse};
use crate::types::{ReservationId, SectionId};
use chrono::{Datelike, Days, Months, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// The parts of a table occupancy needs.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSnapshot {
    pub section_id: SectionId,
    pub section_name: Option<String>,
    pub capacity: i32,
    pub is_active: bool,
}

impl From<&TableDBResponse> for TableSnapshot {
    fn from(table: &TableDBResponse) -> Self {
        Self {
            section_id: table.section_id,
            section_name: table.section_name.clone(),
            capacity: table.capacity,
            is_active: table.is_active,
        }
    }
}

/// The parts of a reservation occupancy and reports need.
#[derive(Debug, Clone, PartialEq)]
pub struct ReservationSnapshot {
    pub id: ReservationId,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub guest_count: i32,
    pub status: ReservationStatus,
    pub section_id: Option<SectionId>,
    pub section_name: Option<String>,
}

impl From<&ReservationDBResponse> for ReservationSnapshot {
    fn from(reservation: &ReservationDBResponse) -> Self {
        Self {
            id: reservation.id,
            date: reservation.reservation_date,
            time: reservation.reservation_time,
            guest_count: reservation.guest_count,
            status: reservation.status,
            section_id: reservation.section_id,
            section_name: reservation.section_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SectionCapacity {
    pub section_id: SectionId,
    pub section_name: String,
    pub table_count: i64,
    pub capacity: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HourlyOccupancy {
    /// Hour of day, 0-23
    pub hour: u32,
    pub reservations: i64,
    pub guests: i64,
    pub rate: f64,
    pub display_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SectionOccupancy {
    pub section_id: SectionId,
    pub section_name: String,
    pub capacity: i64,
    pub reservations: i64,
    pub guests: i64,
    /// Whole-day rate
    pub rate: f64,
    pub display_rate: f64,
    /// Only hours with at least one reservation
    pub hours: Vec<HourlyOccupancy>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DailyOccupancy {
    pub date: NaiveDate,
    /// Active reservations on the day, including those without a table
    pub reservations: i64,
    pub guests: i64,
    pub sections: Vec<SectionOccupancy>,
}

/// Calendar granularity requested by the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CalendarView {
    #[default]
    Day,
    Week,
    Month,
}

impl CalendarView {
    /// Inclusive date range the view covers around `date`. `None` when the range runs off
    /// either end of the calendar.
    pub fn range(&self, date: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        match self {
            CalendarView::Day => Some((date, date)),
            CalendarView::Week => week_range(date),
            CalendarView::Month => month_range(date),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OccupancyView {
    pub view: CalendarView,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Seats across all active tables
    pub total_capacity: i64,
    pub section_capacities: Vec<SectionCapacity>,
    pub days: Vec<DailyOccupancy>,
}

/// Active tables grouped by section, ordered by section name.
pub fn section_capacities(tables: &[TableSnapshot]) -> Vec<SectionCapacity> {
    let mut by_section: BTreeMap<SectionId, SectionCapacity> = BTreeMap::new();
    for table in tables.iter().filter(|t| t.is_active) {
        let entry = by_section.entry(table.section_id).or_insert_with(|| SectionCapacity {
            section_id: table.section_id,
            section_name: section_label(table.section_id, table.section_name.as_deref()),
            table_count: 0,
            capacity: 0,
        });
        entry.table_count += 1;
        entry.capacity += i64::from(table.capacity);
    }

    let mut capacities: Vec<_> = by_section.into_values().collect();
    capacities.sort_by(|a, b| a.section_name.cmp(&b.section_name).then(a.section_id.cmp(&b.section_id)));
    capacities
}

/// `guests / capacity × 100`, or 0 when there is no capacity.
pub fn occupancy_rate(guests: i64, capacity: i64) -> f64 {
    if capacity <= 0 {
        return 0.0;
    }
    guests as f64 / capacity as f64 * 100.0
}

pub fn display_rate(rate: f64) -> f64 {
    rate.clamp(0.0, 100.0)
}

/// Monday to Sunday of the week containing `date`.
pub fn week_range(date: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let monday = date.checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_monday())))?;
    let sunday = monday.checked_add_days(Days::new(6))?;
    Some((monday, sunday))
}

/// First to last day of the month containing `date`.
pub fn month_range(date: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let first = date.with_day(1)?;
    let last = match first.checked_add_months(Months::new(1)) {
        Some(next) => next.pred_opt()?,
        // December of the last representable year
        None => NaiveDate::from_ymd_opt(first.year(), 12, 31).filter(|_| first.month() == 12)?,
    };
    Some((first, last))
}

#[derive(Default)]
struct Tally {
    reservations: i64,
    guests: i64,
}

impl Tally {
    fn add(&mut self, guests: i32) {
        self.reservations += 1;
        self.guests += i64::from(guests);
    }
}

/// Occupancy per section and hour on one date.
pub fn daily_occupancy(date: NaiveDate, reservations: &[ReservationSnapshot], tables: &[TableSnapshot]) -> DailyOccupancy {
    daily_from_capacities(date, reservations, &section_capacities(tables))
}

fn daily_from_capacities(
    date: NaiveDate,
    reservations: &[ReservationSnapshot],
    capacities: &[SectionCapacity],
) -> DailyOccupancy {
    let mut day = Tally::default();
    let mut sections: BTreeMap<SectionId, (Tally, BTreeMap<u32, Tally>, Option<&str>)> = BTreeMap::new();

    for reservation in reservations.iter().filter(|r| r.date == date && r.status.is_active()) {
        day.add(reservation.guest_count);

        let Some(section_id) = reservation.section_id else {
            continue;
        };
        let (whole_day, hours, name) = sections.entry(section_id).or_default();
        whole_day.add(reservation.guest_count);
        hours.entry(hour_slot(reservation.time)).or_default().add(reservation.guest_count);
        if name.is_none() {
            *name = reservation.section_name.as_deref();
        }
    }

    let mut result: Vec<SectionOccupancy> = capacities
        .iter()
        .map(|capacity| {
            let seen = sections.remove(&capacity.section_id);
            section_occupancy(capacity.section_id, capacity.section_name.clone(), capacity.capacity, seen)
        })
        .collect();

    // Sections with reservations but no active tables left
    for (section_id, seen) in sections {
        let name = section_label(section_id, seen.2);
        result.push(section_occupancy(section_id, name, 0, Some(seen)));
    }
    result.sort_by(|a, b| a.section_name.cmp(&b.section_name).then(a.section_id.cmp(&b.section_id)));

    DailyOccupancy {
        date,
        reservations: day.reservations,
        guests: day.guests,
        sections: result,
    }
}

fn section_occupancy(
    section_id: SectionId,
    section_name: String,
    capacity: i64,
    seen: Option<(Tally, BTreeMap<u32, Tally>, Option<&str>)>,
) -> SectionOccupancy {
    let (whole_day, hours, _) = seen.unwrap_or_default();
    let rate = occupancy_rate(whole_day.guests, capacity);

    SectionOccupancy {
        section_id,
        section_name,
        capacity,
        reservations: whole_day.reservations,
        guests: whole_day.guests,
        rate,
        display_rate: display_rate(rate),
        hours: hours
            .into_iter()
            .map(|(hour, tally)| {
                let rate = occupancy_rate(tally.guests, capacity);
                HourlyOccupancy {
                    hour,
                    reservations: tally.reservations,
                    guests: tally.guests,
                    rate,
                    display_rate: display_rate(rate),
                }
            })
            .collect(),
    }
}

/// [`daily_occupancy`] for each day of the inclusive range. Empty when `start > end`.
pub fn range_occupancy(
    start: NaiveDate,
    end: NaiveDate,
    reservations: &[ReservationSnapshot],
    tables: &[TableSnapshot],
) -> Vec<DailyOccupancy> {
    let capacities = section_capacities(tables);
    start
        .iter_days()
        .take_while(|day| *day <= end)
        .map(|day| daily_from_capacities(day, reservations, &capacities))
        .collect()
}

/// The calendar view over `(start_date, end_date)`, as resolved by [`CalendarView::range`].
pub fn occupancy_view(
    view: CalendarView,
    (start_date, end_date): (NaiveDate, NaiveDate),
    reservations: &[ReservationSnapshot],
    tables: &[TableSnapshot],
) -> OccupancyView {
    let section_capacities = section_capacities(tables);

    OccupancyView {
        view,
        start_date,
        end_date,
        total_capacity: section_capacities.iter().map(|s| s.capacity).sum(),
        days: range_occupancy(start_date, end_date, reservations, tables),
        section_capacities,
    }
}

fn section_label(section_id: SectionId, name: Option<&str>) -> String {
    name.map(str::to_string).unwrap_or_else(|| format!("Section {section_id}"))
}
