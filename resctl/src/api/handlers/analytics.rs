//! Derived views: the occupancy calendar, the dashboard and reports.
//!
//! Each endpoint loads the reservations and tables it needs for the branch once, then hands
//! them to the pure aggregation in [`crate::occupancy`] and [`crate::reports`].

use crate::AppState;
use crate::api::extract::Query;
use crate::api::models::analytics::{DashboardQuery, DashboardResponse, OccupancyQuery, ReportsQuery};
use crate::api::models::reservations::ReservationResponse;
use crate::api::models::response::ApiResponse;
use crate::db::handlers::{Repository, Reservations, Tables, tables::TableFilter};
use crate::errors::{Error, Result};
use crate::occupancy::{OccupancyView, ReservationSnapshot, TableSnapshot, daily_occupancy, occupancy_view};
use crate::reports::{Report, summarize};
use crate::tenancy::Tenant;
use crate::types::BranchId;
use axum::extract::State;
use chrono::{Local, NaiveDate};
use sqlx::PgConnection;

fn today() -> NaiveDate {
    Local::now().date_naive()
}

async fn load_snapshots(
    conn: &mut PgConnection,
    branch_id: BranchId,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<(Vec<ReservationSnapshot>, Vec<TableSnapshot>)> {
    let reservations = Reservations::new(&mut *conn, branch_id).list_in_range(start, end).await?;
    let tables = Tables::new(&mut *conn, branch_id).list(&TableFilter::new()).await?;

    Ok((
        reservations.iter().map(ReservationSnapshot::from).collect(),
        tables.iter().map(TableSnapshot::from).collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/occupancy",
    tag = "analytics",
    summary = "Occupancy calendar",
    description = "Per-section guest counts and occupancy rates for each day of the view, \
                   broken down by hour. `rate` is unclamped; `display_rate` is clamped to 0-100.",
    params(OccupancyQuery),
    responses(
        (status = 200, description = "Occupancy for the requested view", body = ApiResponse<OccupancyView>),
        (status = 400, description = "Invalid date or view"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_occupancy(
    State(state): State<AppState>,
    tenant: Tenant,
    Query(query): Query<OccupancyQuery>,
) -> Result<ApiResponse<OccupancyView>> {
    let view = query.view.unwrap_or_default();
    let date = query.date.unwrap_or_else(today);
    let (start, end) = view.range(date).ok_or_else(|| Error::bad_request("date out of range"))?;

    let mut conn = state.db.acquire().await?;
    let (reservations, tables) = load_snapshots(&mut conn, tenant.branch_id, start, end).await?;

    Ok(ApiResponse::ok(occupancy_view(view, (start, end), &reservations, &tables)))
}

#[utoipa::path(
    get,
    path = "/dashboard",
    tag = "analytics",
    summary = "Dashboard summary",
    description = "The day's report summary, reservations still to come, table status counts and occupancy.",
    params(DashboardQuery),
    responses(
        (status = 200, description = "Dashboard for the day", body = ApiResponse<DashboardResponse>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_dashboard(
    State(state): State<AppState>,
    tenant: Tenant,
    Query(query): Query<DashboardQuery>,
) -> Result<ApiResponse<DashboardResponse>> {
    let now = Local::now();
    let date = query.date.unwrap_or_else(|| now.date_naive());
    // Earlier bookings today are no longer upcoming
    let from = (date == now.date_naive()).then(|| now.time());

    let mut conn = state.db.acquire().await?;
    let (reservations, tables) = load_snapshots(&mut conn, tenant.branch_id, date, date).await?;
    let upcoming = Reservations::new(&mut conn, tenant.branch_id)
        .upcoming(date, from, state.config.reservations.upcoming_limit)
        .await?;
    let table_counts = Tables::new(&mut conn, tenant.branch_id).status_counts().await?;

    Ok(ApiResponse::ok(DashboardResponse {
        date,
        summary: summarize(&reservations),
        upcoming: upcoming.into_iter().map(ReservationResponse::from).collect(),
        tables: table_counts,
        occupancy: daily_occupancy(date, &reservations, &tables),
    }))
}

#[utoipa::path(
    get,
    path = "/reports",
    tag = "analytics",
    summary = "Reservation reports",
    description = "Summary plus per-day, per-hour, per-weekday and per-section buckets over an inclusive \
                   date range. Defaults to the 30 days ending today.",
    params(ReportsQuery),
    responses(
        (status = 200, description = "Report over the range", body = ApiResponse<Report>),
        (status = 400, description = "start_date is after end_date"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_reports(
    State(state): State<AppState>,
    tenant: Tenant,
    Query(query): Query<ReportsQuery>,
) -> Result<ApiResponse<Report>> {
    let (start, end) = query.range(today())?;

    let mut conn = state.db.acquire().await?;
    let reservations = Reservations::new(&mut conn, tenant.branch_id).list_in_range(start, end).await?;
    let snapshots: Vec<_> = reservations.iter().map(ReservationSnapshot::from).collect();

    Ok(ApiResponse::ok(Report::build(start, end, &snapshots)))
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{create_reservation, create_section, create_table, test_server};
    use serde_json::{Value, json};
    use sqlx::PgPool;

    async fn seed(server: &axum_test::TestServer) {
        let hall = create_section(server, "Hall").await;
        let t1 = create_table(server, hall, "T1", 4).await;
        let t2 = create_table(server, hall, "T2", 4).await;

        let first = create_reservation(server, Some(t1), "2025-03-10", "19:00").await;
        create_reservation(server, Some(t2), "2025-03-10", "19:30").await;
        create_reservation(server, None, "2025-03-12", "12:00").await;

        server
            .patch(&format!("/api/postgres/reservations/{}/status", first["id"]))
            .json(&json!({"status": "cancelled"}))
            .await
            .assert_status_ok();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_day_occupancy(pool: PgPool) {
        let server = test_server(pool);
        seed(&server).await;

        let body: Value = server
            .get("/api/postgres/occupancy")
            .add_query_param("date", "2025-03-10")
            .await
            .json();
        let view = &body["data"];
        assert_eq!(view["view"], "day");
        assert_eq!(view["total_capacity"], 8);
        assert_eq!(view["days"].as_array().unwrap().len(), 1);

        // The cancelled booking does not count
        let hall = &view["days"][0]["sections"][0];
        assert_eq!(hall["section_name"], "Hall");
        assert_eq!(hall["guests"], 2);
        assert_eq!(hall["rate"], 25.0);
        assert_eq!(hall["hours"][0]["hour"], 19);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_week_and_month_views(pool: PgPool) {
        let server = test_server(pool);
        seed(&server).await;

        let week: Value = server
            .get("/api/postgres/occupancy")
            .add_query_param("date", "2025-03-12")
            .add_query_param("view", "week")
            .await
            .json();
        assert_eq!(week["data"]["start_date"], "2025-03-10");
        assert_eq!(week["data"]["end_date"], "2025-03-16");
        assert_eq!(week["data"]["days"].as_array().unwrap().len(), 7);
        assert_eq!(week["data"]["days"][2]["reservations"], 1);

        let month: Value = server
            .get("/api/postgres/occupancy")
            .add_query_param("date", "2025-02-14")
            .add_query_param("view", "month")
            .await
            .json();
        assert_eq!(month["data"]["days"].as_array().unwrap().len(), 28);

        server
            .get("/api/postgres/occupancy")
            .add_query_param("view", "year")
            .await
            .assert_status_bad_request();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_views_at_end_of_calendar(pool: PgPool) {
        let server = test_server(pool);

        let week = server
            .get("/api/postgres/occupancy")
            .add_query_param("view", "week")
            .add_query_param("date", "+262142-12-31")
            .await;
        week.assert_status_bad_request();
        let body: Value = week.json();
        assert_eq!(body["error"], "date out of range");

        let month: Value = server
            .get("/api/postgres/occupancy")
            .add_query_param("view", "month")
            .add_query_param("date", "+262142-12-31")
            .await
            .json();
        assert_eq!(month["data"]["start_date"], "+262142-12-01");
        assert_eq!(month["data"]["days"].as_array().unwrap().len(), 31);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_reports_over_range(pool: PgPool) {
        let server = test_server(pool);
        seed(&server).await;

        let body: Value = server
            .get("/api/postgres/reports")
            .add_query_param("start_date", "2025-03-10")
            .add_query_param("end_date", "2025-03-12")
            .await
            .json();
        let report = &body["data"];
        assert_eq!(report["summary"]["total_reservations"], 3);
        assert_eq!(report["by_day"].as_array().unwrap().len(), 2);
        assert_eq!(report["by_weekday"][0]["weekday"], "Monday");
        assert_eq!(report["by_weekday"][0]["reservations"], 2);
        assert_eq!(report["by_section"][0]["section_name"], "Hall");

        server
            .get("/api/postgres/reports")
            .add_query_param("start_date", "2025-03-12")
            .add_query_param("end_date", "2025-03-10")
            .await
            .assert_status_bad_request();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_dashboard_for_past_day(pool: PgPool) {
        let server = test_server(pool);
        seed(&server).await;

        let body: Value = server
            .get("/api/postgres/dashboard")
            .add_query_param("date", "2025-03-10")
            .await
            .json();
        let dashboard = &body["data"];
        assert_eq!(dashboard["summary"]["total_reservations"], 2);
        // A date other than today lists the whole day; the cancelled booking no longer holds a table
        let upcoming = dashboard["upcoming"].as_array().unwrap();
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0]["reservation_time"], "19:30:00");
        assert_eq!(dashboard["tables"]["total"], 2);
        assert_eq!(dashboard["tables"]["available"], 2);
        assert_eq!(dashboard["occupancy"]["guests"], 2);
    }
}
