//! Reservation endpoints.
//!
//! Every write runs in one transaction together with its `reservation_history` row. Writes that
//! place a reservation on a table lock the table row first, so two concurrent bookings for the
//! same table are serialized and the overlap check sees the winner.

use crate::AppState;
use crate::api::extract::{IdPath, Json, Path, Query};
use crate::api::models::reservations::{
    ListHistoryQuery, ListReservationsQuery, ReservationCreate, ReservationHistoryResponse, ReservationIdQuery,
    ReservationResponse, ReservationStatusUpdate, ReservationUpdate,
};
use crate::api::models::response::{ApiResponse, Deleted};
use crate::booking::ReservationWindow;
use crate::db::handlers::{
    Repository, ReservationHistory, Reservations, Tables, reservation_history::HistoryFilter, reservations::ReservationFilter,
};
use crate::db::models::reservation_history::HistoryAction;
use crate::db::models::reservations::{ReservationCreateDBRequest, ReservationDBResponse, ReservationUpdateDBRequest};
use crate::db::models::tables::TableDBResponse;
use crate::errors::{Error, Result};
use crate::tenancy::Tenant;
use crate::types::{BranchId, ReservationId, TableId};
use axum::{extract::State, http::StatusCode};
use sqlx::PgConnection;
use tracing::info;

/// Lock `table_id` for the rest of the transaction. Unknown or foreign tables are a 400.
async fn lock_table(conn: &mut PgConnection, branch_id: BranchId, table_id: TableId) -> Result<TableDBResponse> {
    Tables::new(conn, branch_id)
        .get_for_update(table_id)
        .await?
        .ok_or_else(|| Error::bad_request(format!("Table {table_id} does not exist")))
}

async fn ensure_available(
    conn: &mut PgConnection,
    branch_id: BranchId,
    table_id: TableId,
    window: ReservationWindow,
    exclude: Option<ReservationId>,
) -> Result<()> {
    let blocking = Reservations::new(conn, branch_id)
        .find_blocking(table_id, &window, exclude)
        .await?;

    let Some(clash) = blocking.first() else {
        return Ok(());
    };
    let at = if clash.reservation_date == window.start.date() {
        clash.reservation_time.format("%H:%M").to_string()
    } else {
        format!("{} {}", clash.reservation_date, clash.reservation_time.format("%H:%M"))
    };
    Err(Error::Conflict {
        message: format!(
            "Table {} is already booked at {at} for {} minutes",
            clash.table_number.as_deref().unwrap_or("?"),
            clash.duration_minutes
        ),
    })
}

/// Apply `request` to reservation `id` under the configured rules and record it in the history.
async fn apply_update(
    state: &AppState,
    tenant: &Tenant,
    id: ReservationId,
    request: ReservationUpdateDBRequest,
    expected_version: Option<i32>,
    touches_details: bool,
) -> Result<ReservationDBResponse> {
    let rules = &state.config.reservations;
    let mut tx = state.db.begin().await?;

    let current = Reservations::new(&mut tx, tenant.branch_id)
        .get_for_update(id)
        .await?
        .ok_or_else(|| Error::not_found("Reservation", id))?;

    if let Some(expected) = expected_version
        && expected != current.version
    {
        return Err(Error::Conflict {
            message: format!(
                "Reservation {id} was modified by someone else (version {}, expected {expected})",
                current.version
            ),
        });
    }

    if let Some(next) = request.status
        && rules.enforce_status_transitions
        && !current.status.can_transition_to(next)
    {
        let message = if current.status.is_terminal() {
            format!("Cannot change reservation status from {} to {next}: {} is final", current.status, current.status)
        } else {
            format!("Cannot change reservation status from {} to {next}", current.status)
        };
        return Err(Error::bad_request(message));
    }

    let status_after = request.status.unwrap_or(current.status);
    let moves = request.table_id.is_some()
        || request.reservation_date.is_some()
        || request.reservation_time.is_some()
        || request.duration_minutes.is_some()
        || !current.status.blocks_table();
    let check_overlap = rules.reject_overlapping && status_after.blocks_table() && moves;

    if let Some(table_id) = request.table_after(&current)
        && (request.table_id.is_some() || check_overlap)
    {
        lock_table(&mut tx, tenant.branch_id, table_id).await?;
        if check_overlap {
            ensure_available(&mut tx, tenant.branch_id, table_id, request.window_after(&current), Some(id)).await?;
        }
    }

    let updated = Reservations::new(&mut tx, tenant.branch_id)
        .update(id, &request)
        .await
        .map_err(|e| Error::from_db(e, "Reservation", id))?;

    let status_changed = updated.status != current.status;
    let action = if touches_details {
        Some(HistoryAction::Updated)
    } else if status_changed {
        Some(HistoryAction::StatusChanged)
    } else {
        None
    };
    if let Some(action) = action {
        ReservationHistory::new(&mut tx, tenant.branch_id).record(action, &updated).await?;
    }

    tx.commit().await?;

    if status_changed {
        metrics::counter!("resctl_reservation_status_changes_total", "status" => updated.status.as_str()).increment(1);
        info!(reservation_id = id, from = %current.status, to = %updated.status, "Reservation status changed");
    }

    Ok(updated)
}

#[utoipa::path(
    get,
    path = "/reservations",
    tag = "reservations",
    summary = "List reservations",
    description = "`date` takes precedence over `start_date`/`end_date`. Both range ends are inclusive.",
    params(ListReservationsQuery),
    responses(
        (status = 200, description = "Page of reservations in schedule order", body = ApiResponse<Vec<ReservationResponse>>),
        (status = 400, description = "Invalid filter"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_reservations(
    State(state): State<AppState>,
    tenant: Tenant,
    Query(query): Query<ListReservationsQuery>,
) -> Result<ApiResponse<Vec<ReservationResponse>>> {
    let (skip, limit) = query.pagination.params();
    let mut filter = ReservationFilter::new(skip, limit);
    match query.date {
        Some(date) => filter = filter.on_date(date),
        None => {
            if let (Some(start), Some(end)) = (query.start_date, query.end_date)
                && start > end
            {
                return Err(Error::bad_request("start_date cannot be after end_date"));
            }
            filter = filter.between(query.start_date, query.end_date);
        }
    }
    if let Some(status) = query.status {
        filter = filter.with_status(status);
    }
    if let Some(table_id) = query.table_id {
        filter = filter.with_table(table_id);
    }
    if let Some(section_id) = query.section_id {
        filter = filter.with_section(section_id);
    }
    if let Some(search) = query.search {
        filter = filter.with_search(search);
    }

    let mut conn = state.db.acquire().await?;
    let mut repo = Reservations::new(&mut conn, tenant.branch_id);
    let total_count = repo.count(&filter).await?;
    let reservations = repo.list(&filter).await?;

    Ok(ApiResponse::paginated(
        reservations.into_iter().map(ReservationResponse::from).collect(),
        query.pagination.meta(total_count),
    ))
}

#[utoipa::path(
    get,
    path = "/reservations/{id}",
    tag = "reservations",
    summary = "Get reservation",
    params(IdPath),
    responses(
        (status = 200, description = "The reservation", body = ApiResponse<ReservationResponse>),
        (status = 404, description = "Reservation not found"),
    )
)]
#[tracing::instrument(skip_all, fields(reservation_id = id))]
pub async fn get_reservation(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(IdPath { id }): Path<IdPath>,
) -> Result<ApiResponse<ReservationResponse>> {
    let mut conn = state.db.acquire().await?;
    let reservation = Reservations::new(&mut conn, tenant.branch_id)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("Reservation", id))?;

    Ok(ApiResponse::ok(reservation.into()))
}

#[utoipa::path(
    post,
    path = "/reservations",
    tag = "reservations",
    summary = "Create reservation",
    description = "Without `duration_minutes` the table's minimum reservation duration applies.",
    request_body = ReservationCreate,
    responses(
        (status = 201, description = "Reservation created", body = ApiResponse<ReservationResponse>),
        (status = 400, description = "Missing or invalid fields, or unknown table"),
        (status = 409, description = "The table is already booked for an overlapping time"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_reservation(
    State(state): State<AppState>,
    tenant: Tenant,
    Json(create): Json<ReservationCreate>,
) -> Result<(StatusCode, ApiResponse<ReservationResponse>)> {
    create.validate()?;

    let rules = &state.config.reservations;
    let mut tx = state.db.begin().await?;

    let table = match create.table_id {
        Some(table_id) => Some(lock_table(&mut tx, tenant.branch_id, table_id).await?),
        None => None,
    };
    let duration = create
        .duration_minutes
        .or(table.as_ref().map(|t| t.min_reservation_duration))
        .unwrap_or(rules.default_duration_minutes);
    let request = ReservationCreateDBRequest::new(create, duration);

    if let Some(table_id) = request.table_id
        && rules.reject_overlapping
        && request.status.blocks_table()
    {
        ensure_available(&mut tx, tenant.branch_id, table_id, request.window(), None).await?;
    }

    let reservation = Reservations::new(&mut tx, tenant.branch_id).create(&request).await?;
    ReservationHistory::new(&mut tx, tenant.branch_id)
        .record(HistoryAction::Created, &reservation)
        .await?;
    tx.commit().await?;

    metrics::counter!("resctl_reservations_created_total").increment(1);
    info!(
        reservation_id = reservation.id,
        table_id = ?reservation.table_id,
        date = %reservation.reservation_date,
        "Reservation created"
    );

    Ok((StatusCode::CREATED, ApiResponse::ok(reservation.into())))
}

#[utoipa::path(
    put,
    path = "/update-reservation",
    tag = "reservations",
    summary = "Update reservation",
    description = "Partial update: absent fields are kept, `null` clears nullable fields. \
                   Send `expected_version` to reject the write when someone else changed the reservation first.",
    params(ReservationIdQuery),
    request_body = ReservationUpdate,
    responses(
        (status = 200, description = "Reservation updated", body = ApiResponse<ReservationResponse>),
        (status = 400, description = "Invalid fields, unknown table or disallowed status change"),
        (status = 404, description = "Reservation not found"),
        (status = 409, description = "Overlapping booking or stale version"),
    )
)]
#[tracing::instrument(skip_all, fields(reservation_id = reservation_id))]
pub async fn update_reservation(
    State(state): State<AppState>,
    tenant: Tenant,
    Query(ReservationIdQuery { reservation_id }): Query<ReservationIdQuery>,
    Json(update): Json<ReservationUpdate>,
) -> Result<ApiResponse<ReservationResponse>> {
    update.validate()?;

    let expected_version = update.expected_version;
    let touches_details = update.touches_details();
    let reservation = apply_update(
        &state,
        &tenant,
        reservation_id,
        update.into(),
        expected_version,
        touches_details,
    )
    .await?;

    Ok(ApiResponse::ok(reservation.into()))
}

#[utoipa::path(
    patch,
    path = "/reservations/{id}/status",
    tag = "reservations",
    summary = "Change reservation status",
    params(IdPath),
    request_body = ReservationStatusUpdate,
    responses(
        (status = 200, description = "Status changed", body = ApiResponse<ReservationResponse>),
        (status = 400, description = "Unknown status or disallowed transition"),
        (status = 404, description = "Reservation not found"),
        (status = 409, description = "Stale version, or the table is no longer free"),
    )
)]
#[tracing::instrument(skip_all, fields(reservation_id = id))]
pub async fn update_reservation_status(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(IdPath { id }): Path<IdPath>,
    Json(update): Json<ReservationStatusUpdate>,
) -> Result<ApiResponse<ReservationResponse>> {
    let request = ReservationUpdateDBRequest::status_only(update.status);
    let reservation = apply_update(&state, &tenant, id, request, update.expected_version, false).await?;

    Ok(ApiResponse::ok(reservation.into()))
}

#[utoipa::path(
    delete,
    path = "/delete-reservation",
    tag = "reservations",
    summary = "Delete reservation",
    description = "The last state of the reservation is kept in its history.",
    params(ReservationIdQuery),
    responses(
        (status = 200, description = "Reservation deleted", body = ApiResponse<Deleted>),
        (status = 404, description = "Reservation not found"),
    )
)]
#[tracing::instrument(skip_all, fields(reservation_id = reservation_id))]
pub async fn delete_reservation(
    State(state): State<AppState>,
    tenant: Tenant,
    Query(ReservationIdQuery { reservation_id }): Query<ReservationIdQuery>,
) -> Result<ApiResponse<Deleted>> {
    let mut tx = state.db.begin().await?;

    let mut repo = Reservations::new(&mut tx, tenant.branch_id);
    let current = repo
        .get_for_update(reservation_id)
        .await?
        .ok_or_else(|| Error::not_found("Reservation", reservation_id))?;
    if !repo.delete(reservation_id).await? {
        return Err(Error::not_found("Reservation", reservation_id));
    }

    ReservationHistory::new(&mut tx, tenant.branch_id)
        .record(HistoryAction::Deleted, &current)
        .await?;
    tx.commit().await?;

    metrics::counter!("resctl_reservations_deleted_total").increment(1);
    info!(reservation_id, "Reservation deleted");

    Ok(ApiResponse::ok(Deleted { id: reservation_id }))
}

#[utoipa::path(
    get,
    path = "/reservation-history",
    tag = "reservations",
    summary = "List reservation history",
    params(ListHistoryQuery),
    responses(
        (status = 200, description = "History entries, newest first", body = ApiResponse<Vec<ReservationHistoryResponse>>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_reservation_history(
    State(state): State<AppState>,
    tenant: Tenant,
    Query(query): Query<ListHistoryQuery>,
) -> Result<ApiResponse<Vec<ReservationHistoryResponse>>> {
    let (skip, limit) = query.pagination.params();
    let mut filter = HistoryFilter::new(skip, limit);
    if let Some(reservation_id) = query.reservation_id {
        filter = filter.for_reservation(reservation_id);
    }

    let mut conn = state.db.acquire().await?;
    let mut repo = ReservationHistory::new(&mut conn, tenant.branch_id);
    let total_count = repo.count(&filter).await?;
    let entries = repo.list(&filter).await?;

    Ok(ApiResponse::paginated(
        entries.into_iter().map(ReservationHistoryResponse::from).collect(),
        query.pagination.meta(total_count),
    ))
}
