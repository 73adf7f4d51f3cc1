//! OpenAPI documentation for the reservation API.
//!
//! Served as JSON at `/api-docs/openapi.json` and rendered with Scalar at `/docs`. Paths are
//! documented relative to the `/api/postgres` server; the same routes also exist under
//! `/{tenant}/api/postgres`.

use utoipa::{
    Modify, OpenApi,
    openapi::{
        RefOr, Required,
        path::{Parameter, ParameterBuilder, ParameterIn},
        schema::{ObjectBuilder, Schema, Type},
    },
};

use crate::{api, booking, db, occupancy, reports};

/// Documents the optional tenant header on every operation.
struct TenantHeaderAddon;

fn tenant_header() -> Parameter {
    ParameterBuilder::new()
        .name("X-Tenant-ID")
        .parameter_in(ParameterIn::Header)
        .required(Required::False)
        .description(Some(
            "Branch id or slug the request acts on. Ignored when the path names a tenant; \
             defaults to the configured branch when absent.",
        ))
        .schema(Some(RefOr::T(Schema::Object(
            ObjectBuilder::new().schema_type(Type::String).build(),
        ))))
        .build()
}

impl Modify for TenantHeaderAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        for item in openapi.paths.paths.values_mut() {
            let operations = [&mut item.get, &mut item.post, &mut item.put, &mut item.patch, &mut item.delete];
            for operation in operations.into_iter().flatten() {
                operation.parameters.get_or_insert_with(Vec::new).push(tenant_header());
            }
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Restaurant reservations API",
        description = "Reservations, sections, tables and table categories for each restaurant branch, \
                       with occupancy, dashboard and report views."
    ),
    servers(
        (url = "/api/postgres", description = "Tenant from the X-Tenant-ID header or the default branch"),
        (url = "/{tenant}/api/postgres", description = "Tenant from the path", variables(
            ("tenant" = (default = "main", description = "Branch id or slug"))
        )),
    ),
    modifiers(&TenantHeaderAddon),
    paths(
        api::handlers::reservations::list_reservations,
        api::handlers::reservations::get_reservation,
        api::handlers::reservations::create_reservation,
        api::handlers::reservations::update_reservation,
        api::handlers::reservations::update_reservation_status,
        api::handlers::reservations::delete_reservation,
        api::handlers::reservations::list_reservation_history,
        api::handlers::sections::list_active_sections,
        api::handlers::sections::list_sections,
        api::handlers::sections::create_section,
        api::handlers::sections::update_section,
        api::handlers::sections::delete_section,
        api::handlers::tables::list_tables,
        api::handlers::tables::create_table,
        api::handlers::tables::update_table,
        api::handlers::tables::update_table_status,
        api::handlers::tables::delete_table,
        api::handlers::table_categories::list_table_categories,
        api::handlers::table_categories::create_table_category,
        api::handlers::table_categories::update_table_category,
        api::handlers::table_categories::delete_table_category,
        api::handlers::analytics::get_occupancy,
        api::handlers::analytics::get_dashboard,
        api::handlers::analytics::get_reports,
        api::handlers::system::db_test,
    ),
    components(
        schemas(
            api::models::pagination::PaginationMeta,
            api::models::response::Deleted,
            api::models::reservations::ReservationCreate,
            api::models::reservations::ReservationUpdate,
            api::models::reservations::ReservationStatusUpdate,
            api::models::reservations::ReservationResponse,
            api::models::reservations::ReservationHistoryResponse,
            api::models::sections::SectionCreate,
            api::models::sections::SectionUpdate,
            api::models::sections::SectionResponse,
            api::models::tables::TableCreate,
            api::models::tables::TableUpdate,
            api::models::tables::TableStatusUpdate,
            api::models::tables::TableResponse,
            api::models::table_categories::TableCategoryCreate,
            api::models::table_categories::TableCategoryUpdate,
            api::models::table_categories::TableCategoryResponse,
            api::models::analytics::DashboardResponse,
            api::models::system::DbTestResponse,
            booking::ReservationStatus,
            booking::TableStatus,
            db::models::reservation_history::HistoryAction,
            db::models::tables::TableStatusCounts,
            occupancy::CalendarView,
            occupancy::OccupancyView,
            occupancy::DailyOccupancy,
            occupancy::SectionOccupancy,
            occupancy::HourlyOccupancy,
            occupancy::SectionCapacity,
            reports::Report,
            reports::ReportSummary,
            reports::StatusCount,
            reports::DayBucket,
            reports::HourBucket,
            reports::WeekdayBucket,
            reports::SectionBucket,
        )
    ),
    tags(
        (name = "reservations", description = "Bookings, their status lifecycle and audit history.

Status changes follow the lifecycle `pending → awaiting_payment → payment_received → confirmed → customer_arrived → completed`,
with `customer_no_show`, `customer_cancelled` and `cancelled` as terminal exits. Every write bumps `version`;
send `expected_version` to detect concurrent edits."),
        (name = "sections", description = "Dining areas. Capacity is derived from their active tables."),
        (name = "tables", description = "Reservable tables with capacity and booking duration limits."),
        (name = "table_categories", description = "Table classifications with a capacity range and price."),
        (name = "analytics", description = "Occupancy calendar, dashboard summary and reports."),
        (name = "system", description = "Service diagnostics."),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_operation_documents_tenant_header() {
        let doc = ApiDoc::openapi();
        let reservations = doc.paths.paths.get("/reservations").unwrap();
        for operation in [&reservations.get, &reservations.post].into_iter().flatten() {
            let params = operation.parameters.as_ref().unwrap();
            assert!(params.iter().any(|p| p.name == "X-Tenant-ID"));
        }
    }

    #[test]
    fn test_openapi_document_serializes() {
        let json = ApiDoc::openapi().to_json().unwrap();
        assert!(json.contains("/update-reservation"));
        assert!(json.contains("/list-sections"));
    }
}
