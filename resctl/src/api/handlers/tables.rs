use crate::AppState;
use crate::api::extract::{IdPath, Json, Path, Query};
use crate::api::models::response::{ApiResponse, Deleted};
use crate::api::models::tables::{ListTablesQuery, TableCreate, TableResponse, TableStatusUpdate, TableUpdate};
use crate::db::handlers::{Repository, Sections, TableCategories, Tables, tables::TableFilter};
use crate::errors::{Error, Result};
use crate::tenancy::Tenant;
use crate::types::{BranchId, SectionId, TableCategoryId};
use axum::{extract::State, http::StatusCode};
use sqlx::PgConnection;

/// Foreign keys only check existence, so the branch of referenced rows is checked here.
async fn ensure_references(
    conn: &mut PgConnection,
    branch_id: BranchId,
    section_id: Option<SectionId>,
    category_id: Option<TableCategoryId>,
) -> Result<()> {
    if let Some(section_id) = section_id
        && Sections::new(conn, branch_id).get_by_id(section_id).await?.is_none()
    {
        return Err(Error::bad_request(format!("Section {section_id} does not exist")));
    }
    if let Some(category_id) = category_id
        && TableCategories::new(conn, branch_id).get_by_id(category_id).await?.is_none()
    {
        return Err(Error::bad_request(format!("Table category {category_id} does not exist")));
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/tables",
    tag = "tables",
    summary = "List tables",
    params(ListTablesQuery),
    responses(
        (status = 200, description = "Tables with section and category names", body = ApiResponse<Vec<TableResponse>>),
        (status = 400, description = "Invalid filter"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_tables(
    State(state): State<AppState>,
    tenant: Tenant,
    Query(query): Query<ListTablesQuery>,
) -> Result<ApiResponse<Vec<TableResponse>>> {
    let mut filter = TableFilter::new();
    if let Some(section_id) = query.section_id {
        filter = filter.with_section(section_id);
    }
    if let Some(status) = query.status {
        filter = filter.with_status(status);
    }

    let mut conn = state.db.acquire().await?;
    let tables = Tables::new(&mut conn, tenant.branch_id).list(&filter).await?;

    Ok(ApiResponse::ok(tables.into_iter().map(TableResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/tables",
    tag = "tables",
    summary = "Create table",
    request_body = TableCreate,
    responses(
        (status = 201, description = "Table created", body = ApiResponse<TableResponse>),
        (status = 400, description = "Missing or invalid fields, or unknown section/category"),
        (status = 409, description = "Table number already in use"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_table(
    State(state): State<AppState>,
    tenant: Tenant,
    Json(create): Json<TableCreate>,
) -> Result<(StatusCode, ApiResponse<TableResponse>)> {
    create.validate()?;

    let mut conn = state.db.acquire().await?;
    ensure_references(&mut conn, tenant.branch_id, Some(create.section_id), create.category_id).await?;
    let table = Tables::new(&mut conn, tenant.branch_id).create(&create.into()).await?;

    Ok((StatusCode::CREATED, ApiResponse::ok(table.into())))
}

#[utoipa::path(
    put,
    path = "/tables/{id}",
    tag = "tables",
    summary = "Update table",
    params(IdPath),
    request_body = TableUpdate,
    responses(
        (status = 200, description = "Table updated", body = ApiResponse<TableResponse>),
        (status = 400, description = "Invalid fields, or unknown section/category"),
        (status = 404, description = "Table not found"),
        (status = 409, description = "Table number already in use"),
    )
)]
#[tracing::instrument(skip_all, fields(table_id = id))]
pub async fn update_table(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(IdPath { id }): Path<IdPath>,
    Json(update): Json<TableUpdate>,
) -> Result<ApiResponse<TableResponse>> {
    update.validate()?;

    let mut conn = state.db.acquire().await?;
    ensure_references(&mut conn, tenant.branch_id, update.section_id, update.category_id.flatten()).await?;
    let table = Tables::new(&mut conn, tenant.branch_id)
        .update(id, &update.into())
        .await
        .map_err(|e| Error::from_db(e, "Table", id))?;

    Ok(ApiResponse::ok(table.into()))
}

#[utoipa::path(
    patch,
    path = "/tables/{id}/status",
    tag = "tables",
    summary = "Set table status",
    params(IdPath),
    request_body = TableStatusUpdate,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<TableResponse>),
        (status = 400, description = "Unknown status"),
        (status = 404, description = "Table not found"),
    )
)]
#[tracing::instrument(skip_all, fields(table_id = id))]
pub async fn update_table_status(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(IdPath { id }): Path<IdPath>,
    Json(update): Json<TableStatusUpdate>,
) -> Result<ApiResponse<TableResponse>> {
    let mut conn = state.db.acquire().await?;
    let table = Tables::new(&mut conn, tenant.branch_id)
        .update_status(id, update.status)
        .await
        .map_err(|e| Error::from_db(e, "Table", id))?;

    Ok(ApiResponse::ok(table.into()))
}

#[utoipa::path(
    delete,
    path = "/tables/{id}",
    tag = "tables",
    summary = "Delete table",
    description = "Reservations on the table are kept and lose their table assignment.",
    params(IdPath),
    responses(
        (status = 200, description = "Table deleted", body = ApiResponse<Deleted>),
        (status = 404, description = "Table not found"),
    )
)]
#[tracing::instrument(skip_all, fields(table_id = id))]
pub async fn delete_table(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(IdPath { id }): Path<IdPath>,
) -> Result<ApiResponse<Deleted>> {
    let mut conn = state.db.acquire().await?;
    if !Tables::new(&mut conn, tenant.branch_id).delete(id).await? {
        return Err(Error::not_found("Table", id));
    }

    Ok(ApiResponse::ok(Deleted { id }))
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{create_branch, create_section, create_table, test_server};
    use serde_json::{Value, json};
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_table_lifecycle(pool: PgPool) {
        let server = test_server(pool);
        let hall = create_section(&server, "Hall").await;
        let patio = create_section(&server, "Patio").await;
        let table = create_table(&server, hall, "T1", 4).await;
        create_table(&server, patio, "P1", 2).await;

        let in_hall: Value = server
            .get("/api/postgres/tables")
            .add_query_param("section_id", hall)
            .await
            .json();
        assert_eq!(in_hall["data"].as_array().unwrap().len(), 1);
        assert_eq!(in_hall["data"][0]["section_name"], "Hall");
        assert_eq!(in_hall["data"][0]["min_reservation_duration"], 60);

        let moved: Value = server
            .put(&format!("/api/postgres/tables/{table}"))
            .json(&json!({"section_id": patio, "capacity": 6}))
            .await
            .json();
        assert_eq!(moved["data"]["section_name"], "Patio");
        assert_eq!(moved["data"]["capacity"], 6);
        assert_eq!(moved["data"]["table_number"], "T1");

        let occupied: Value = server
            .patch(&format!("/api/postgres/tables/{table}/status"))
            .json(&json!({"status": "occupied"}))
            .await
            .json();
        assert_eq!(occupied["data"]["status"], "occupied");

        let filtered: Value = server
            .get("/api/postgres/tables")
            .add_query_param("status", "occupied")
            .await
            .json();
        assert_eq!(filtered["data"].as_array().unwrap().len(), 1);

        server
            .patch(&format!("/api/postgres/tables/{table}/status"))
            .json(&json!({"status": "dirty"}))
            .await
            .assert_status_bad_request();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_table_rejects_foreign_or_missing_section(pool: PgPool) {
        let server = test_server(pool.clone());
        create_branch(&pool, "north").await;
        let north_section: Value = server
            .post("/north/api/postgres/sections")
            .json(&json!({"name": "North Hall"}))
            .await
            .json();
        let foreign_section = north_section["data"]["id"].as_i64().unwrap();

        let response = server
            .post("/api/postgres/tables")
            .json(&json!({"section_id": foreign_section, "table_number": "X1", "capacity": 2}))
            .await;
        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["error"], format!("Section {foreign_section} does not exist"));

        server
            .post("/api/postgres/tables")
            .json(&json!({"section_id": 999999, "table_number": "X1", "capacity": 2}))
            .await
            .assert_status_bad_request();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_table_validation_and_duplicates(pool: PgPool) {
        let server = test_server(pool);
        let hall = create_section(&server, "Hall").await;
        create_table(&server, hall, "T1", 4).await;

        server
            .post("/api/postgres/tables")
            .json(&json!({"section_id": hall, "table_number": "T2", "capacity": 0}))
            .await
            .assert_status_bad_request();

        let duplicate = server
            .post("/api/postgres/tables")
            .json(&json!({"section_id": hall, "table_number": "T1", "capacity": 2}))
            .await;
        duplicate.assert_status(axum::http::StatusCode::CONFLICT);
        let body: Value = duplicate.json();
        assert_eq!(body["error"], "Table number 'T1' is already in use");

        server.put("/api/postgres/tables/424242").json(&json!({"capacity": 3})).await.assert_status_not_found();
        server.delete("/api/postgres/tables/424242").await.assert_status_not_found();
    }
}
