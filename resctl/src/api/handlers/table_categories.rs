use crate::AppState;
use crate::api::extract::{IdPath, Json, Path};
use crate::api::models::response::{ApiResponse, Deleted};
use crate::api::models::table_categories::{TableCategoryCreate, TableCategoryResponse, TableCategoryUpdate};
use crate::db::handlers::{Repository, TableCategories};
use crate::errors::{Error, Result};
use crate::tenancy::Tenant;
use axum::{extract::State, http::StatusCode};

#[utoipa::path(
    get,
    path = "/table-categories",
    tag = "table_categories",
    summary = "List table categories",
    responses(
        (status = 200, description = "Categories ordered by capacity", body = ApiResponse<Vec<TableCategoryResponse>>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_table_categories(
    State(state): State<AppState>,
    tenant: Tenant,
) -> Result<ApiResponse<Vec<TableCategoryResponse>>> {
    let mut conn = state.db.acquire().await?;
    let categories = TableCategories::new(&mut conn, tenant.branch_id).list(&()).await?;

    Ok(ApiResponse::ok(categories.into_iter().map(TableCategoryResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/table-categories",
    tag = "table_categories",
    summary = "Create table category",
    request_body = TableCategoryCreate,
    responses(
        (status = 201, description = "Category created", body = ApiResponse<TableCategoryResponse>),
        (status = 400, description = "Missing or invalid fields"),
        (status = 409, description = "A category with this name already exists"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_table_category(
    State(state): State<AppState>,
    tenant: Tenant,
    Json(create): Json<TableCategoryCreate>,
) -> Result<(StatusCode, ApiResponse<TableCategoryResponse>)> {
    create.validate()?;

    let mut conn = state.db.acquire().await?;
    let category = TableCategories::new(&mut conn, tenant.branch_id).create(&create.into()).await?;

    Ok((StatusCode::CREATED, ApiResponse::ok(category.into())))
}

#[utoipa::path(
    put,
    path = "/table-categories/{id}",
    tag = "table_categories",
    summary = "Update table category",
    params(IdPath),
    request_body = TableCategoryUpdate,
    responses(
        (status = 200, description = "Category updated", body = ApiResponse<TableCategoryResponse>),
        (status = 400, description = "Invalid fields, or the resulting capacity range is inverted"),
        (status = 404, description = "Category not found"),
        (status = 409, description = "A category with this name already exists"),
    )
)]
#[tracing::instrument(skip_all, fields(category_id = id))]
pub async fn update_table_category(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(IdPath { id }): Path<IdPath>,
    Json(update): Json<TableCategoryUpdate>,
) -> Result<ApiResponse<TableCategoryResponse>> {
    update.validate()?;

    let mut conn = state.db.acquire().await?;
    let category = TableCategories::new(&mut conn, tenant.branch_id)
        .update(id, &update.into())
        .await
        .map_err(|e| Error::from_db(e, "Table category", id))?;

    Ok(ApiResponse::ok(category.into()))
}

#[utoipa::path(
    delete,
    path = "/table-categories/{id}",
    tag = "table_categories",
    summary = "Delete table category",
    description = "Tables in the category are kept and lose their category.",
    params(IdPath),
    responses(
        (status = 200, description = "Category deleted", body = ApiResponse<Deleted>),
        (status = 404, description = "Category not found"),
    )
)]
#[tracing::instrument(skip_all, fields(category_id = id))]
pub async fn delete_table_category(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(IdPath { id }): Path<IdPath>,
) -> Result<ApiResponse<Deleted>> {
    let mut conn = state.db.acquire().await?;
    if !TableCategories::new(&mut conn, tenant.branch_id).delete(id).await? {
        return Err(Error::not_found("Table category", id));
    }

    Ok(ApiResponse::ok(Deleted { id }))
}
