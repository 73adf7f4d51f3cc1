use crate::AppState;
use crate::api::extract::{IdPath, Json, Path};
use crate::api::models::response::{ApiResponse, Deleted};
use crate::api::models::sections::{SectionCreate, SectionResponse, SectionUpdate};
use crate::db::handlers::{Repository, Sections, sections::SectionFilter};
use crate::errors::{Error, Result};
use crate::tenancy::Tenant;
use axum::{extract::State, http::StatusCode};

async fn list(state: &AppState, tenant: &Tenant, filter: SectionFilter) -> Result<ApiResponse<Vec<SectionResponse>>> {
    let mut conn = state.db.acquire().await?;
    let sections = Sections::new(&mut conn, tenant.branch_id).list(&filter).await?;

    Ok(ApiResponse::ok(sections.into_iter().map(SectionResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/list-sections",
    tag = "sections",
    summary = "List active sections with capacity",
    description = "Active sections only, each with the number and total capacity of its active tables.",
    responses(
        (status = 200, description = "Active sections", body = ApiResponse<Vec<SectionResponse>>),
        (status = 404, description = "Unknown tenant"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_active_sections(State(state): State<AppState>, tenant: Tenant) -> Result<ApiResponse<Vec<SectionResponse>>> {
    list(&state, &tenant, SectionFilter::active_only()).await
}

#[utoipa::path(
    get,
    path = "/sections",
    tag = "sections",
    summary = "List sections",
    responses(
        (status = 200, description = "All sections, including inactive ones", body = ApiResponse<Vec<SectionResponse>>),
        (status = 404, description = "Unknown tenant"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_sections(State(state): State<AppState>, tenant: Tenant) -> Result<ApiResponse<Vec<SectionResponse>>> {
    list(&state, &tenant, SectionFilter::default()).await
}

#[utoipa::path(
    post,
    path = "/sections",
    tag = "sections",
    summary = "Create section",
    request_body = SectionCreate,
    responses(
        (status = 201, description = "Section created", body = ApiResponse<SectionResponse>),
        (status = 400, description = "Missing or invalid fields"),
        (status = 409, description = "A section with this name already exists"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_section(
    State(state): State<AppState>,
    tenant: Tenant,
    Json(create): Json<SectionCreate>,
) -> Result<(StatusCode, ApiResponse<SectionResponse>)> {
    create.validate()?;

    let mut conn = state.db.acquire().await?;
    let section = Sections::new(&mut conn, tenant.branch_id).create(&create.into()).await?;

    Ok((StatusCode::CREATED, ApiResponse::ok(section.into())))
}

#[utoipa::path(
    put,
    path = "/sections/{id}",
    tag = "sections",
    summary = "Update section",
    params(IdPath),
    request_body = SectionUpdate,
    responses(
        (status = 200, description = "Section updated", body = ApiResponse<SectionResponse>),
        (status = 400, description = "Invalid fields"),
        (status = 404, description = "Section not found"),
        (status = 409, description = "A section with this name already exists"),
    )
)]
#[tracing::instrument(skip_all, fields(section_id = id))]
pub async fn update_section(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(IdPath { id }): Path<IdPath>,
    Json(update): Json<SectionUpdate>,
) -> Result<ApiResponse<SectionResponse>> {
    update.validate()?;

    let mut conn = state.db.acquire().await?;
    let section = Sections::new(&mut conn, tenant.branch_id)
        .update(id, &update.into())
        .await
        .map_err(|e| Error::from_db(e, "Section", id))?;

    Ok(ApiResponse::ok(section.into()))
}

#[utoipa::path(
    delete,
    path = "/sections/{id}",
    tag = "sections",
    summary = "Delete section",
    description = "Refused while the section still has tables.",
    params(IdPath),
    responses(
        (status = 200, description = "Section deleted", body = ApiResponse<Deleted>),
        (status = 404, description = "Section not found"),
        (status = 409, description = "Section still has tables"),
    )
)]
#[tracing::instrument(skip_all, fields(section_id = id))]
pub async fn delete_section(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(IdPath { id }): Path<IdPath>,
) -> Result<ApiResponse<Deleted>> {
    let mut conn = state.db.acquire().await?;
    if !Sections::new(&mut conn, tenant.branch_id).delete(id).await? {
        return Err(Error::not_found("Section", id));
    }

    Ok(ApiResponse::ok(Deleted { id }))
}
