//! Tenant (branch) resolution for incoming requests.
//!
//! Every API route is mounted twice, once under `/api/postgres` and once under
//! `/{tenant}/api/postgres`. The branch a request acts on is taken from, in order:
//!
//! 1. the `{tenant}` path segment,
//! 2. the configured tenant header (`X-Tenant-ID` by default),
//! 3. `tenancy.default_branch_id`.
//!
//! A tenant value is either a numeric branch id or a branch slug. Unknown tenants are a 404,
//! so a request can never fall through to another branch's data.

use crate::AppState;
use crate::db::handlers::Branches;
use crate::errors::Error;
use crate::types::BranchId;
use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use std::collections::HashMap;
use tracing::debug;

/// Path parameter carrying the tenant.
pub const TENANT_PATH_PARAM: &str = "tenant";

/// The branch a request is scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tenant {
    pub branch_id: BranchId,
    pub slug: String,
}

/// Where the tenant identifier came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Path,
    Header,
    Default,
}

fn identifier_from_parts(parts: &Parts, path_tenant: Option<String>, state: &AppState) -> (String, Source) {
    if let Some(tenant) = path_tenant.filter(|t| !t.trim().is_empty()) {
        return (tenant, Source::Path);
    }

    let header = parts
        .headers
        .get(state.config.tenancy.tenant_header.as_str())
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if let Some(tenant) = header {
        return (tenant.to_string(), Source::Header);
    }

    (state.config.tenancy.default_branch_id.to_string(), Source::Default)
}

impl FromRequestParts<AppState> for Tenant {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let path_tenant = Path::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .ok()
            .and_then(|Path(mut params)| params.remove(TENANT_PATH_PARAM));

        let (identifier, source) = identifier_from_parts(parts, path_tenant, state);

        let mut conn = state.db.acquire().await?;
        let branch = Branches::new(&mut conn)
            .resolve(&identifier)
            .await?
            .ok_or_else(|| Error::not_found("Tenant", &identifier))?;

        debug!(branch_id = branch.id, ?source, "Resolved tenant");

        Ok(Tenant {
            branch_id: branch.id,
            slug: branch.slug,
        })
    }
}
