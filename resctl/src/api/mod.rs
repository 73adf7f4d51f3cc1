//! API layer for HTTP request handling and data models.
//!
//! This module contains the REST API implementation, organized into:
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//! - **[`extract`]**: Extractors that turn rejections into the JSON error envelope
//!
//! # API Structure
//!
//! Every route is served under `/api/postgres` and `/{tenant}/api/postgres`:
//!
//! - **Reservations** (`/reservations`, `/update-reservation`, `/delete-reservation`,
//!   `/reservation-history`): bookings, status changes and their audit trail
//! - **Sections** (`/sections`, `/list-sections`): dining areas
//! - **Tables** (`/tables`): reservable tables and their status
//! - **Table categories** (`/table-categories`): capacity ranges and pricing
//! - **Analytics** (`/occupancy`, `/dashboard`, `/reports`): derived, read-only views
//! - **System** (`/db-test`): diagnostics
//!
//! # OpenAPI Documentation
//!
//! All endpoints are documented with `utoipa`. The document is served at `/api-docs/openapi.json`
//! and rendered at `/docs`.

pub mod extract;
pub mod handlers;
pub mod models;
