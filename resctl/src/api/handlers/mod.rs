//! HTTP request handlers for all API endpoints.
//!
//! Each handler resolves the [`crate::tenancy::Tenant`], validates its input, runs the
//! branch-scoped repositories from [`crate::db::handlers`] and wraps the result in
//! [`crate::api::models::response::ApiResponse`].
//!
//! # Handler Modules
//!
//! - [`analytics`]: Occupancy calendar, dashboard and reports
//! - [`reservations`]: Reservation CRUD, status changes and history
//! - [`sections`]: Section CRUD and the active-section list
//! - [`system`]: Database connectivity check
//! - [`table_categories`]: Table category CRUD
//! - [`tables`]: Table CRUD and status changes
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Error`], which converts to the matching HTTP status and a
//! `{ "success": false, "error": ... }` body.

pub mod analytics;
pub mod reservations;
pub mod sections;
pub mod system;
pub mod table_categories;
pub mod tables;
