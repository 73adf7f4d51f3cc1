//! API request and response data models.
//!
//! API models are distinct from the database models in [`crate::db::models`]: requests convert
//! into `*DBRequest` structs and `*DBResponse` rows convert into the `*Response` types here.
//! Every model carries `utoipa` annotations for the generated OpenAPI document.
//!
//! - [`reservations`]: Bookings, status changes and audit history
//! - [`sections`]: Seating areas
//! - [`tables`]: Reservable tables
//! - [`table_categories`]: Capacity and price classifications
//! - [`analytics`]: Occupancy, dashboard and report queries
//! - [`system`]: Diagnostics
//! - [`pagination`] and [`response`]: The shared envelope

pub mod analytics;
pub mod pagination;
pub mod reservations;
pub mod response;
pub mod sections;
pub mod system;
pub mod table_categories;
pub mod tables;
