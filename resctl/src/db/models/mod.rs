//! Database record models matching table schemas.
//!
//! Each module holds the `*CreateDBRequest` / `*UpdateDBRequest` structs repositories accept
//! and the `*DBResponse` rows they return. Response rows derive `sqlx::FromRow` and include
//! the columns joined in from related tables (section and category names on tables, table,
//! section and category details on reservations).
//!
//! Database models are distinct from the API models in [`crate::api::models`]; the API layer
//! converts with `From` in both directions.
//!
//! - [`branches`]: Tenants
//! - [`sections`]: Seating areas with derived capacity
//! - [`table_categories`]: Capacity and price classifications
//! - [`tables`]: Reservable tables
//! - [`reservations`]: Bookings
//! - [`reservation_history`]: Audit snapshots of bookings

pub mod branches;
pub mod reservation_history;
pub mod reservations;
pub mod sections;
pub mod table_categories;
pub mod tables;
