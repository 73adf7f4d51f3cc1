//! Repository implementations for database access.
//!
//! One repository per table, each wrapping a `&mut PgConnection` (a pooled connection or an
//! open transaction) together with the branch it serves. Every statement a repository issues
//! filters by that branch.
//!
//! # Available Repositories
//!
//! - [`Branches`]: Tenant lookup by id or slug (not branch scoped)
//! - [`Sections`]: Seating areas and their derived capacity
//! - [`TableCategories`]: Capacity and price classifications
//! - [`Tables`]: Reservable tables, row locks and status counts
//! - [`Reservations`]: Bookings, filtered lists and overlap lookups
//! - [`ReservationHistory`]: Append-only audit snapshots
//!
//! # Common Pattern
//!
//! ```ignore
//! use resctl::db::handlers::{Repository, Reservations, ReservationHistory};
//! use resctl::db::models::reservation_history::HistoryAction;
//!
//! async fn example(pool: &sqlx::PgPool, branch_id: i64) -> Result<(), Box<dyn std::error::Error>> {
//!     let mut tx = pool.begin().await?;
//!
//!     let reservation = Reservations::new(&mut tx, branch_id).create(&request).await?;
//!     ReservationHistory::new(&mut tx, branch_id)
//!         .record(HistoryAction::Created, &reservation)
//!         .await?;
//!
//!     tx.commit().await?;
//!     Ok(())
//! }
//! ```

pub mod branches;
pub mod repository;
pub mod reservation_history;
pub mod reservations;
pub mod sections;
pub mod table_categories;
pub mod tables;

pub use branches::Branches;
pub use repository::Repository;
pub use reservation_history::ReservationHistory;
pub use reservations::Reservations;
pub use sections::Sections;
pub use table_categories::TableCategories;
pub use tables::Tables;
