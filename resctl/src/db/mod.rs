//! Database layer for data persistence and access.
//!
//! This module implements the data access layer using SQLx with PostgreSQL.
//! It follows the Repository pattern to provide clean abstractions over database operations.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  (api::handlers - one per route)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │ Repositories│  (db::handlers - branch scoped queries)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │   Models    │  (db::models - database records)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │  PostgreSQL │
//! └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`handlers`]: Repository implementations
//! - [`models`]: Database record structures matching table schemas
//! - [`errors`]: Database-specific error types
//! - [`pools`]: Connection pool construction from configuration
//!
//! # Transactions
//!
//! Reads borrow a pooled connection. A write that also records reservation history runs both
//! statements in one transaction, so either both rows land or neither does:
//!
//! ```ignore
//! let mut tx = pool.begin().await?;
//! let deleted = Reservations::new(&mut tx, branch_id).delete(id).await?;
//! // ... record history ...
//! tx.commit().await?;
//! ```
//!
//! Queries are built at runtime with `sqlx::query_as` and `QueryBuilder`, so the crate builds
//! without a live database.
//!
//! # Migrations
//!
//! Migrations live in `migrations/` and are applied on startup through [`crate::migrator`].

pub mod errors;
pub mod handlers;
pub mod models;
pub mod pools;
