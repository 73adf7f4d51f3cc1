//! Common type definitions.
//!
//! # ID Types
//!
//! All entity IDs are `BIGSERIAL` keys wrapped in type aliases so signatures say
//! which table they point at:
//!
//! - [`BranchId`]: Tenant (franchise branch) identifier
//! - [`SectionId`]: Seating area identifier
//! - [`TableId`]: Reservable table identifier
//! - [`TableCategoryId`]: Capacity/price classification identifier
//! - [`ReservationId`]: Booking identifier
//! - [`HistoryId`]: Reservation audit row identifier

use std::fmt;

// Type aliases for IDs
pub type BranchId = i64;
pub type SectionId = i64;
pub type TableId = i64;
pub type TableCategoryId = i64;
pub type ReservationId = i64;
pub type HistoryId = i64;

/// Write operations, used when reporting why an entity refused a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Create => write!(f, "create"),
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
        }
    }
}
