//! Offset pagination for list endpoints.
//!
//! Reservation and history listings take `skip` and `limit` query parameters. The values
//! actually applied are echoed back in the envelope's `pagination` block.

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

/// Default number of items to return per page.
pub const DEFAULT_LIMIT: i64 = 10;

/// Maximum number of items that can be requested per page.
pub const MAX_LIMIT: i64 = 100;

/// Query parameters shared by paginated list endpoints.
///
/// Values arrive as strings when the struct is flattened into a larger query, hence
/// `DisplayFromStr`. `limit` is clamped to `1..=MAX_LIMIT` and `skip` to non-negative.
#[serde_as]
#[derive(Debug, Default, Clone, Deserialize, IntoParams, ToSchema)]
pub struct Pagination {
    /// Number of items to skip (default: 0)
    #[param(default = 0, minimum = 0)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub skip: Option<i64>,

    /// Maximum number of items to return (default: 10, max: 100)
    #[param(default = 10, minimum = 1, maximum = 100)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub limit: Option<i64>,
}

impl Pagination {
    #[inline]
    pub fn skip(&self) -> i64 {
        self.skip.unwrap_or(0).max(0)
    }

    #[inline]
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    /// `(skip, limit)` after clamping.
    #[inline]
    pub fn params(&self) -> (i64, i64) {
        (self.skip(), self.limit())
    }

    /// Envelope metadata for a page drawn from `total_count` matching rows.
    pub fn meta(&self, total_count: i64) -> PaginationMeta {
        PaginationMeta {
            total_count,
            skip: self.skip(),
            limit: self.limit(),
        }
    }
}

/// The `pagination` block of a list response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PaginationMeta {
    /// Rows matching the filters, before skip/limit
    pub total_count: i64,
    pub skip: i64,
    pub limit: i64,
}
