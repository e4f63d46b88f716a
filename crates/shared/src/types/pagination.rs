//! Pagination types for list endpoints.

use serde::{Deserialize, Serialize};

/// Maximum number of items a single page may request.
const MAX_LIMIT: u64 = 100;

/// Request parameters for paginated queries.
///
/// List endpoints accept `limit` and `offset` query parameters; the limit
/// is clamped to [`MAX_LIMIT`] so a caller cannot request unbounded pages.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageRequest {
    /// Maximum number of items to return.
    #[serde(default = "default_limit")]
    pub limit: u64,
    /// Number of items to skip.
    #[serde(default)]
    pub offset: u64,
}

fn default_limit() -> u64 {
    20
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            offset: 0,
        }
    }
}

impl PageRequest {
    /// Returns the effective limit for database queries.
    #[must_use]
    pub fn limit(&self) -> u64 {
        self.limit.clamp(1, MAX_LIMIT)
    }

    /// Returns the offset for database queries.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.offset
    }
}

/// Response wrapper for paginated data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T> {
    /// The items in the current page.
    pub data: Vec<T>,
    /// Pagination metadata.
    pub meta: PageMeta,
}

/// Pagination metadata.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageMeta {
    /// Effective limit applied to the query.
    pub limit: u64,
    /// Offset applied to the query.
    pub offset: u64,
    /// Total number of items matching the query.
    pub total: u64,
}

impl<T> PageResponse<T> {
    /// Wraps a page of items with its metadata.
    #[must_use]
    pub fn new(data: Vec<T>, request: &PageRequest, total: u64) -> Self {
        Self {
            data,
            meta: PageMeta {
                limit: request.limit(),
                offset: request.offset(),
                total,
            },
        }
    }
}
