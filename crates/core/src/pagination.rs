//! Pagination constants and clamping helpers.
//!
//! Every listing in the service (catalog pages, recent sessions,
//! recommendations) clamps its user-provided bounds here, so the server is
//! always the single authority on which page was actually returned.

use serde::Serialize;

// ---------------------------------------------------------------------------
// Page sizes
// ---------------------------------------------------------------------------

/// Allowed catalog page sizes, ascending.
pub const PER_PAGE_OPTIONS: &[i64] = &[10, 20, 50, 100];

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PER_PAGE: i64 = 20;

/// Default number of recent practice sessions.
pub const DEFAULT_RECENT_LIMIT: i64 = 10;

/// Maximum number of recent practice sessions.
pub const MAX_RECENT_LIMIT: i64 = 100;

/// Default number of practice recommendations.
pub const DEFAULT_RECOMMENDATION_LIMIT: i64 = 5;

/// Maximum number of practice recommendations.
pub const MAX_RECOMMENDATION_LIMIT: i64 = 50;

// ---------------------------------------------------------------------------
// Clamping
// ---------------------------------------------------------------------------

/// Clamp a user-provided limit to valid bounds.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).max(1).min(max)
}

/// Clamp a 1-based page number; anything below 1 becomes 1.
pub fn clamp_page(page: Option<i64>) -> i64 {
    page.unwrap_or(1).max(1)
}

/// Snap a requested page size onto [`PER_PAGE_OPTIONS`].
///
/// Picks the smallest allowed size that holds the request, and the largest
/// allowed size when the request exceeds all of them.
pub fn clamp_per_page(per_page: Option<i64>) -> i64 {
    let requested = per_page.unwrap_or(DEFAULT_PER_PAGE);
    let largest = PER_PAGE_OPTIONS[PER_PAGE_OPTIONS.len() - 1];

    PER_PAGE_OPTIONS
        .iter()
        .copied()
        .find(|&option| option >= requested)
        .unwrap_or(largest)
}

/// Number of pages needed for `total_count` rows; zero rows means zero pages.
pub fn total_pages(total_count: i64, per_page: i64) -> i64 {
    if total_count <= 0 || per_page <= 0 {
        return 0;
    }
    (total_count + per_page - 1) / per_page
}

/// Row offset of the first item on `page`.
pub fn page_offset(page: i64, per_page: i64) -> i64 {
    (page.max(1) - 1).saturating_mul(per_page)
}

// ---------------------------------------------------------------------------
// Page envelope
// ---------------------------------------------------------------------------

/// One page of results plus the authoritative pagination descriptor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_count: i64, page: i64, per_page: i64) -> Self {
        Self {
            items,
            total_count,
            page,
            per_page,
            total_pages: total_pages(total_count, per_page),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
