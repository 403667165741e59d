//! Shared query parameter types for API handlers.

use serde::Deserialize;

/// `?limit=` for recent-session listings. Clamped in the service layer.
#[derive(Debug, Deserialize)]
pub struct LimitParams {
    pub limit: Option<i64>,
}

/// `?n=` for recommendation listings. Clamped in the service layer.
#[derive(Debug, Deserialize)]
pub struct RecommendationParams {
    pub n: Option<i64>,
}
