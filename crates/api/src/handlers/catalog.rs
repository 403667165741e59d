//! Handler for the filtered, sorted, paginated catalog listing.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use choir_core::catalog::CatalogRequest;

use crate::error::AppResult;
use crate::extract::ApiQuery;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/catalog
///
/// Query parameters: `search`, `genre`, `language`, `difficulty`,
/// `starts_with`, `year_from`, `year_to`, `sort`, `direction`, `page`,
/// `per_page`. Unknown sort fields and out-of-range values answer 400.
pub async fn query_catalog(
    State(state): State<AppState>,
    ApiQuery(request): ApiQuery<CatalogRequest>,
) -> AppResult<impl IntoResponse> {
    let page = state.catalog.query(request).await?;
    Ok(Json(DataResponse::new(page)))
}
