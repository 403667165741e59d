use axum::routing::get;
use axum::Router;

use crate::handlers::catalog;
use crate::state::AppState;

/// Mounted at `/catalog`.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(catalog::query_catalog))
}
