use axum::routing::{get, post};
use axum::Router;

use crate::handlers::practice;
use crate::state::AppState;

/// Session logging, mounted at `/practice`.
///
/// ```text
/// POST   /    -> log_session
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(practice::log_session))
}

/// Per-member history, mounted at `/members/{member_id}/practice`.
///
/// ```text
/// GET    /recent     -> recent_sessions
/// GET    /least      -> least_practiced
/// GET    /summary    -> practice_summary
/// ```
pub fn member_router() -> Router<AppState> {
    Router::new()
        .route("/recent", get(practice::recent_sessions))
        .route("/least", get(practice::least_practiced))
        .route("/summary", get(practice::practice_summary))
}
