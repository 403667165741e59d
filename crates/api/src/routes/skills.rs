use axum::routing::{get, put};
use axum::Router;

use crate::handlers::skills;
use crate::state::AppState;

/// Per-member skill records, mounted at `/members/{member_id}/skills`.
///
/// ```text
/// GET    /                  -> list_skills
/// GET    /{lyric_id}        -> get_skill
/// PUT    /{lyric_id}/goal   -> set_goal
/// DELETE /{lyric_id}/goal   -> clear_goal
/// ```
pub fn member_router() -> Router<AppState> {
    Router::new()
        .route("/", get(skills::list_skills))
        .route("/{lyric_id}", get(skills::get_skill))
        .route(
            "/{lyric_id}/goal",
            put(skills::set_goal).delete(skills::clear_goal),
        )
}

/// Level table, mounted at `/skill-levels`.
pub fn levels_router() -> Router<AppState> {
    Router::new().route("/", get(skills::skill_levels))
}
