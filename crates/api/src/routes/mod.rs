pub mod catalog;
pub mod health;
pub mod practice;
pub mod skills;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /practice                                        log session (POST)
/// /members/{member_id}/practice/recent             recent sessions
/// /members/{member_id}/practice/least              least practiced lyrics
/// /members/{member_id}/practice/summary            practice totals
/// /members/{member_id}/skills                      list skill records
/// /members/{member_id}/skills/{lyric_id}           one skill record
/// /members/{member_id}/skills/{lyric_id}/goal      set, clear goal date
/// /skill-levels                                    level table
/// /catalog                                         filtered catalog listing
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/practice", practice::router())
        .nest("/members/{member_id}/practice", practice::member_router())
        .nest("/members/{member_id}/skills", skills::member_router())
        .nest("/skill-levels", skills::levels_router())
        .nest("/catalog", catalog::router())
}
