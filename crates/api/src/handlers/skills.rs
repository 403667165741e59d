//! Handlers for skill records, goal dates, and the level table.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use choir_core::error::CoreError;
use choir_core::types::DbId;
use serde::Deserialize;

use crate::error::AppResult;
use crate::extract::{ApiJson, ApiPath};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request DTOs
// ---------------------------------------------------------------------------

/// Body for `PUT .../goal`. The date is `YYYY-MM-DD`.
#[derive(Debug, Deserialize)]
pub struct SetGoalRequest {
    pub goal_date: String,
}

// ---------------------------------------------------------------------------
// Skill records
// ---------------------------------------------------------------------------

/// GET /api/v1/members/{member_id}/skills
pub async fn list_skills(
    State(state): State<AppState>,
    ApiPath(member_id): ApiPath<DbId>,
) -> AppResult<impl IntoResponse> {
    let records = state.skills.list_skills(member_id).await?;
    Ok(Json(DataResponse::new(records)))
}

/// GET /api/v1/members/{member_id}/skills/{lyric_id}
///
/// A pair that has never been practiced has no record and answers 404.
pub async fn get_skill(
    State(state): State<AppState>,
    ApiPath((member_id, lyric_id)): ApiPath<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    let record = state
        .skills
        .get_skill(member_id, lyric_id)
        .await?
        .ok_or_else(|| CoreError::skill_not_found(lyric_id))?;
    Ok(Json(DataResponse::new(record)))
}

// ---------------------------------------------------------------------------
// Goals
// ---------------------------------------------------------------------------

/// PUT /api/v1/members/{member_id}/skills/{lyric_id}/goal
pub async fn set_goal(
    State(state): State<AppState>,
    ApiPath((member_id, lyric_id)): ApiPath<(DbId, DbId)>,
    ApiJson(input): ApiJson<SetGoalRequest>,
) -> AppResult<impl IntoResponse> {
    let record = state
        .skills
        .set_goal(member_id, lyric_id, &input.goal_date)
        .await?;
    Ok(Json(DataResponse::new(record)))
}

/// DELETE /api/v1/members/{member_id}/skills/{lyric_id}/goal
pub async fn clear_goal(
    State(state): State<AppState>,
    ApiPath((member_id, lyric_id)): ApiPath<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    let record = state.skills.clear_goal(member_id, lyric_id).await?;
    Ok(Json(DataResponse::new(record)))
}

// ---------------------------------------------------------------------------
// Levels
// ---------------------------------------------------------------------------

/// GET /api/v1/skill-levels
pub async fn skill_levels(State(state): State<AppState>) -> impl IntoResponse {
    Json(DataResponse::new(state.skills.skill_levels()))
}
