//! Handlers for practice session logging and member practice history.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use choir_core::practice::NewPracticeSession;
use choir_core::types::DbId;

use crate::error::AppResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::query::{LimitParams, RecommendationParams};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/practice
///
/// Log a practice session. Responds 201 with the stored session and the
/// recomputed skill record for its (member, lyric) pair.
pub async fn log_session(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewPracticeSession>,
) -> AppResult<impl IntoResponse> {
    let logged = state.practice.log_session(input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(logged))))
}

/// GET /api/v1/members/{member_id}/practice/recent?limit=
pub async fn recent_sessions(
    State(state): State<AppState>,
    ApiPath(member_id): ApiPath<DbId>,
    ApiQuery(params): ApiQuery<LimitParams>,
) -> AppResult<impl IntoResponse> {
    let sessions = state
        .practice
        .recent_sessions(member_id, params.limit)
        .await?;
    Ok(Json(DataResponse::new(sessions)))
}

/// GET /api/v1/members/{member_id}/practice/least?n=
pub async fn least_practiced(
    State(state): State<AppState>,
    ApiPath(member_id): ApiPath<DbId>,
    ApiQuery(params): ApiQuery<RecommendationParams>,
) -> AppResult<impl IntoResponse> {
    let lyrics = state.practice.least_practiced(member_id, params.n).await?;
    Ok(Json(DataResponse::new(lyrics)))
}

/// GET /api/v1/members/{member_id}/practice/summary
pub async fn practice_summary(
    State(state): State<AppState>,
    ApiPath(member_id): ApiPath<DbId>,
) -> AppResult<impl IntoResponse> {
    let summary = state.practice.practice_summary(member_id).await?;
    Ok(Json(DataResponse::new(summary)))
}
