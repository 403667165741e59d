use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use choir_core::error::CoreError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds a variant for requests
/// axum could not extract. Implements [`IntoResponse`] to produce the
/// `{ success: false, error_kind, message }` envelope.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `choir_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Malformed JSON body, query string, or path segment.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match &self {
            AppError::Core(core) => {
                let kind = core.kind();
                match core {
                    CoreError::NotFound { entity, id } => (
                        StatusCode::NOT_FOUND,
                        kind,
                        format!("{entity} with id {id} not found"),
                    ),
                    CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, kind, msg.clone()),
                    CoreError::Concurrency(msg) => (StatusCode::CONFLICT, kind, msg.clone()),
                    CoreError::Internal(msg) => {
                        tracing::error!(error = %msg, "Internal core error");
                        (
                            StatusCode::INTERNAL_SERVER_ERROR,
                            kind,
                            "An internal error occurred".to_string(),
                        )
                    }
                }
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "ValidationError", msg.clone()),
        };

        let body = json!({
            "success": false,
            "error_kind": kind,
            "message": message,
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}
