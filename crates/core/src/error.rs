use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// A concurrent writer changed the record between read and write.
    #[error("Concurrent update: {0}")]
    Concurrency(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for a missing skill record, keyed by lyric id.
    pub fn skill_not_found(lyric_id: DbId) -> Self {
        Self::NotFound {
            entity: "SkillRecord",
            id: lyric_id,
        }
    }

    /// Stable machine-readable name for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NotFoundError",
            Self::Validation(_) => "ValidationError",
            Self::Concurrency(_) => "ConcurrencyError",
            Self::Internal(_) => "InternalError",
        }
    }
}

impl From<validator::ValidationErrors> for CoreError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter()
                    .map(|e| match &e.message {
                        Some(msg) => msg.to_string(),
                        None => format!("{field} is invalid"),
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
        messages.sort();
        Self::Validation(messages.join("; "))
    }
}
