use super::domain::{Application, JobId, UserId};
use super::store::StoreError;

/// Error raised by the hiring workflow operations.
#[derive(Debug, thiserror::Error)]
pub enum HiringError {
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },
    #[error("user '{user_id}' already applied to job '{job_id}'")]
    DuplicateApplication { user_id: UserId, job_id: JobId },
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("not permitted: {0}")]
    Forbidden(String),
    #[error(transparent)]
    Persistence(#[from] StoreError),
    /// The status write committed but the matching event append failed.
    #[error(
        "application '{}' moved to {} but its timeline event was not recorded: {source}",
        .application.id,
        .application.status.label()
    )]
    PartiallyApplied {
        application: Box<Application>,
        source: StoreError,
    },
}

impl HiringError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            HiringError::NotFound { .. } => "not_found",
            HiringError::DuplicateApplication { .. } => "duplicate_application",
            HiringError::Validation(_) => "validation_error",
            HiringError::Forbidden(_) => "forbidden",
            HiringError::Persistence(_) => "persistence_error",
            HiringError::PartiallyApplied { .. } => "partially_applied",
        }
    }
}
