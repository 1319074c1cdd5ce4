use crate::types::DbId;

/// Domain error taxonomy shared across the workspace.
///
/// Every variant except [`Internal`](CoreError::Internal) is an expected,
/// recoverable-by-caller condition and must not be logged as a system fault.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The entity does not exist, or exists but the caller may not see it.
    /// The two cases are deliberately indistinguishable.
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A mutation was attempted outside the job's editable status window.
    #[error("Job {job_id} is no longer editable")]
    ImmutableState { job_id: DbId },

    /// A status transition whose precondition no longer holds.
    #[error("Invalid status transition for job {job_id}: {detail}")]
    InvalidTransition { job_id: DbId, detail: &'static str },

    /// A problem report requires the job to be completed first.
    #[error("Job {job_id} is not completed; problem reports require a completed job")]
    NotCompleted { job_id: DbId },

    /// Only one problem report per job may be open at a time.
    #[error("Job {job_id} already has an open problem report")]
    ReportAlreadyOpen { job_id: DbId },

    /// Resolving requires an open report to exist.
    #[error("Job {job_id} has no open problem report")]
    NoOpenReport { job_id: DbId },

    #[error("Internal error: {0}")]
    Internal(String),
}
