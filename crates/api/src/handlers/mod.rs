//! Request handlers.
//!
//! Each submodule provides async handler functions for a single resource.
//! Handlers fetch fresh state, evaluate the access policy against it, then
//! delegate to the corresponding repository in `ecuflow_db` and map errors
//! via [`AppError`](crate::error::AppError).

pub mod auth;
pub mod jobs;
pub mod messages;
pub mod problems;

use sqlx::PgPool;

use ecuflow_core::error::CoreError;
use ecuflow_core::policy::{authorize, JobOperation, JobTarget};
use ecuflow_core::types::DbId;
use ecuflow_db::models::tuning_job::TuningJob;
use ecuflow_db::repositories::{TuningJobRepo, UserRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;

/// Fetch a job by ID and authorize `op` against the freshly fetched row.
///
/// The fetch happens immediately before the policy check so the decision
/// can never be made against a stale copy. A missing job and a job the
/// caller may not see both surface as `NotFound`.
pub(crate) async fn find_and_authorize(
    pool: &PgPool,
    job_id: DbId,
    auth: &AuthUser,
    op: JobOperation,
) -> AppResult<TuningJob> {
    let job = TuningJobRepo::find_by_id(pool, job_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Job",
            id: job_id,
        }))?;

    let target = JobTarget {
        job_id: job.id,
        owner_id: job.owner_id,
    };
    authorize(&auth.actor(), op, target)?;

    Ok(job)
}

/// Resolve a user's display name for event payloads.
///
/// Falls back to `"unknown"` for a missing row rather than failing the
/// mutation that is about to publish the event.
pub(crate) async fn display_name(pool: &PgPool, user_id: DbId) -> String {
    match UserRepo::find_by_id(pool, user_id).await {
        Ok(Some(user)) => user.display_name,
        _ => "unknown".to_string(),
    }
}
