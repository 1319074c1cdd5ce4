//! Handlers for the `/jobs` resource.
//!
//! All endpoints require authentication via [`AuthUser`]. The operator
//! administers any job; requesters see and edit only their own. Every
//! mutation authorizes against a freshly fetched row, then applies a
//! conditional update in the repository, so concurrent transitions cannot
//! both succeed.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use ecuflow_core::error::CoreError;
use ecuflow_core::naming::download_filename;
use ecuflow_core::policy::JobOperation;
use ecuflow_core::roles::ROLE_OPERATOR;
use ecuflow_core::types::DbId;
use ecuflow_db::models::tuning_job::{CreateTuningJob, JobListQuery, TuningJob, UpdateTuningJob};
use ecuflow_db::repositories::TuningJobRepo;
use ecuflow_events::bus::{
    DomainEvent, EVENT_JOB_CANCELLED, EVENT_JOB_COMPLETED, EVENT_JOB_CREATED,
};

use crate::error::{AppError, AppResult};
use crate::handlers::{display_name, find_and_authorize};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireOperator;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// A job as returned by the API: the row plus the derived download name.
#[derive(Debug, Serialize)]
pub struct JobResponse {
    #[serde(flatten)]
    pub job: TuningJob,
    /// Display name for the processed-file download, derived from the
    /// original name and the active options.
    pub download_name: String,
}

impl From<TuningJob> for JobResponse {
    fn from(job: TuningJob) -> Self {
        let download_name = download_filename(&job.original_file_name, &job.options());
        Self { job, download_name }
    }
}

/// Request body for `POST /jobs/{id}/complete`.
#[derive(Debug, Deserialize)]
pub struct CompleteJobRequest {
    pub processed_file_name: String,
}

/// Request body for `PUT /jobs/{id}/message`.
#[derive(Debug, Deserialize)]
pub struct OperatorMessageRequest {
    pub message: String,
}

// ---------------------------------------------------------------------------
// Submit
// ---------------------------------------------------------------------------

/// POST /api/v1/jobs
///
/// Submit a new tuning job. Returns 201 with the created job in `pending`
/// status and notifies the operator room.
pub async fn create_job(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateTuningJob>,
) -> AppResult<impl IntoResponse> {
    if input.original_file_name.trim().is_empty() || input.stored_file_name.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "A file reference is required to submit a job".into(),
        )));
    }

    let job = TuningJobRepo::create(&state.pool, auth.user_id, &input).await?;

    tracing::info!(
        job_id = job.id,
        owner_id = auth.user_id,
        file = %job.original_file_name,
        "Job submitted",
    );

    let actor_name = display_name(&state.pool, auth.user_id).await;
    state.event_bus.publish(
        DomainEvent::new(EVENT_JOB_CREATED)
            .with_job(job.id)
            .with_actor(auth.user_id, actor_name)
            .with_payload(serde_json::json!({
                "original_file_name": job.original_file_name,
            })),
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: JobResponse::from(job),
        }),
    ))
}

// ---------------------------------------------------------------------------
// List / get
// ---------------------------------------------------------------------------

/// GET /api/v1/jobs
///
/// List jobs, newest first. The operator sees all jobs; requesters see only
/// their own. Supports optional `status_id`, `limit`, and `offset` query
/// parameters.
pub async fn list_jobs(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<JobListQuery>,
) -> AppResult<impl IntoResponse> {
    let jobs = if auth.role == ROLE_OPERATOR {
        TuningJobRepo::list_all(&state.pool, &params).await?
    } else {
        TuningJobRepo::list_by_owner(&state.pool, auth.user_id, &params).await?
    };

    let jobs: Vec<JobResponse> = jobs.into_iter().map(JobResponse::from).collect();
    Ok(Json(DataResponse { data: jobs }))
}

/// GET /api/v1/jobs/{id}
///
/// Get a single job by ID. Requesters can only view their own jobs; the
/// operator can view any job.
pub async fn get_job(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(job_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let job = find_and_authorize(&state.pool, job_id, &auth, JobOperation::View).await?;
    Ok(Json(DataResponse {
        data: JobResponse::from(job),
    }))
}

// ---------------------------------------------------------------------------
// Edit
// ---------------------------------------------------------------------------

/// PATCH /api/v1/jobs/{id}
///
/// Edit a pending job's options, notes, or vehicle fields. Only the owner
/// may edit, and only while the job is pending; afterwards the job is
/// immutable and the attempt is rejected rather than silently ignored.
pub async fn update_job(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(job_id): Path<DbId>,
    Json(input): Json<UpdateTuningJob>,
) -> AppResult<impl IntoResponse> {
    find_and_authorize(&state.pool, job_id, &auth, JobOperation::Edit).await?;

    // The update re-checks owner and status; losing a race against a
    // concurrent complete/cancel surfaces the same way as editing late.
    let updated = TuningJobRepo::update_if_pending(&state.pool, job_id, auth.user_id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::ImmutableState { job_id }))?;

    Ok(Json(DataResponse {
        data: JobResponse::from(updated),
    }))
}

// ---------------------------------------------------------------------------
// Complete / cancel
// ---------------------------------------------------------------------------

/// POST /api/v1/jobs/{id}/complete
///
/// Complete a pending job, attaching the processed-file reference. Operator
/// only. Returns 409 if the job has already left `pending`; callers must
/// not retry such a failure.
pub async fn complete_job(
    RequireOperator(auth): RequireOperator,
    State(state): State<AppState>,
    Path(job_id): Path<DbId>,
    Json(input): Json<CompleteJobRequest>,
) -> AppResult<impl IntoResponse> {
    if input.processed_file_name.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "A processed-file reference is required to complete a job".into(),
        )));
    }

    find_and_authorize(&state.pool, job_id, &auth, JobOperation::Complete).await?;

    let job = TuningJobRepo::complete(&state.pool, job_id, &input.processed_file_name)
        .await?
        .ok_or(AppError::Core(CoreError::InvalidTransition {
            job_id,
            detail: "only pending jobs can be completed",
        }))?;

    tracing::info!(job_id, operator_id = auth.user_id, "Job completed");

    let actor_name = display_name(&state.pool, auth.user_id).await;
    state.event_bus.publish(
        DomainEvent::new(EVENT_JOB_COMPLETED)
            .with_job(job.id)
            .with_actor(auth.user_id, actor_name)
            .with_payload(serde_json::json!({
                "status": "completed",
                "download_name": download_filename(&job.original_file_name, &job.options()),
            })),
    );

    Ok(Json(DataResponse {
        data: JobResponse::from(job),
    }))
}

/// POST /api/v1/jobs/{id}/cancel
///
/// Cancel a pending job. Operator only. Returns 409 if the job is already
/// terminal.
pub async fn cancel_job(
    RequireOperator(auth): RequireOperator,
    State(state): State<AppState>,
    Path(job_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    find_and_authorize(&state.pool, job_id, &auth, JobOperation::Cancel).await?;

    let job = TuningJobRepo::cancel(&state.pool, job_id).await?.ok_or(
        AppError::Core(CoreError::InvalidTransition {
            job_id,
            detail: "only pending jobs can be cancelled",
        }),
    )?;

    tracing::info!(job_id, operator_id = auth.user_id, "Job cancelled");

    let actor_name = display_name(&state.pool, auth.user_id).await;
    state.event_bus.publish(
        DomainEvent::new(EVENT_JOB_CANCELLED)
            .with_job(job.id)
            .with_actor(auth.user_id, actor_name)
            .with_payload(serde_json::json!({ "status": "cancelled" })),
    );

    Ok(Json(DataResponse {
        data: JobResponse::from(job),
    }))
}

// ---------------------------------------------------------------------------
// Operator message
// ---------------------------------------------------------------------------

/// PUT /api/v1/jobs/{id}/message
///
/// Set or replace the operator's message to the requester. Operator only;
/// allowed at any status.
pub async fn set_operator_message(
    RequireOperator(auth): RequireOperator,
    State(state): State<AppState>,
    Path(job_id): Path<DbId>,
    Json(input): Json<OperatorMessageRequest>,
) -> AppResult<impl IntoResponse> {
    find_and_authorize(&state.pool, job_id, &auth, JobOperation::SetOperatorMessage).await?;

    let job = TuningJobRepo::set_operator_message(&state.pool, job_id, &input.message)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Job",
            id: job_id,
        }))?;

    Ok(Json(DataResponse {
        data: JobResponse::from(job),
    }))
}
