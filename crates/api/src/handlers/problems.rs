//! Handlers for the problem-report sub-lifecycle.
//!
//! A report can be filed only by the job's owner, only against a completed
//! job, and only while no other report for that job is open. Filing into an
//! existing open report is a no-op that returns the open report. Resolution
//! is operator-only and terminal; a new report may be filed afterwards.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use ecuflow_core::error::CoreError;
use ecuflow_core::policy::JobOperation;
use ecuflow_core::types::DbId;
use ecuflow_db::models::status::JobStatus;
use ecuflow_db::repositories::ProblemReportRepo;
use ecuflow_events::bus::{DomainEvent, EVENT_PROBLEM_FILED, EVENT_PROBLEM_RESOLVED};

use crate::error::{AppError, AppResult};
use crate::handlers::{display_name, find_and_authorize};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireOperator;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /jobs/{id}/problems`.
#[derive(Debug, Deserialize)]
pub struct FileProblemRequest {
    pub description: String,
}

/// GET /api/v1/jobs/{id}/problems
///
/// List every report ever filed against the job, newest first.
pub async fn list_problems(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(job_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    find_and_authorize(&state.pool, job_id, &auth, JobOperation::View).await?;

    let reports = ProblemReportRepo::list_for_job(&state.pool, job_id).await?;
    Ok(Json(DataResponse { data: reports }))
}

/// POST /api/v1/jobs/{id}/problems
///
/// File a problem report against a completed job. Returns 201 with the new
/// report, or 200 with the already-open report when one exists -- filing
/// twice routes the caller back to the open report instead of duplicating
/// it.
pub async fn file_problem(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(job_id): Path<DbId>,
    Json(input): Json<FileProblemRequest>,
) -> AppResult<impl IntoResponse> {
    let description = input.description.trim();
    if description.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "A problem description is required".into(),
        )));
    }

    let job = find_and_authorize(&state.pool, job_id, &auth, JobOperation::FileProblem).await?;

    // Escalation only makes sense against delivered work. Pending and
    // cancelled jobs both fail this gate.
    if job.status_id != JobStatus::Completed.id() {
        return Err(AppError::Core(CoreError::NotCompleted { job_id }));
    }

    let Some(report) =
        ProblemReportRepo::file(&state.pool, job_id, auth.user_id, description).await?
    else {
        // Lost to an existing (or concurrently filed) open report. Hand the
        // caller that report rather than an error.
        let existing = ProblemReportRepo::find_open_for_job(&state.pool, job_id)
            .await?
            .ok_or(AppError::Core(CoreError::ReportAlreadyOpen { job_id }))?;
        return Ok((StatusCode::OK, Json(DataResponse { data: existing })));
    };

    tracing::info!(job_id, report_id = report.id, "Problem report filed");

    let actor_name = display_name(&state.pool, auth.user_id).await;
    state.event_bus.publish(
        DomainEvent::new(EVENT_PROBLEM_FILED)
            .with_job(job_id)
            .with_actor(auth.user_id, actor_name)
            .with_payload(serde_json::json!({
                "report_id": report.id,
                "original_file_name": job.original_file_name,
            })),
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: report })))
}

/// POST /api/v1/jobs/{id}/problems/resolve
///
/// Resolve the job's open report, stamping the resolution time. Operator
/// only. Returns 409 when no open report exists. Resolved reports cannot be
/// reopened; the requester files a new one instead.
pub async fn resolve_problem(
    RequireOperator(auth): RequireOperator,
    State(state): State<AppState>,
    Path(job_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let job = find_and_authorize(&state.pool, job_id, &auth, JobOperation::ResolveProblem).await?;

    let report = ProblemReportRepo::resolve(&state.pool, job_id)
        .await?
        .ok_or(AppError::Core(CoreError::NoOpenReport { job_id }))?;

    tracing::info!(job_id, report_id = report.id, "Problem report resolved");

    let actor_name = display_name(&state.pool, auth.user_id).await;
    state.event_bus.publish(
        DomainEvent::new(EVENT_PROBLEM_RESOLVED)
            .with_job(job_id)
            .with_actor(auth.user_id, actor_name)
            .with_payload(serde_json::json!({
                "report_id": report.id,
                "original_file_name": job.original_file_name,
            })),
    );

    Ok((StatusCode::OK, Json(DataResponse { data: report })))
}
