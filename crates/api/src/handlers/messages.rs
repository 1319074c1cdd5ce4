//! Handlers for the per-job message thread.
//!
//! The thread is append-only and symmetric: whoever may post may read, and
//! no one else may do either. Both operations run the same policy check
//! against a freshly fetched job.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use ecuflow_core::error::CoreError;
use ecuflow_core::policy::JobOperation;
use ecuflow_core::types::DbId;
use ecuflow_db::repositories::MessageRepo;
use ecuflow_events::bus::{DomainEvent, EVENT_JOB_MESSAGE};

use crate::error::{AppError, AppResult};
use crate::handlers::find_and_authorize;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /jobs/{id}/messages`.
#[derive(Debug, Deserialize)]
pub struct PostMessageRequest {
    pub body: String,
}

/// GET /api/v1/jobs/{id}/messages
///
/// List the job's messages in ascending creation order.
pub async fn list_messages(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(job_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    find_and_authorize(&state.pool, job_id, &auth, JobOperation::ListMessages).await?;

    let messages = MessageRepo::list_for_job(&state.pool, job_id).await?;
    Ok(Json(DataResponse { data: messages }))
}

/// POST /api/v1/jobs/{id}/messages
///
/// Append a message to the job's thread. Returns 201 with the persisted
/// message, author display name and role included, for immediate echo.
pub async fn post_message(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(job_id): Path<DbId>,
    Json(input): Json<PostMessageRequest>,
) -> AppResult<impl IntoResponse> {
    let body = input.body.trim();
    if body.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Message body must not be empty".into(),
        )));
    }

    find_and_authorize(&state.pool, job_id, &auth, JobOperation::PostMessage).await?;

    let message = MessageRepo::post(&state.pool, job_id, auth.user_id, body).await?;

    state.event_bus.publish(
        DomainEvent::new(EVENT_JOB_MESSAGE)
            .with_job(job_id)
            .with_actor(message.author_id, message.author_display_name.clone())
            .with_payload(serde_json::json!({
                "message_id": message.id,
                "body": message.body,
                "author_role": message.author_role,
            })),
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: message })))
}
