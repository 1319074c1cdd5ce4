//! Route definitions for the `/jobs` resource.
//!
//! All endpoints require authentication; operator-only endpoints enforce
//! the role via the `RequireOperator` extractor in their handlers.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{jobs, messages, problems};
use crate::state::AppState;

/// Routes mounted at `/jobs`.
///
/// ```text
/// GET    /                       -> list_jobs
/// POST   /                       -> create_job
/// GET    /{id}                   -> get_job
/// PATCH  /{id}                   -> update_job
/// POST   /{id}/complete          -> complete_job (operator)
/// POST   /{id}/cancel            -> cancel_job (operator)
/// PUT    /{id}/message           -> set_operator_message (operator)
/// GET    /{id}/messages          -> list_messages
/// POST   /{id}/messages          -> post_message
/// GET    /{id}/problems          -> list_problems
/// POST   /{id}/problems          -> file_problem
/// POST   /{id}/problems/resolve  -> resolve_problem (operator)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(jobs::list_jobs).post(jobs::create_job))
        .route("/{id}", get(jobs::get_job).patch(jobs::update_job))
        .route("/{id}/complete", post(jobs::complete_job))
        .route("/{id}/cancel", post(jobs::cancel_job))
        .route("/{id}/message", put(jobs::set_operator_message))
        .route(
            "/{id}/messages",
            get(messages::list_messages).post(messages::post_message),
        )
        .route(
            "/{id}/problems",
            get(problems::list_problems).post(problems::file_problem),
        )
        .route("/{id}/problems/resolve", post(problems::resolve_problem))
}
