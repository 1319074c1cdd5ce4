//! Problem report entity model.

use serde::Serialize;
use sqlx::FromRow;

use ecuflow_core::types::{DbId, Timestamp};

use super::status::StatusId;

/// A row from the `problem_reports` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProblemReport {
    pub id: DbId,
    pub job_id: DbId,
    pub reporter_id: DbId,
    pub description: String,
    pub status_id: StatusId,
    pub created_at: Timestamp,
    pub resolved_at: Option<Timestamp>,
}
