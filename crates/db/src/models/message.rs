//! Job message entity model.
//!
//! Messages are append-only: there is no update DTO and no delete path.

use serde::Serialize;
use sqlx::FromRow;

use ecuflow_core::types::{DbId, Timestamp};

/// A row from the `job_messages` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Message {
    pub id: DbId,
    pub job_id: DbId,
    pub author_id: DbId,
    pub body: String,
    pub created_at: Timestamp,
}

/// A message joined with its author's display name and role, for client
/// rendering without a follow-up fetch.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MessageWithAuthor {
    pub id: DbId,
    pub job_id: DbId,
    pub author_id: DbId,
    pub body: String,
    pub author_display_name: String,
    /// Resolved role name of the author at read time.
    pub author_role: String,
    pub created_at: Timestamp,
}
