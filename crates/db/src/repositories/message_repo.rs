//! Repository for the `job_messages` table.
//!
//! The thread is append-only: there is no update or delete operation, and
//! none should be added.

use sqlx::PgPool;

use ecuflow_core::types::DbId;

use crate::models::message::MessageWithAuthor;

/// Column list for joined message queries. `m` is the message row, `u` the
/// author, `r` the author's role.
const JOINED_COLUMNS: &str = "\
    m.id, m.job_id, m.author_id, m.body, \
    u.display_name AS author_display_name, r.name AS author_role, \
    m.created_at";

/// Provides append and read operations for job message threads.
pub struct MessageRepo;

impl MessageRepo {
    /// Append a message to a job's thread, returning the persisted row with
    /// the author's display name and role denormalized for immediate echo.
    pub async fn post(
        pool: &PgPool,
        job_id: DbId,
        author_id: DbId,
        body: &str,
    ) -> Result<MessageWithAuthor, sqlx::Error> {
        let query = format!(
            "WITH m AS ( \
                 INSERT INTO job_messages (job_id, author_id, body) \
                 VALUES ($1, $2, $3) \
                 RETURNING id, job_id, author_id, body, created_at \
             ) \
             SELECT {JOINED_COLUMNS} FROM m \
             JOIN users u ON u.id = m.author_id \
             JOIN roles r ON r.id = u.role_id"
        );
        sqlx::query_as::<_, MessageWithAuthor>(&query)
            .bind(job_id)
            .bind(author_id)
            .bind(body)
            .fetch_one(pool)
            .await
    }

    /// List a job's messages in ascending creation order.
    pub async fn list_for_job(
        pool: &PgPool,
        job_id: DbId,
    ) -> Result<Vec<MessageWithAuthor>, sqlx::Error> {
        let query = format!(
            "SELECT {JOINED_COLUMNS} FROM job_messages m \
             JOIN users u ON u.id = m.author_id \
             JOIN roles r ON r.id = u.role_id \
             WHERE m.job_id = $1 \
             ORDER BY m.created_at ASC, m.id ASC"
        );
        sqlx::query_as::<_, MessageWithAuthor>(&query)
            .bind(job_id)
            .fetch_all(pool)
            .await
    }
}
