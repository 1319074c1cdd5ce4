//! Repository for the `problem_reports` table.
//!
//! Filing relies on the partial unique index `uq_problem_reports_open_job`:
//! an `ON CONFLICT DO NOTHING` insert either creates the report or returns
//! no row when another open report already exists for the job. Concurrent
//! filers therefore cannot create a duplicate open report.

use sqlx::PgPool;

use ecuflow_core::types::DbId;

use crate::models::problem_report::ProblemReport;
use crate::models::status::ReportStatus;

/// Column list for `problem_reports` queries.
const COLUMNS: &str = "id, job_id, reporter_id, description, status_id, created_at, resolved_at";

/// Provides lifecycle operations for problem reports.
pub struct ProblemReportRepo;

impl ProblemReportRepo {
    /// File a new report against a job.
    ///
    /// Returns `None` when an open report already exists for the job; the
    /// caller routes the filer back to the existing report instead of
    /// duplicating it.
    pub async fn file(
        pool: &PgPool,
        job_id: DbId,
        reporter_id: DbId,
        description: &str,
    ) -> Result<Option<ProblemReport>, sqlx::Error> {
        let query = format!(
            "INSERT INTO problem_reports (job_id, reporter_id, description, status_id) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (job_id) WHERE status_id = {open} DO NOTHING \
             RETURNING {COLUMNS}",
            open = ReportStatus::Open.id(),
        );
        sqlx::query_as::<_, ProblemReport>(&query)
            .bind(job_id)
            .bind(reporter_id)
            .bind(description)
            .bind(ReportStatus::Open.id())
            .fetch_optional(pool)
            .await
    }

    /// Get the currently open report for a job, if any.
    pub async fn find_open_for_job(
        pool: &PgPool,
        job_id: DbId,
    ) -> Result<Option<ProblemReport>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM problem_reports WHERE job_id = $1 AND status_id = $2"
        );
        sqlx::query_as::<_, ProblemReport>(&query)
            .bind(job_id)
            .bind(ReportStatus::Open.id())
            .fetch_optional(pool)
            .await
    }

    /// List every report ever filed against a job, newest first.
    pub async fn list_for_job(
        pool: &PgPool,
        job_id: DbId,
    ) -> Result<Vec<ProblemReport>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM problem_reports \
             WHERE job_id = $1 \
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, ProblemReport>(&query)
            .bind(job_id)
            .fetch_all(pool)
            .await
    }

    /// Resolve the open report for a job, stamping the resolution time.
    ///
    /// Returns `None` when the job has no open report.
    pub async fn resolve(pool: &PgPool, job_id: DbId) -> Result<Option<ProblemReport>, sqlx::Error> {
        let query = format!(
            "UPDATE problem_reports \
             SET status_id = $3, resolved_at = NOW() \
             WHERE job_id = $1 AND status_id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProblemReport>(&query)
            .bind(job_id)
            .bind(ReportStatus::Open.id())
            .bind(ReportStatus::Resolved.id())
            .fetch_optional(pool)
            .await
    }
}
