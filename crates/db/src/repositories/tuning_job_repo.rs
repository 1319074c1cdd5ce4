//! Repository for the `tuning_jobs` table.
//!
//! Every state transition is a conditional UPDATE whose WHERE clause
//! re-checks the expected current status. A transition that returns no row
//! lost the race (or was invalid to begin with); the caller maps that to
//! the matching domain error. No read-then-blind-write sequences exist here.

use sqlx::PgPool;

use ecuflow_core::types::DbId;

use crate::models::status::JobStatus;
use crate::models::tuning_job::{CreateTuningJob, JobListQuery, TuningJob, UpdateTuningJob};

/// Column list for `tuning_jobs` queries.
const COLUMNS: &str = "\
    id, owner_id, original_file_name, stored_file_name, \
    dpf_off, egr_off, adblue_off, dtc_off, dtc_codes, immo_off, \
    notes, status_id, processed_file_name, operator_message, \
    vehicle_make, vehicle_model, vehicle_year, ecu_type, \
    created_at, updated_at";

/// Maximum page size for job listing.
const MAX_LIMIT: i64 = 100;

/// Default page size for job listing.
const DEFAULT_LIMIT: i64 = 50;

/// Provides lifecycle operations for tuning jobs.
pub struct TuningJobRepo;

impl TuningJobRepo {
    /// Create a new job in `pending` status, returning the created row.
    pub async fn create(
        pool: &PgPool,
        owner_id: DbId,
        input: &CreateTuningJob,
    ) -> Result<TuningJob, sqlx::Error> {
        let query = format!(
            "INSERT INTO tuning_jobs \
                 (owner_id, original_file_name, stored_file_name, \
                  dpf_off, egr_off, adblue_off, dtc_off, dtc_codes, immo_off, \
                  notes, status_id, vehicle_make, vehicle_model, vehicle_year, ecu_type) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TuningJob>(&query)
            .bind(owner_id)
            .bind(&input.original_file_name)
            .bind(&input.stored_file_name)
            .bind(input.dpf_off)
            .bind(input.egr_off)
            .bind(input.adblue_off)
            .bind(input.dtc_off)
            .bind(&input.dtc_codes)
            .bind(input.immo_off)
            .bind(&input.notes)
            .bind(JobStatus::Pending.id())
            .bind(&input.vehicle_make)
            .bind(&input.vehicle_model)
            .bind(&input.vehicle_year)
            .bind(&input.ecu_type)
            .fetch_one(pool)
            .await
    }

    /// Find a job by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<TuningJob>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tuning_jobs WHERE id = $1");
        sqlx::query_as::<_, TuningJob>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Apply an owner edit, conditional on the job still being pending.
    ///
    /// Only non-`None` fields in `input` are applied. Returns `None` when
    /// no row matched -- the job does not exist, belongs to someone else,
    /// or has left the editable window.
    pub async fn update_if_pending(
        pool: &PgPool,
        job_id: DbId,
        owner_id: DbId,
        input: &UpdateTuningJob,
    ) -> Result<Option<TuningJob>, sqlx::Error> {
        let query = format!(
            "UPDATE tuning_jobs SET
                dpf_off = COALESCE($4, dpf_off),
                egr_off = COALESCE($5, egr_off),
                adblue_off = COALESCE($6, adblue_off),
                dtc_off = COALESCE($7, dtc_off),
                dtc_codes = COALESCE($8, dtc_codes),
                immo_off = COALESCE($9, immo_off),
                notes = COALESCE($10, notes),
                vehicle_make = COALESCE($11, vehicle_make),
                vehicle_model = COALESCE($12, vehicle_model),
                vehicle_year = COALESCE($13, vehicle_year),
                ecu_type = COALESCE($14, ecu_type)
             WHERE id = $1 AND owner_id = $2 AND status_id = $3
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TuningJob>(&query)
            .bind(job_id)
            .bind(owner_id)
            .bind(JobStatus::Pending.id())
            .bind(input.dpf_off)
            .bind(input.egr_off)
            .bind(input.adblue_off)
            .bind(input.dtc_off)
            .bind(&input.dtc_codes)
            .bind(input.immo_off)
            .bind(&input.notes)
            .bind(&input.vehicle_make)
            .bind(&input.vehicle_model)
            .bind(&input.vehicle_year)
            .bind(&input.ecu_type)
            .fetch_optional(pool)
            .await
    }

    /// Complete a pending job, recording the processed-file reference.
    ///
    /// Conditional on `status_id` still being pending; returns `None` if the
    /// job is missing or already terminal (concurrent complete/cancel lose
    /// the race here rather than both succeeding).
    pub async fn complete(
        pool: &PgPool,
        job_id: DbId,
        processed_file_name: &str,
    ) -> Result<Option<TuningJob>, sqlx::Error> {
        let query = format!(
            "UPDATE tuning_jobs \
             SET status_id = $3, processed_file_name = $4 \
             WHERE id = $1 AND status_id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TuningJob>(&query)
            .bind(job_id)
            .bind(JobStatus::Pending.id())
            .bind(JobStatus::Completed.id())
            .bind(processed_file_name)
            .fetch_optional(pool)
            .await
    }

    /// Cancel a pending job. Returns `None` if the job is missing or already
    /// terminal.
    pub async fn cancel(pool: &PgPool, job_id: DbId) -> Result<Option<TuningJob>, sqlx::Error> {
        let query = format!(
            "UPDATE tuning_jobs \
             SET status_id = $3 \
             WHERE id = $1 AND status_id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TuningJob>(&query)
            .bind(job_id)
            .bind(JobStatus::Pending.id())
            .bind(JobStatus::Cancelled.id())
            .fetch_optional(pool)
            .await
    }

    /// Set or replace the operator's message to the requester.
    ///
    /// Allowed at any status; the message is advisory and not part of the
    /// lifecycle. Returns `None` if the job does not exist.
    pub async fn set_operator_message(
        pool: &PgPool,
        job_id: DbId,
        message: &str,
    ) -> Result<Option<TuningJob>, sqlx::Error> {
        let query = format!(
            "UPDATE tuning_jobs SET operator_message = $2 WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TuningJob>(&query)
            .bind(job_id)
            .bind(message)
            .fetch_optional(pool)
            .await
    }

    /// List jobs owned by a specific user, newest first.
    pub async fn list_by_owner(
        pool: &PgPool,
        owner_id: DbId,
        params: &JobListQuery,
    ) -> Result<Vec<TuningJob>, sqlx::Error> {
        Self::list_jobs(pool, Some(owner_id), params).await
    }

    /// List all jobs (operator view), newest first.
    pub async fn list_all(
        pool: &PgPool,
        params: &JobListQuery,
    ) -> Result<Vec<TuningJob>, sqlx::Error> {
        Self::list_jobs(pool, None, params).await
    }

    /// Shared listing query builder. When `owner_id` is `Some`, filters to
    /// that user's jobs; when `None`, returns all jobs (operator view).
    async fn list_jobs(
        pool: &PgPool,
        owner_id: Option<DbId>,
        params: &JobListQuery,
    ) -> Result<Vec<TuningJob>, sqlx::Error> {
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
        let offset = params.offset.unwrap_or(0);

        // Build the WHERE clause and track the next bind parameter index.
        let mut conditions: Vec<String> = Vec::new();
        let mut bind_idx: u32 = 1;

        if owner_id.is_some() {
            conditions.push(format!("owner_id = ${bind_idx}"));
            bind_idx += 1;
        }

        if params.status_id.is_some() {
            conditions.push(format!("status_id = ${bind_idx}"));
            bind_idx += 1;
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let query = format!(
            "SELECT {COLUMNS} FROM tuning_jobs \
             {where_clause} \
             ORDER BY created_at DESC \
             LIMIT ${bind_idx} OFFSET ${}",
            bind_idx + 1,
        );

        let mut q = sqlx::query_as::<_, TuningJob>(&query);

        if let Some(uid) = owner_id {
            q = q.bind(uid);
        }
        if let Some(sid) = params.status_id {
            q = q.bind(sid);
        }

        q = q.bind(limit).bind(offset);

        q.fetch_all(pool).await
    }
}
