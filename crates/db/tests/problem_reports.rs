//! Integration tests for the problem-report sub-lifecycle.
//!
//! The one-open-report-per-job invariant is enforced by the partial unique
//! index; these tests exercise it sequentially and under concurrent filing.

use sqlx::PgPool;

use ecuflow_core::roles::ROLE_REQUESTER;
use ecuflow_db::models::status::ReportStatus;
use ecuflow_db::models::tuning_job::CreateTuningJob;
use ecuflow_db::models::user::CreateUser;
use ecuflow_db::repositories::{ProblemReportRepo, RoleRepo, TuningJobRepo, UserRepo};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_requester(pool: &PgPool, username: &str) -> i64 {
    let role = RoleRepo::find_by_name(pool, ROLE_REQUESTER)
        .await
        .unwrap()
        .expect("requester role seeded");
    UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
            email: format!("{username}@test.com"),
            password_hash: "x".to_string(),
            display_name: username.to_string(),
            role_id: role.id,
        },
    )
    .await
    .unwrap()
    .id
}

/// Create a job for `owner` and drive it to `completed`.
async fn seed_completed_job(pool: &PgPool, owner: i64) -> i64 {
    let job = TuningJobRepo::create(
        pool,
        owner,
        &CreateTuningJob {
            original_file_name: "map.bin".to_string(),
            stored_file_name: "uploads/map.bin".to_string(),
            dpf_off: false,
            egr_off: false,
            adblue_off: false,
            dtc_off: false,
            dtc_codes: None,
            immo_off: false,
            notes: None,
            vehicle_make: None,
            vehicle_model: None,
            vehicle_year: None,
            ecu_type: None,
        },
    )
    .await
    .unwrap();

    TuningJobRepo::complete(pool, job.id, "processed/map.bin")
        .await
        .unwrap()
        .expect("pending job should complete");
    job.id
}

// ---------------------------------------------------------------------------
// Filing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn file_creates_open_report(pool: PgPool) {
    let owner = seed_requester(&pool, "alice").await;
    let job_id = seed_completed_job(&pool, owner).await;

    let report = ProblemReportRepo::file(&pool, job_id, owner, "no power after flash")
        .await
        .unwrap()
        .expect("first filing should create a report");

    assert_eq!(report.job_id, job_id);
    assert_eq!(report.reporter_id, owner);
    assert_eq!(report.status_id, ReportStatus::Open.id());
    assert!(report.resolved_at.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn second_filing_is_rejected_while_open(pool: PgPool) {
    let owner = seed_requester(&pool, "alice").await;
    let job_id = seed_completed_job(&pool, owner).await;

    let first = ProblemReportRepo::file(&pool, job_id, owner, "first")
        .await
        .unwrap()
        .unwrap();

    let second = ProblemReportRepo::file(&pool, job_id, owner, "second")
        .await
        .unwrap();
    assert!(second.is_none(), "an open report must block a new filing");

    // The open report is still the first one.
    let open = ProblemReportRepo::find_open_for_job(&pool, job_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(open.id, first.id);
    assert_eq!(open.description, "first");
}

/// Concurrent filing attempts: the partial unique index guarantees exactly
/// one row, with the loser getting `None` rather than a duplicate.
#[sqlx::test(migrations = "../../db/migrations")]
async fn concurrent_filing_single_open_report(pool: PgPool) {
    let owner = seed_requester(&pool, "alice").await;
    let job_id = seed_completed_job(&pool, owner).await;

    let (a, b) = tokio::join!(
        ProblemReportRepo::file(&pool, job_id, owner, "racer a"),
        ProblemReportRepo::file(&pool, job_id, owner, "racer b"),
    );

    let winners = a.unwrap().is_some() as u8 + b.unwrap().is_some() as u8;
    assert_eq!(winners, 1, "exactly one concurrent filer may win");

    let count: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM problem_reports WHERE job_id = $1 AND status_id = 1",
    )
    .bind(job_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(count.0, 1, "at most one open report per job");
}

// ---------------------------------------------------------------------------
// Resolution and re-filing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn resolve_stamps_time_and_unblocks_refiling(pool: PgPool) {
    let owner = seed_requester(&pool, "alice").await;
    let job_id = seed_completed_job(&pool, owner).await;

    let first = ProblemReportRepo::file(&pool, job_id, owner, "first issue")
        .await
        .unwrap()
        .unwrap();

    let resolved = ProblemReportRepo::resolve(&pool, job_id)
        .await
        .unwrap()
        .expect("open report should resolve");
    assert_eq!(resolved.id, first.id);
    assert_eq!(resolved.status_id, ReportStatus::Resolved.id());
    assert!(resolved.resolved_at.is_some());

    // No open report remains; a new filing succeeds and gets a new row.
    assert!(ProblemReportRepo::find_open_for_job(&pool, job_id)
        .await
        .unwrap()
        .is_none());

    let second = ProblemReportRepo::file(&pool, job_id, owner, "second issue")
        .await
        .unwrap()
        .expect("filing after resolution should create a new report");
    assert_ne!(second.id, first.id);

    let history = ProblemReportRepo::list_for_job(&pool, job_id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, second.id, "newest report first");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn resolve_without_open_report_matches_nothing(pool: PgPool) {
    let owner = seed_requester(&pool, "alice").await;
    let job_id = seed_completed_job(&pool, owner).await;

    let result = ProblemReportRepo::resolve(&pool, job_id).await.unwrap();
    assert!(result.is_none());
}

/// Resolving twice is not possible: the second resolve finds nothing open.
#[sqlx::test(migrations = "../../db/migrations")]
async fn resolve_is_terminal_per_report(pool: PgPool) {
    let owner = seed_requester(&pool, "alice").await;
    let job_id = seed_completed_job(&pool, owner).await;

    ProblemReportRepo::file(&pool, job_id, owner, "issue")
        .await
        .unwrap()
        .unwrap();
    ProblemReportRepo::resolve(&pool, job_id).await.unwrap().unwrap();

    assert!(ProblemReportRepo::resolve(&pool, job_id).await.unwrap().is_none());
}
