//! Repository structs providing typed access to each table.
//!
//! Repositories are zero-sized structs with async methods taking `&PgPool`.
//! They return `sqlx::Error` directly; mapping to the domain error taxonomy
//! happens in the API layer.

pub mod message_repo;
pub mod problem_report_repo;
pub mod role_repo;
pub mod session_repo;
pub mod tuning_job_repo;
pub mod user_repo;

pub use message_repo::MessageRepo;
pub use problem_report_repo::ProblemReportRepo;
pub use role_repo::RoleRepo;
pub use session_repo::SessionRepo;
pub use tuning_job_repo::TuningJobRepo;
pub use user_repo::UserRepo;
