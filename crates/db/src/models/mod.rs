//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - A `Deserialize` update DTO (all `Option` fields) for patches

pub mod message;
pub mod problem_report;
pub mod role;
pub mod session;
pub mod status;
pub mod tuning_job;
pub mod user;
