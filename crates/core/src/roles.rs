//! Well-known role name constants.
//!
//! These must match the seed data in `20260301000001_create_roles_table.sql`.

/// Submits tuning jobs and owns them.
pub const ROLE_REQUESTER: &str = "requester";

/// Fulfills and administers every job in the system.
pub const ROLE_OPERATOR: &str = "operator";
