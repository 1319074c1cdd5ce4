//! Authentication and authorization middleware extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated user from a JWT Bearer token.
//! - [`rbac::RequireOperator`] -- Requires the `operator` role.

pub mod auth;
pub mod rbac;
