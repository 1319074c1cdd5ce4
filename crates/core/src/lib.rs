//! Domain logic for the ecuflow tuning service.
//!
//! This crate is free of I/O: it holds the shared id/timestamp types, the
//! domain error taxonomy, role constants, the access policy that gates every
//! job operation, and the download filename derivation.

pub mod error;
pub mod naming;
pub mod policy;
pub mod roles;
pub mod types;
