//! Access policy for job-scoped operations.
//!
//! [`authorize`] is a pure predicate: it sees only the acting identity and
//! the freshly fetched target job, never ambient state. Callers must fetch
//! the job immediately before authorizing so the decision cannot be made
//! against a stale row.

use crate::error::CoreError;
use crate::roles::ROLE_OPERATOR;
use crate::types::DbId;

/// The acting identity, as established by the transport layer.
///
/// The role is re-read on every request; it is never cached across requests,
/// so a role change takes effect on the next authorization check.
#[derive(Debug, Clone, Copy)]
pub struct Actor<'a> {
    pub user_id: DbId,
    pub role: &'a str,
}

/// The slice of a job the policy needs: its id and owning user.
#[derive(Debug, Clone, Copy)]
pub struct JobTarget {
    pub job_id: DbId,
    pub owner_id: DbId,
}

/// Job-scoped operations subject to authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOperation {
    View,
    Edit,
    Complete,
    Cancel,
    SetOperatorMessage,
    PostMessage,
    ListMessages,
    FileProblem,
    ResolveProblem,
    JoinRoom,
}

/// Decide whether `actor` may perform `op` on `target`.
///
/// Precedence:
///
/// 1. Filing a problem report is owner-only, whatever the role.
/// 2. Operators may perform every other operation on any job.
/// 3. Requesters may perform owner-facing operations on their own jobs.
/// 4. Everything else is denied. Denials against jobs the actor cannot see
///    surface as [`CoreError::NotFound`] so existence is not leaked;
///    role-restricted operations attempted by the owner surface as
///    [`CoreError::Forbidden`].
pub fn authorize(actor: &Actor<'_>, op: JobOperation, target: JobTarget) -> Result<(), CoreError> {
    use JobOperation::*;

    let is_operator = actor.role == ROLE_OPERATOR;
    let is_owner = actor.user_id == target.owner_id;

    match op {
        // Escalations always come from the job's requester.
        FileProblem if is_owner => Ok(()),
        FileProblem if is_operator => Err(CoreError::Forbidden(
            "Only the job owner may file a problem report".into(),
        )),
        FileProblem => Err(hidden(target)),

        _ if is_operator => Ok(()),

        // A requester cannot see jobs they do not own.
        _ if !is_owner => Err(hidden(target)),

        View | Edit | PostMessage | ListMessages | JoinRoom => Ok(()),

        Complete | Cancel | SetOperatorMessage | ResolveProblem => {
            Err(CoreError::Forbidden("Operator role required".into()))
        }
    }
}

fn hidden(target: JobTarget) -> CoreError {
    CoreError::NotFound {
        entity: "Job",
        id: target.job_id,
    }
}
