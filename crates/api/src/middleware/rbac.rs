//! Role-based access control (RBAC) extractors.
//!
//! Wraps [`AuthUser`] and rejects requests whose role does not meet the
//! requirement. Use in route handlers to enforce authorization at the type
//! level. Ownership-scoped checks belong to `ecuflow_core::policy`, not here.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use ecuflow_core::error::CoreError;
use ecuflow_core::roles::ROLE_OPERATOR;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Requires the `operator` role. Rejects with 403 Forbidden otherwise.
///
/// ```ignore
/// async fn operator_only(RequireOperator(user): RequireOperator) -> AppResult<Json<()>> {
///     // user is guaranteed to be an operator here
///     Ok(Json(()))
/// }
/// ```
pub struct RequireOperator(pub AuthUser);

impl FromRequestParts<AppState> for RequireOperator {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != ROLE_OPERATOR {
            return Err(AppError::Core(CoreError::Forbidden(
                "Operator role required".into(),
            )));
        }
        Ok(RequireOperator(user))
    }
}
