//! Role-based access control (RBAC) extractors.
//!
//! Each extractor wraps [`AuthUser`] and rejects requests whose role does not
//! meet the minimum requirement. An admin impersonating a buyer carries the
//! buyer's role, so admin routes are closed to them until they stop.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use bazaar_core::error::CoreError;
use bazaar_core::roles::Role;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Requires the `admin` role. Rejects with 403 Forbidden otherwise.
///
/// ```ignore
/// async fn admin_only(RequireAdmin(user): RequireAdmin) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != Role::Admin {
            return Err(AppError::Core(CoreError::Forbidden(
                "Admin role required".into(),
            )));
        }
        Ok(RequireAdmin(user))
    }
}

/// Requires `seller` or `admin` role. Rejects with 403 Forbidden otherwise.
pub struct RequireSeller(pub AuthUser);

impl FromRequestParts<AppState> for RequireSeller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !matches!(user.role, Role::Seller | Role::Admin) {
            return Err(AppError::Core(CoreError::Forbidden(
                "Seller or Admin role required".into(),
            )));
        }
        Ok(RequireSeller(user))
    }
}

/// Requires any authenticated user (any valid role).
///
/// Functionally equivalent to [`AuthUser`] but named explicitly for routes
/// where "this requires authentication" should be self-documenting.
pub struct RequireAuth(pub AuthUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        Ok(RequireAuth(user))
    }
}
