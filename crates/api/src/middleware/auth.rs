//! JWT-based authentication extractors for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use bazaar_core::error::CoreError;
use bazaar_core::roles::Role;
use bazaar_core::types::DbId;

use crate::auth::cookies::{read_cookie, ACCESS_COOKIE};
use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user extracted from the access token.
///
/// The token is read from `Authorization: Bearer <token>` first, then from
/// the `access_token` cookie.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.user_id, role = %user.role, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The effective user's id (from `claims.sub`).
    pub user_id: DbId,
    /// The effective user's role.
    pub role: Role,
    /// The admin behind an impersonated session.
    pub impersonator_id: Option<DbId>,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

fn bearer_or_cookie(parts: &Parts) -> Result<Option<String>, AppError> {
    if let Some(header) = parts.headers.get("authorization") {
        let value = header.to_str().unwrap_or_default();
        let token = value.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;
        return Ok(Some(token.to_string()));
    }
    Ok(read_cookie(&parts.headers, ACCESS_COOKIE))
}

fn decode(token: &str, state: &AppState) -> Result<AuthUser, AppError> {
    let claims = validate_token(token, &state.config.jwt)
        .map_err(|_| AppError::Core(CoreError::Unauthorized("Invalid or expired token".into())))?;
    let role = Role::parse(&claims.role)
        .map_err(|_| AppError::Core(CoreError::Unauthorized("Invalid or expired token".into())))?;

    Ok(AuthUser {
        user_id: claims.sub,
        role,
        impersonator_id: claims.imp,
    })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_or_cookie(parts)?.ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized("Authentication required".into()))
        })?;
        decode(&token, state)
    }
}

/// Optional authentication for public routes whose output depends on the
/// caller (e.g. product visibility). A missing token yields `None`; a
/// present but invalid token is still rejected.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match bearer_or_cookie(parts)? {
            Some(token) => decode(&token, state).map(|u| MaybeAuthUser(Some(u))),
            None => Ok(MaybeAuthUser(None)),
        }
    }
}
