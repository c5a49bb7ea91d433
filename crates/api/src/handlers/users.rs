//! Handlers for the `/users` resource.
//!
//! Everything except `PUT /users/me` is admin-only.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use bazaar_core::error::CoreError;
use bazaar_core::roles::Role;
use bazaar_core::types::DbId;
use bazaar_db::models::user::{UpdateUser, UserListParams, UserResponse};
use bazaar_db::repositories::{SessionRepo, UserRepo};
use serde::Deserialize;

use crate::auth::password::{
    hash_password, validate_password_strength, verify_password, MIN_PASSWORD_LENGTH,
};
use crate::error::{not_found, AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `PUT /users/me`.
#[derive(Debug, Deserialize)]
pub struct UpdateMeRequest {
    pub name: Option<String>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

/// GET /api/users
pub async fn list_users(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<UserListParams>,
) -> AppResult<Json<DataResponse<Vec<UserResponse>>>> {
    if let Some(role) = params.role.as_deref() {
        Role::parse(role)?;
    }
    let users = UserRepo::list(&state.pool, &params).await?;
    Ok(Json(DataResponse {
        data: users.iter().map(UserResponse::from).collect(),
    }))
}

/// GET /api/users/{id}
pub async fn get_user(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let user = UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found("User", id))?;
    Ok(Json(DataResponse {
        data: UserResponse::from(&user),
    }))
}

/// PUT /api/users/{id}
///
/// Admins may rename, change role, or (de)activate anyone but cannot demote
/// or deactivate themselves.
pub async fn update_user(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateUser>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let role = input.role.as_deref().map(Role::parse).transpose()?;

    if id == admin.user_id {
        if role.is_some_and(|r| r != Role::Admin) {
            return Err(AppError::Core(CoreError::Conflict(
                "Admins cannot demote themselves".into(),
            )));
        }
        if input.is_active == Some(false) {
            return Err(AppError::Core(CoreError::Conflict(
                "Admins cannot deactivate themselves".into(),
            )));
        }
    }
    check_name(input.name.as_deref())?;

    let user = UserRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found("User", id))?;

    if input.is_active == Some(false) || role.is_some() {
        SessionRepo::revoke_all_for_user(&state.pool, id).await?;
    }

    tracing::info!(admin_id = admin.user_id, user_id = id, "User updated");
    Ok(Json(DataResponse {
        data: UserResponse::from(&user),
    }))
}

/// DELETE /api/users/{id}
///
/// Soft-deactivates the account and revokes its sessions. Returns 204.
pub async fn deactivate_user(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if id == admin.user_id {
        return Err(AppError::Core(CoreError::Conflict(
            "Admins cannot deactivate themselves".into(),
        )));
    }

    if !UserRepo::deactivate(&state.pool, id).await? {
        return Err(not_found("User", id));
    }
    SessionRepo::revoke_all_for_user(&state.pool, id).await?;

    tracing::info!(admin_id = admin.user_id, user_id = id, "User deactivated");
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/users/me
///
/// Update the caller's own name and/or password. Changing the password
/// requires the current one.
pub async fn update_me(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<UpdateMeRequest>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    check_name(input.name.as_deref())?;

    let user = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| not_found("User", auth.user_id))?;

    if let Some(new_password) = input.new_password.as_deref() {
        let current = input.current_password.as_deref().ok_or_else(|| {
            AppError::Core(CoreError::Validation(
                "current_password: is required to change the password".into(),
            ))
        })?;
        let valid = verify_password(current, &user.password_hash)
            .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
        if !valid {
            return Err(AppError::Core(CoreError::Unauthorized(
                "Current password is incorrect".into(),
            )));
        }
        validate_password_strength(new_password, MIN_PASSWORD_LENGTH)
            .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

        let hash = hash_password(new_password)
            .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;
        UserRepo::update_password(&state.pool, user.id, &hash).await?;
        tracing::info!(user_id = user.id, "Password changed");
    }

    let user = match input.name {
        Some(name) => {
            let update = UpdateUser {
                name: Some(name),
                ..UpdateUser::default()
            };
            UserRepo::update(&state.pool, user.id, &update)
                .await?
                .ok_or_else(|| not_found("User", auth.user_id))?
        }
        None => user,
    };

    Ok(Json(DataResponse {
        data: UserResponse::from(&user),
    }))
}

fn check_name(name: Option<&str>) -> Result<(), AppError> {
    match name.map(|n| n.trim().chars().count()) {
        Some(len) if !(2..=100).contains(&len) => Err(AppError::Core(CoreError::Validation(
            "name: must be between 2 and 100 characters".into(),
        ))),
        _ => Ok(()),
    }
}
