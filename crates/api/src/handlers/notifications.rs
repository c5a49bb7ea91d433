//! Handlers for the `/notifications` resource.
//!
//! All endpoints require authentication via [`AuthUser`].

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use bazaar_core::types::DbId;
use bazaar_db::repositories::NotificationRepo;
use bazaar_db::{clamp_limit, clamp_offset};
use serde::Deserialize;

use crate::error::{not_found, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Query parameters for `GET /notifications`.
#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    /// If `true`, return only unread notifications. Defaults to `false`.
    pub unread_only: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/notifications
pub async fn list_notifications(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<NotificationQuery>,
) -> AppResult<Json<serde_json::Value>> {
    let notifications = NotificationRepo::list_for_user(
        &state.pool,
        auth.user_id,
        params.unread_only.unwrap_or(false),
        clamp_limit(params.limit),
        clamp_offset(params.offset),
    )
    .await?;

    Ok(Json(serde_json::json!({ "data": notifications })))
}

/// POST /api/notifications/{id}/read
///
/// Returns 204, or 404 if the notification is not the caller's.
pub async fn mark_read(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(notification_id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !NotificationRepo::mark_read(&state.pool, notification_id, auth.user_id).await? {
        return Err(not_found("Notification", notification_id));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/notifications/read-all
pub async fn mark_all_read(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<serde_json::Value>> {
    let count = NotificationRepo::mark_all_read(&state.pool, auth.user_id).await?;
    Ok(Json(serde_json::json!({
        "data": { "marked_read": count }
    })))
}

/// GET /api/notifications/unread-count
pub async fn unread_count(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<serde_json::Value>> {
    let count = NotificationRepo::unread_count(&state.pool, auth.user_id).await?;
    Ok(Json(serde_json::json!({
        "data": { "count": count }
    })))
}
