//! Handlers for the site footer.

use axum::extract::State;
use axum::Json;
use bazaar_core::footer::FooterContent;
use bazaar_db::repositories::FooterRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/footer-content
///
/// Falls back to the built-in default until an admin saves content. A
/// stored row that no longer parses is logged and replaced by the default.
pub async fn get_footer(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<FooterContent>>> {
    let content = match FooterRepo::get(&state.pool).await? {
        Some(row) => serde_json::from_value(row.content).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Stored footer content is unreadable, serving default");
            FooterContent::default()
        }),
        None => FooterContent::default(),
    };
    Ok(Json(DataResponse { data: content }))
}

/// PUT /api/footer-content
pub async fn update_footer(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(content): Json<FooterContent>,
) -> AppResult<Json<DataResponse<FooterContent>>> {
    content.validate()?;
    let value = serde_json::to_value(&content)
        .map_err(|e| AppError::InternalError(format!("Footer serialization error: {e}")))?;
    FooterRepo::upsert(&state.pool, &value, admin.user_id).await?;

    tracing::info!(admin_id = admin.user_id, "Footer content updated");
    Ok(Json(DataResponse { data: content }))
}
