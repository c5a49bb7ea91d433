//! Handlers for `/categories` and `/subcategories`.
//!
//! Reads are public; writes are admin-only.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use bazaar_core::catalog::check_category_name;
use bazaar_core::types::DbId;
use bazaar_db::models::category::{
    Category, CategoryWithCount, CreateCategory, CreateSubcategory, Subcategory,
    SubcategoryWithParent, UpdateCategory,
};
use bazaar_db::repositories::CategoryRepo;

use crate::error::{not_found, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

fn trimmed(description: Option<&str>) -> Option<&str> {
    description.map(str::trim).filter(|d| !d.is_empty())
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// GET /api/categories
pub async fn list_categories(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<CategoryWithCount>>>> {
    let categories = CategoryRepo::list_with_counts(&state.pool).await?;
    Ok(Json(DataResponse { data: categories }))
}

/// POST /api/categories
pub async fn create_category(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateCategory>,
) -> AppResult<(StatusCode, Json<DataResponse<Category>>)> {
    let slug = check_category_name(&input.name)?;
    let category = CategoryRepo::create(
        &state.pool,
        input.name.trim(),
        &slug,
        trimmed(input.description.as_deref()),
    )
    .await?;

    tracing::info!(admin_id = admin.user_id, category_id = category.id, slug = %slug, "Category created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: category })))
}

/// PUT /api/categories/{id}
///
/// Renaming regenerates the slug.
pub async fn update_category(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateCategory>,
) -> AppResult<Json<DataResponse<Category>>> {
    let slug = input.name.as_deref().map(check_category_name).transpose()?;
    let category = CategoryRepo::update(
        &state.pool,
        id,
        input.name.as_deref().map(str::trim),
        slug.as_deref(),
        trimmed(input.description.as_deref()),
    )
    .await?
    .ok_or_else(|| not_found("Category", id))?;
    Ok(Json(DataResponse { data: category }))
}

/// DELETE /api/categories/{id}
pub async fn delete_category(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !CategoryRepo::delete(&state.pool, id).await? {
        return Err(not_found("Category", id));
    }
    tracing::info!(admin_id = admin.user_id, category_id = id, "Category deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Subcategories
// ---------------------------------------------------------------------------

/// GET /api/categories/{id}/subcategories
pub async fn list_subcategories(
    State(state): State<AppState>,
    Path(category_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Subcategory>>>> {
    CategoryRepo::find_by_id(&state.pool, category_id)
        .await?
        .ok_or_else(|| not_found("Category", category_id))?;
    let subcategories = CategoryRepo::list_subcategories(&state.pool, category_id).await?;
    Ok(Json(DataResponse {
        data: subcategories,
    }))
}

/// GET /api/subcategories/all
pub async fn list_all_subcategories(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<SubcategoryWithParent>>>> {
    let subcategories = CategoryRepo::list_all_subcategories(&state.pool).await?;
    Ok(Json(DataResponse {
        data: subcategories,
    }))
}

/// POST /api/subcategories
pub async fn create_subcategory(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateSubcategory>,
) -> AppResult<(StatusCode, Json<DataResponse<Subcategory>>)> {
    let slug = check_category_name(&input.name)?;
    CategoryRepo::find_by_id(&state.pool, input.category_id)
        .await?
        .ok_or_else(|| not_found("Category", input.category_id))?;

    let subcategory =
        CategoryRepo::create_subcategory(&state.pool, input.category_id, input.name.trim(), &slug)
            .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: subcategory })))
}

/// DELETE /api/subcategories/{id}
pub async fn delete_subcategory(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !CategoryRepo::delete_subcategory(&state.pool, id).await? {
        return Err(not_found("Subcategory", id));
    }
    Ok(StatusCode::NO_CONTENT)
}
