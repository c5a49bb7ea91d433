//! Route definitions for categories and subcategories.

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::handlers::categories;
use crate::state::AppState;

/// Routes mounted at `/categories`.
///
/// ```text
/// GET    /                     -> list_categories
/// POST   /                     -> create_category (admin)
/// PUT    /{id}                 -> update_category (admin)
/// DELETE /{id}                 -> delete_category (admin)
/// GET    /{id}/subcategories   -> list_subcategories
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/{id}",
            put(categories::update_category).delete(categories::delete_category),
        )
        .route("/{id}/subcategories", get(categories::list_subcategories))
}

/// Routes mounted at `/subcategories`.
///
/// ```text
/// GET    /all   -> list_all_subcategories
/// POST   /      -> create_subcategory (admin)
/// DELETE /{id}  -> delete_subcategory (admin)
/// ```
pub fn subcategory_router() -> Router<AppState> {
    Router::new()
        .route("/all", get(categories::list_all_subcategories))
        .route("/", post(categories::create_subcategory))
        .route("/{id}", delete(categories::delete_subcategory))
}
