//! Route definitions for the `/users` resource.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::users;
use crate::state::AppState;

/// Routes mounted at `/users`.
///
/// ```text
/// GET    /      -> list_users (admin)
/// PUT    /me    -> update_me
/// GET    /{id}  -> get_user (admin)
/// PUT    /{id}  -> update_user (admin)
/// DELETE /{id}  -> deactivate_user (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(users::list_users))
        .route("/me", put(users::update_me))
        .route(
            "/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::deactivate_user),
        )
}
