//! Route definitions for the `/auth` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST /register              -> register
/// POST /login                 -> login
/// POST /refresh               -> refresh
/// POST /logout                -> logout (requires auth)
/// GET  /me                    -> me (requires auth)
/// POST /impersonate/stop      -> stop_impersonation
/// POST /impersonate/{user_id} -> impersonate (admin only)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .route("/impersonate/stop", post(auth::stop_impersonation))
        .route("/impersonate/{user_id}", post(auth::impersonate))
}
