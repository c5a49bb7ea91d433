//! Route definitions for site content and image uploads.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{footer, upload};
use crate::state::AppState;

/// Routes mounted at the API root.
///
/// ```text
/// GET  /footer-content   -> get_footer
/// PUT  /footer-content   -> update_footer (admin)
/// POST /upload           -> upload_single
/// POST /upload-multiple  -> upload_multiple
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/footer-content",
            get(footer::get_footer).put(footer::update_footer),
        )
        .route("/upload", post(upload::upload_single))
        .route("/upload-multiple", post(upload::upload_multiple))
}
