//! Route definitions for the `/products` resource, including variants.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::{products, variants};
use crate::state::AppState;

/// Routes mounted at `/products`.
///
/// ```text
/// GET    /                            -> list_products
/// POST   /                            -> create_product (seller/admin)
/// GET    /{id}                        -> get_product
/// PUT    /{id}                        -> update_product (owner/admin)
/// DELETE /{id}                        -> delete_product (owner/admin)
/// POST   /{id}/submit                 -> submit_product (owner)
/// POST   /{id}/review                 -> review_product (admin)
/// GET    /{id}/variants               -> list_variants
/// PUT    /{id}/variants               -> sync_variants (owner/admin)
/// DELETE /{id}/variants/{variant_id}  -> delete_variant (owner/admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/{id}",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route("/{id}/submit", post(products::submit_product))
        .route("/{id}/review", post(products::review_product))
        .route(
            "/{id}/variants",
            get(variants::list_variants).put(variants::sync_variants),
        )
        .route(
            "/{id}/variants/{variant_id}",
            delete(variants::delete_variant),
        )
}
