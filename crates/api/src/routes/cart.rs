//! Route definitions for the `/cart` and `/wishlist` resources.

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::handlers::{cart, wishlist};
use crate::state::AppState;

/// Routes mounted at `/cart`.
///
/// ```text
/// GET    /           -> view_cart
/// POST   /           -> add_item
/// DELETE /           -> clear_cart
/// PUT    /{item_id}  -> update_item
/// DELETE /{item_id}  -> remove_item
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(cart::view_cart)
                .post(cart::add_item)
                .delete(cart::clear_cart),
        )
        .route(
            "/{item_id}",
            put(cart::update_item).delete(cart::remove_item),
        )
}

/// Routes mounted at `/wishlist`.
///
/// ```text
/// GET    /                           -> list_wishlist
/// POST   /                           -> add_to_wishlist
/// DELETE /{product_id}               -> remove_from_wishlist
/// POST   /{product_id}/move-to-cart  -> move_to_cart
/// ```
pub fn wishlist_router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(wishlist::list_wishlist).post(wishlist::add_to_wishlist),
        )
        .route("/{product_id}", delete(wishlist::remove_from_wishlist))
        .route("/{product_id}/move-to-cart", post(wishlist::move_to_cart))
}
