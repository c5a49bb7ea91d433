//! Route definitions for orders and returns.

use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::{orders, returns};
use crate::state::AppState;

/// Routes mounted at `/orders`.
///
/// ```text
/// GET   /              -> list_orders
/// POST  /              -> checkout
/// GET   /{id}          -> get_order
/// GET   /{id}/items    -> list_order_items
/// PATCH /{id}/status   -> update_status
/// POST  /{id}/cancel   -> cancel_order
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::list_orders).post(orders::checkout))
        .route("/{id}", get(orders::get_order))
        .route("/{id}/items", get(orders::list_order_items))
        .route("/{id}/status", patch(orders::update_status))
        .route("/{id}/cancel", post(orders::cancel_order))
}

/// Routes mounted at `/returns`.
///
/// ```text
/// POST  /request  -> request_return (buyer)
/// GET   /         -> list_returns
/// PATCH /{id}     -> decide_return (seller/admin)
/// ```
pub fn returns_router() -> Router<AppState> {
    Router::new()
        .route("/request", post(returns::request_return))
        .route("/", get(returns::list_returns))
        .route("/{id}", patch(returns::decide_return))
}
