pub mod auth;
pub mod cart;
pub mod categories;
pub mod health;
pub mod notifications;
pub mod orders;
pub mod products;
pub mod site;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/register                           register (public)
/// /auth/login                              login (public)
/// /auth/refresh                            refresh (public)
/// /auth/logout                             logout
/// /auth/me                                 current user
/// /auth/impersonate/{user_id}              start impersonation (admin)
/// /auth/impersonate/stop                   end impersonation
///
/// /categories                              list (public), create (admin)
/// /categories/{id}                         update, delete (admin)
/// /categories/{id}/subcategories           list (public)
/// /subcategories/all                       list (public)
/// /subcategories                           create (admin)
/// /subcategories/{id}                      delete (admin)
///
/// /products                                list (public), create (seller)
/// /products/{id}                           get, update, delete
/// /products/{id}/submit                    submit for review (owner)
/// /products/{id}/review                    approve or reject (admin)
/// /products/{id}/variants                  list, sync
/// /products/{id}/variants/{variant_id}     delete
///
/// /cart                                    view, add, clear
/// /cart/{item_id}                          update quantity, remove
/// /wishlist                                list, add
/// /wishlist/{product_id}                   remove
/// /wishlist/{product_id}/move-to-cart      move to cart
///
/// /orders                                  list, checkout
/// /orders/{id}                             get
/// /orders/{id}/items                       items visible to caller
/// /orders/{id}/status                      change status (PATCH)
/// /orders/{id}/cancel                      cancel
///
/// /returns/request                         request a return (buyer)
/// /returns                                 list
/// /returns/{id}                            decide (PATCH)
///
/// /users                                   list (admin)
/// /users/me                                update own profile
/// /users/{id}                              get, update, deactivate (admin)
///
/// /footer-content                          get (public), replace (admin)
/// /upload                                  single image
/// /upload-multiple                         up to ten images
///
/// /notifications                           list
/// /notifications/read-all                  mark all read
/// /notifications/unread-count              unread count
/// /notifications/{id}/read                 mark read
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/categories", categories::router())
        .nest("/subcategories", categories::subcategory_router())
        .nest("/products", products::router())
        .nest("/cart", cart::router())
        .nest("/wishlist", cart::wishlist_router())
        .nest("/orders", orders::router())
        .nest("/returns", orders::returns_router())
        .nest("/users", users::router())
        .nest("/notifications", notifications::router())
        .merge(site::router())
}
