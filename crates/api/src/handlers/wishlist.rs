//! Handlers for the `/wishlist` resource.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use bazaar_core::product::ProductStatus;
use bazaar_core::types::DbId;
use bazaar_db::models::wishlist::WishlistEntry;
use bazaar_db::repositories::{CartRepo, ProductRepo, WishlistRepo};
use serde::Deserialize;
use serde_json::json;

use super::cart::{add_to_cart, CartView};
use crate::error::{not_found, AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /wishlist`.
#[derive(Debug, Deserialize)]
pub struct AddToWishlistRequest {
    pub product_id: DbId,
}

/// Optional body for `POST /wishlist/{product_id}/move-to-cart`.
#[derive(Debug, Default, Deserialize)]
pub struct MoveToCartRequest {
    pub variant_id: Option<DbId>,
    pub quantity: Option<i32>,
}

/// GET /api/wishlist
pub async fn list_wishlist(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<WishlistEntry>>>> {
    let entries = WishlistRepo::list(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: entries }))
}

/// POST /api/wishlist
///
/// Idempotent: 201 when the product was added, 200 when already present.
pub async fn add_to_wishlist(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<AddToWishlistRequest>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    ProductRepo::find_by_id(&state.pool, input.product_id)
        .await?
        .filter(|p| p.status == ProductStatus::Approved.as_str())
        .ok_or_else(|| not_found("Product", input.product_id))?;

    let added = WishlistRepo::add(&state.pool, auth.user_id, input.product_id).await?;
    let status = if added {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(json!({ "data": { "product_id": input.product_id, "added": added } })),
    ))
}

/// DELETE /api/wishlist/{product_id}
pub async fn remove_from_wishlist(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(product_id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !WishlistRepo::remove(&state.pool, auth.user_id, product_id).await? {
        return Err(not_found("WishlistItem", product_id));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/wishlist/{product_id}/move-to-cart
///
/// Adds the product to the cart, then drops it from the wishlist. The
/// wishlist entry stays if the cart rejects the item.
pub async fn move_to_cart(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(product_id): Path<DbId>,
    body: Bytes,
) -> AppResult<Json<DataResponse<CartView>>> {
    let input: MoveToCartRequest = if body.is_empty() {
        MoveToCartRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| AppError::BadRequest(e.to_string()))?
    };

    if !WishlistRepo::contains(&state.pool, auth.user_id, product_id).await? {
        return Err(not_found("WishlistItem", product_id));
    }

    add_to_cart(
        &state,
        auth.user_id,
        product_id,
        input.variant_id,
        input.quantity.unwrap_or(1),
    )
    .await?;
    WishlistRepo::remove(&state.pool, auth.user_id, product_id).await?;

    let rows = CartRepo::list_lines(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse {
        data: CartView::from_rows(rows),
    }))
}
