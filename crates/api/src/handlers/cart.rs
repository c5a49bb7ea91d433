//! Handlers for the `/cart` resource. Every route acts on the caller's cart.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use bazaar_core::cart::{check_quantity, price_cart, CartLine, CartTotals};
use bazaar_core::error::CoreError;
use bazaar_core::images::stored_images;
use bazaar_core::product::ProductStatus;
use bazaar_core::types::{DbId, Money};
use bazaar_core::variants::variant_label;
use bazaar_db::models::cart::CartLineRow;
use bazaar_db::repositories::{CartRepo, ProductRepo, VariantRepo};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{not_found, AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /cart`.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: DbId,
    pub variant_id: Option<DbId>,
    #[serde(default = "one")]
    pub quantity: i32,
}

fn one() -> i32 {
    1
}

/// Request body for `PUT /cart/{item_id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateCartRequest {
    pub quantity: i32,
}

/// One cart line as shown to the buyer.
#[derive(Debug, Serialize)]
pub struct CartLineView {
    #[serde(flatten)]
    pub line: CartLineRow,
    pub image: Option<String>,
    pub variant_label: Option<String>,
    pub line_total: Money,
    /// False when the product was unlisted or stock fell below the quantity.
    pub available: bool,
}

impl From<CartLineRow> for CartLineView {
    fn from(line: CartLineRow) -> Self {
        let image = line
            .variant_images
            .as_ref()
            .map(stored_images)
            .and_then(|imgs| imgs.into_iter().next())
            .or_else(|| stored_images(&line.product_images).into_iter().next());
        let label = line
            .variant_id
            .map(|_| variant_label(line.color.as_deref(), line.size.as_deref()))
            .filter(|l| !l.is_empty());
        Self {
            image,
            variant_label: label,
            line_total: line.unit_price * Decimal::from(line.quantity),
            available: line.product_status == ProductStatus::Approved.as_str()
                && line.available_stock >= line.quantity,
            line,
        }
    }
}

/// `GET /cart` payload.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<CartLineView>,
    pub totals: CartTotals,
}

impl CartView {
    pub(crate) fn from_rows(rows: Vec<CartLineRow>) -> Self {
        let totals = price_cart(&cart_lines(&rows));
        Self {
            items: rows.into_iter().map(CartLineView::from).collect(),
            totals,
        }
    }
}

pub(crate) fn cart_lines(rows: &[CartLineRow]) -> Vec<CartLine> {
    rows.iter()
        .map(|r| CartLine {
            unit_price: r.unit_price,
            unit_mrp: r.unit_mrp,
            quantity: r.quantity,
        })
        .collect()
}

async fn load_cart(state: &AppState, user_id: DbId) -> AppResult<CartView> {
    let rows = CartRepo::list_lines(&state.pool, user_id).await?;
    Ok(CartView::from_rows(rows))
}

/// Add `quantity` units to the caller's cart, merging with an existing line.
///
/// Products with variants must be added as a specific variant.
pub(crate) async fn add_to_cart(
    state: &AppState,
    user_id: DbId,
    product_id: DbId,
    variant_id: Option<DbId>,
    quantity: i32,
) -> AppResult<()> {
    let product = ProductRepo::find_by_id(&state.pool, product_id)
        .await?
        .filter(|p| p.status == ProductStatus::Approved.as_str())
        .ok_or_else(|| not_found("Product", product_id))?;

    let available = match variant_id {
        Some(vid) => {
            VariantRepo::find(&state.pool, product.id, vid)
                .await?
                .ok_or_else(|| not_found("ProductVariant", vid))?
                .stock
        }
        None => {
            if VariantRepo::count_for_product(&state.pool, product.id).await? > 0 {
                return Err(AppError::Core(CoreError::Validation(
                    "variant_id: choose a variant of this product".into(),
                )));
            }
            product.stock
        }
    };

    let existing = CartRepo::find_by_product(&state.pool, user_id, product.id, variant_id)
        .await?
        .map(|item| item.quantity)
        .unwrap_or(0);
    check_quantity(quantity, available)?;
    check_quantity(existing + quantity, available)?;

    CartRepo::upsert(&state.pool, user_id, product.id, variant_id, existing + quantity).await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/cart
pub async fn view_cart(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<CartView>>> {
    Ok(Json(DataResponse {
        data: load_cart(&state, auth.user_id).await?,
    }))
}

/// POST /api/cart
pub async fn add_item(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<AddToCartRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<CartView>>)> {
    add_to_cart(
        &state,
        auth.user_id,
        input.product_id,
        input.variant_id,
        input.quantity,
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: load_cart(&state, auth.user_id).await?,
        }),
    ))
}

/// PUT /api/cart/{item_id}
pub async fn update_item(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(item_id): Path<DbId>,
    Json(input): Json<UpdateCartRequest>,
) -> AppResult<Json<DataResponse<CartView>>> {
    let line = CartRepo::find_line(&state.pool, auth.user_id, item_id)
        .await?
        .ok_or_else(|| not_found("CartItem", item_id))?;
    check_quantity(input.quantity, line.available_stock)?;

    CartRepo::update_quantity(&state.pool, auth.user_id, item_id, input.quantity)
        .await?
        .ok_or_else(|| not_found("CartItem", item_id))?;

    Ok(Json(DataResponse {
        data: load_cart(&state, auth.user_id).await?,
    }))
}

/// DELETE /api/cart/{item_id}
pub async fn remove_item(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(item_id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !CartRepo::remove(&state.pool, auth.user_id, item_id).await? {
        return Err(not_found("CartItem", item_id));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/cart
pub async fn clear_cart(auth: AuthUser, State(state): State<AppState>) -> AppResult<StatusCode> {
    let mut conn = state.pool.acquire().await?;
    CartRepo::clear(&mut conn, auth.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
