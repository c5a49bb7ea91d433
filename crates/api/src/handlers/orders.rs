//! Handlers for the `/orders` resource: checkout, listing, and the status
//! lifecycle.
//!
//! Buyers see their own orders. Sellers see their own purchases plus orders
//! containing their items, and only those items. Admins see everything.

use std::collections::{BTreeMap, BTreeSet};

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use bazaar_core::cart::{check_quantity, price_cart, CartLine};
use bazaar_core::error::CoreError;
use bazaar_core::images::stored_images;
use bazaar_core::order::{check_transition, OrderStatus, PaymentMethod, ShippingAddress};
use bazaar_core::product::ProductStatus;
use bazaar_core::roles::Role;
use bazaar_core::types::DbId;
use bazaar_core::variants::variant_label;
use bazaar_db::models::order::{
    CreateOrder, CreateOrderItem, Order, OrderItem, OrderListParams, OrderScope, OrderSummary,
};
use bazaar_db::models::product::Product;
use bazaar_db::models::variant::ProductVariant;
use bazaar_db::repositories::{CartRepo, OrderRepo, ProductRepo, VariantRepo};
use bazaar_db::{clamp_limit, clamp_offset};
use bazaar_events::PlatformEvent;
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;

use crate::error::{not_found, AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::{DataResponse, PagedResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /orders`.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
}

/// Request body for `PATCH /orders/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct StatusChangeRequest {
    pub status: OrderStatus,
}

/// An order with the lines the caller may see.
#[derive(Debug, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

// ---------------------------------------------------------------------------
// Visibility
// ---------------------------------------------------------------------------

/// How the caller relates to an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OrderAccess {
    Admin,
    Buyer,
    /// Seller of at least one line; sees only their own lines.
    Seller(DbId),
}

impl OrderAccess {
    fn acting_role(self) -> Role {
        match self {
            OrderAccess::Admin => Role::Admin,
            OrderAccess::Buyer => Role::Buyer,
            OrderAccess::Seller(_) => Role::Seller,
        }
    }

    fn item_filter(self) -> Option<DbId> {
        match self {
            OrderAccess::Seller(id) => Some(id),
            _ => None,
        }
    }
}

/// Listing scope for the caller's role.
pub(crate) fn list_scope(user: &AuthUser) -> OrderScope {
    match user.role {
        Role::Admin => OrderScope::All,
        Role::Seller => OrderScope::Seller(user.user_id),
        Role::Buyer => OrderScope::Buyer(user.user_id),
    }
}

/// Resolve the caller's access to an order. Orders the caller has no part
/// in are reported as missing.
pub(crate) async fn order_access(
    state: &AppState,
    user: &AuthUser,
    order: &Order,
) -> AppResult<OrderAccess> {
    if user.is_admin() {
        return Ok(OrderAccess::Admin);
    }
    if order.buyer_id == user.user_id {
        return Ok(OrderAccess::Buyer);
    }
    if user.role == Role::Seller
        && OrderRepo::seller_has_items(&state.pool, order.id, user.user_id).await?
    {
        return Ok(OrderAccess::Seller(user.user_id));
    }
    Err(not_found("Order", order.id))
}

async fn load_visible_order(
    state: &AppState,
    user: &AuthUser,
    id: DbId,
) -> AppResult<(Order, OrderAccess)> {
    let order = OrderRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found("Order", id))?;
    let access = order_access(state, user, &order).await?;
    Ok((order, access))
}

// ---------------------------------------------------------------------------
// Stock
// ---------------------------------------------------------------------------

/// A quantity going back on the shelf.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Restock {
    pub product_id: Option<DbId>,
    pub variant_id: Option<DbId>,
    pub quantity: i32,
}

/// Return stock to products and variants. Lines whose product was deleted
/// are skipped. Products with variants have their stock recomputed from
/// the variants; plain products are incremented.
pub(crate) async fn restock(conn: &mut PgConnection, lines: &[Restock]) -> Result<(), sqlx::Error> {
    let mut plain: BTreeMap<DbId, i32> = BTreeMap::new();
    let mut touched: BTreeSet<DbId> = BTreeSet::new();
    for line in lines {
        if let Some(pid) = line.product_id {
            touched.insert(pid);
            if line.variant_id.is_none() {
                *plain.entry(pid).or_default() += line.quantity;
            }
        }
    }

    // Products are locked in id order, the same order checkout uses.
    for pid in &touched {
        ProductRepo::find_for_update(conn, *pid).await?;
    }
    for line in lines {
        if let (Some(_), Some(vid)) = (line.product_id, line.variant_id) {
            VariantRepo::adjust_stock(conn, vid, line.quantity).await?;
        }
    }
    for pid in touched {
        if VariantRepo::list_by_product_tx(conn, pid).await?.is_empty() {
            let qty = plain.get(&pid).copied().unwrap_or(0);
            if qty > 0 {
                ProductRepo::adjust_stock(conn, pid, qty).await?;
            }
        } else {
            ProductRepo::sync_stock_from_variants(conn, pid).await?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Checkout
// ---------------------------------------------------------------------------

fn unavailable(name: &str) -> AppError {
    AppError::Core(CoreError::Conflict(format!(
        "'{name}' is no longer available"
    )))
}

/// POST /api/orders
///
/// Turns the caller's cart into an order in one transaction: rows are
/// locked, stock verified and decremented, prices snapshotted, and the cart
/// cleared.
pub async fn checkout(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CheckoutRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<OrderDetail>>)> {
    input.shipping_address.validate_address()?;
    let address = serde_json::to_value(&input.shipping_address)
        .map_err(|e| AppError::InternalError(format!("Address serialization error: {e}")))?;

    let mut tx = state.pool.begin().await?;

    let mut lines = CartRepo::list_lines_tx(&mut tx, auth.user_id).await?;
    if lines.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }
    lines.sort_by_key(|l| (l.product_id, l.variant_id));

    // Lock every product, then every variant, in id order.
    let mut products: BTreeMap<DbId, Product> = BTreeMap::new();
    for line in &lines {
        if !products.contains_key(&line.product_id) {
            let product = ProductRepo::find_for_update(&mut tx, line.product_id)
                .await?
                .ok_or_else(|| unavailable(&line.product_name))?;
            products.insert(product.id, product);
        }
    }
    let mut variants: BTreeMap<DbId, ProductVariant> = BTreeMap::new();
    for line in &lines {
        if let Some(vid) = line.variant_id {
            let variant = VariantRepo::find_for_update(&mut tx, line.product_id, vid)
                .await?
                .ok_or_else(|| unavailable(&line.product_name))?;
            variants.insert(vid, variant);
        }
    }
    let mut has_variants: BTreeSet<DbId> = BTreeSet::new();
    for pid in products.keys() {
        if !VariantRepo::list_by_product_tx(&mut tx, *pid).await?.is_empty() {
            has_variants.insert(*pid);
        }
    }

    let mut pricing = Vec::with_capacity(lines.len());
    let mut items = Vec::with_capacity(lines.len());
    for line in &lines {
        let product = products
            .get(&line.product_id)
            .ok_or_else(|| unavailable(&line.product_name))?;
        if product.status != ProductStatus::Approved.as_str() {
            return Err(unavailable(&product.name));
        }
        let variant = line.variant_id.and_then(|vid| variants.get(&vid));
        if variant.is_none() && has_variants.contains(&product.id) {
            return Err(AppError::Core(CoreError::Conflict(format!(
                "'{}' now comes in variants; pick one and add it again",
                product.name
            ))));
        }

        let (stock, unit_price, unit_mrp) = match variant {
            Some(v) => (v.stock, v.price, v.mrp.or(product.mrp)),
            None => (product.stock, product.price, product.mrp),
        };
        check_quantity(line.quantity, stock).map_err(|e| match e {
            CoreError::Conflict(msg) => {
                AppError::Core(CoreError::Conflict(format!("{}: {msg}", product.name)))
            }
            other => AppError::Core(other),
        })?;

        let image = variant
            .and_then(|v| stored_images(&v.images).into_iter().next())
            .or_else(|| stored_images(&product.images).into_iter().next());

        pricing.push(CartLine {
            unit_price,
            unit_mrp,
            quantity: line.quantity,
        });
        items.push(CreateOrderItem {
            product_id: product.id,
            variant_id: variant.map(|v| v.id),
            seller_id: product.seller_id,
            product_name: product.name.clone(),
            variant_label: variant
                .map(|v| variant_label(v.color.as_deref(), v.size.as_deref()))
                .filter(|l| !l.is_empty()),
            image,
            unit_price,
            quantity: line.quantity,
        });
    }

    for item in &items {
        if let Some(vid) = item.variant_id {
            VariantRepo::adjust_stock(&mut tx, vid, -item.quantity).await?;
        }
        ProductRepo::adjust_stock(&mut tx, item.product_id, -item.quantity).await?;
    }

    let totals = price_cart(&pricing);
    let (order, order_items) = OrderRepo::create(
        &mut tx,
        &CreateOrder {
            buyer_id: auth.user_id,
            payment_method: input.payment_method.as_str().to_string(),
            shipping_address: address,
            subtotal: totals.subtotal,
            shipping_fee: totals.shipping,
            total: totals.total,
        },
        &items,
    )
    .await?;
    CartRepo::clear(&mut tx, auth.user_id).await?;
    tx.commit().await?;

    tracing::info!(
        order_id = order.id,
        order_number = %order.order_number,
        buyer_id = auth.user_id,
        lines = order_items.len(),
        total = %order.total,
        "Order placed"
    );
    state.event_bus.publish(PlatformEvent::order_placed(
        order.id,
        &order.order_number,
        order.buyer_id,
        order.total,
    ));

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: OrderDetail {
                order,
                items: order_items,
            },
        }),
    ))
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// GET /api/orders
pub async fn list_orders(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<OrderListParams>,
) -> AppResult<Json<PagedResponse<OrderSummary>>> {
    if let Some(status) = params.status.as_deref() {
        OrderStatus::parse(status)?;
    }
    let (data, total) = OrderRepo::list(
        &state.pool,
        list_scope(&auth),
        params.status.as_deref(),
        clamp_limit(params.limit),
        clamp_offset(params.offset),
    )
    .await?;
    Ok(Json(PagedResponse { data, total }))
}

/// GET /api/orders/{id}
pub async fn get_order(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<OrderDetail>>> {
    let (order, access) = load_visible_order(&state, &auth, id).await?;
    let items = OrderRepo::items(&state.pool, id, access.item_filter()).await?;
    Ok(Json(DataResponse {
        data: OrderDetail { order, items },
    }))
}

/// GET /api/orders/{id}/items
pub async fn list_order_items(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<OrderItem>>>> {
    let (_, access) = load_visible_order(&state, &auth, id).await?;
    let items = OrderRepo::items(&state.pool, id, access.item_filter()).await?;
    Ok(Json(DataResponse { data: items }))
}

// ---------------------------------------------------------------------------
// Status changes
// ---------------------------------------------------------------------------

/// PATCH /api/orders/{id}/status
pub async fn update_status(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<StatusChangeRequest>,
) -> AppResult<Json<DataResponse<Order>>> {
    let order = apply_status_change(&state, &auth, id, input.status).await?;
    Ok(Json(DataResponse { data: order }))
}

/// POST /api/orders/{id}/cancel
pub async fn cancel_order(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Order>>> {
    let order = apply_status_change(&state, &auth, id, OrderStatus::Cancelled).await?;
    Ok(Json(DataResponse { data: order }))
}

/// Move an order to `to`, restocking on cancellation.
///
/// A seller may only drive orders where every line is theirs; orders that
/// span several sellers are handled by an admin.
async fn apply_status_change(
    state: &AppState,
    user: &AuthUser,
    id: DbId,
    to: OrderStatus,
) -> AppResult<Order> {
    let (_, access) = load_visible_order(state, user, id).await?;
    if let OrderAccess::Seller(seller_id) = access {
        let sellers = OrderRepo::seller_ids(&state.pool, id).await?;
        if sellers != [seller_id] {
            return Err(AppError::Core(CoreError::Forbidden(
                "Orders with items from several sellers are updated by an admin".into(),
            )));
        }
    }

    let mut tx = state.pool.begin().await?;
    let current = OrderRepo::find_for_update(&mut tx, id)
        .await?
        .ok_or_else(|| not_found("Order", id))?;
    let from = OrderStatus::parse(&current.status)?;
    check_transition(from, to, access.acting_role())?;

    let order = OrderRepo::update_status(&mut tx, id, to.as_str()).await?;

    if to == OrderStatus::Cancelled {
        let lines: Vec<Restock> = OrderRepo::items_tx(&mut tx, id)
            .await?
            .iter()
            .map(|item| Restock {
                product_id: item.product_id,
                variant_id: item.variant_id,
                quantity: item.quantity,
            })
            .collect();
        restock(&mut tx, &lines).await?;
    }
    tx.commit().await?;

    tracing::info!(
        order_id = id,
        from = from.as_str(),
        to = to.as_str(),
        actor_id = user.user_id,
        "Order status changed"
    );
    state.event_bus.publish(PlatformEvent::order_status_changed(
        order.id,
        &order.order_number,
        order.buyer_id,
        from.as_str(),
        to.as_str(),
        user.user_id,
    ));

    Ok(order)
}
