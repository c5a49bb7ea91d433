//! Handlers for the `/products` resource.
//!
//! Shoppers only ever see approved products. Sellers manage their own
//! catalogue and send products through review; admins moderate.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use bazaar_core::error::CoreError;
use bazaar_core::images::normalize_images;
use bazaar_core::product::{
    discount_percent, review, status_after_seller_edit, submit_for_review, validate_product,
    ProductFields, ProductStatus,
};
use bazaar_core::roles::Role;
use bazaar_core::types::{DbId, Money};
use bazaar_core::variants::{validate_variants, VariantInput};
use bazaar_db::models::product::{
    CreateProduct, Product, ProductListItem, ProductQuery, ProductSort, UpdateProduct,
};
use bazaar_db::models::variant::{ProductVariant, VariantValues};
use bazaar_db::repositories::{CategoryRepo, ProductRepo, VariantRepo};
use bazaar_db::{clamp_limit, clamp_offset};
use bazaar_events::PlatformEvent;
use serde::{Deserialize, Serialize};

use crate::error::{not_found, AppError, AppResult};
use crate::middleware::auth::{AuthUser, MaybeAuthUser};
use crate::middleware::rbac::{RequireAdmin, RequireSeller};
use crate::query::double_option;
use crate::response::{DataResponse, PagedResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /products`.
#[derive(Debug, Default, Deserialize)]
pub struct ProductListParams {
    pub category_id: Option<DbId>,
    pub subcategory_id: Option<DbId>,
    pub seller_id: Option<DbId>,
    pub q: Option<String>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    pub status: Option<String>,
    pub mine: Option<bool>,
    pub sort: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Request body for `POST /products`.
#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: String,
    pub price: Money,
    pub mrp: Option<Money>,
    #[serde(default)]
    pub stock: i32,
    pub category_id: Option<DbId>,
    pub subcategory_id: Option<DbId>,
    #[serde(default)]
    pub images: serde_json::Value,
    /// Send straight to review instead of saving a draft.
    #[serde(default)]
    pub submit: bool,
    #[serde(default)]
    pub variants: Vec<VariantInput>,
}

/// Request body for `PUT /products/{id}`. Absent fields keep their value;
/// nullable fields accept an explicit `null` to clear them.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    #[serde(default, deserialize_with = "double_option")]
    pub mrp: Option<Option<Money>>,
    pub stock: Option<i32>,
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<DbId>>,
    #[serde(default, deserialize_with = "double_option")]
    pub subcategory_id: Option<Option<DbId>>,
    pub images: Option<serde_json::Value>,
}

/// Request body for `POST /products/{id}/review`.
#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub approve: bool,
    pub note: Option<String>,
}

/// A product with its variants, as returned by the detail endpoints.
#[derive(Debug, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub discount_percent: i32,
    pub variants: Vec<ProductVariant>,
}

impl ProductDetail {
    fn new(product: Product, variants: Vec<ProductVariant>) -> Self {
        Self {
            discount_percent: discount_percent(product.price, product.mrp),
            product,
            variants,
        }
    }
}

// ---------------------------------------------------------------------------
// Visibility
// ---------------------------------------------------------------------------

/// Resolve which sellers and statuses a caller may list.
///
/// Anonymous callers and buyers only see approved products. A seller may
/// filter their own catalogue by status (`mine=true` or their own
/// `seller_id`); admins may filter any status.
pub(crate) fn resolve_listing_scope(
    caller: Option<&AuthUser>,
    params: &ProductListParams,
) -> Result<(Option<DbId>, Option<String>), CoreError> {
    if let Some(status) = params.status.as_deref() {
        ProductStatus::parse(status)?;
    }

    let mut seller_id = params.seller_id;
    if params.mine == Some(true) {
        match caller {
            Some(user) if matches!(user.role, Role::Seller | Role::Admin) => {
                seller_id = Some(user.user_id)
            }
            Some(_) => {
                return Err(CoreError::Forbidden(
                    "Only sellers have their own catalogue".into(),
                ))
            }
            None => return Err(CoreError::Unauthorized("Authentication required".into())),
        }
    }

    let privileged = match caller {
        Some(user) if user.is_admin() => true,
        Some(user) if user.role == Role::Seller => seller_id == Some(user.user_id),
        _ => false,
    };

    let status = if privileged {
        params.status.clone()
    } else {
        Some(ProductStatus::Approved.as_str().to_string())
    };
    Ok((seller_id, status))
}

/// Whether `caller` may see a product in `status` owned by `seller_id`.
pub(crate) fn can_view(
    caller: Option<&AuthUser>,
    seller_id: DbId,
    status: ProductStatus,
) -> bool {
    status.is_public() || caller.is_some_and(|u| u.is_admin() || u.user_id == seller_id)
}

/// Load a product the caller may modify: its owner or an admin.
pub(crate) async fn load_owned_product(
    state: &AppState,
    user: &AuthUser,
    product_id: DbId,
) -> AppResult<Product> {
    let product = ProductRepo::find_by_id(&state.pool, product_id)
        .await?
        .ok_or_else(|| not_found("Product", product_id))?;
    if product.seller_id != user.user_id && !user.is_admin() {
        return Err(AppError::Core(CoreError::Forbidden(
            "You can only manage your own products".into(),
        )));
    }
    Ok(product)
}

/// Check that the subcategory (if any) belongs to the category, filling the
/// category in from the subcategory when only the latter is given.
async fn resolve_category(
    state: &AppState,
    category_id: Option<DbId>,
    subcategory_id: Option<DbId>,
) -> AppResult<(Option<DbId>, Option<DbId>)> {
    let Some(sub_id) = subcategory_id else {
        if let Some(cat_id) = category_id {
            CategoryRepo::find_by_id(&state.pool, cat_id)
                .await?
                .ok_or_else(|| not_found("Category", cat_id))?;
        }
        return Ok((category_id, None));
    };

    let sub = CategoryRepo::find_subcategory(&state.pool, sub_id)
        .await?
        .ok_or_else(|| not_found("Subcategory", sub_id))?;
    match category_id {
        Some(cat_id) if cat_id != sub.category_id => Err(AppError::Core(CoreError::Validation(
            "subcategory_id: does not belong to the selected category".into(),
        ))),
        _ => Ok((Some(sub.category_id), Some(sub_id))),
    }
}

pub(crate) fn variant_values(
    input: &VariantInput,
    public_base: &str,
) -> Result<VariantValues, CoreError> {
    let clean = |s: &Option<String>| {
        s.as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    Ok(VariantValues {
        color: clean(&input.color),
        size: clean(&input.size),
        sku: clean(&input.sku),
        price: input.price,
        mrp: input.mrp,
        stock: input.stock,
        images: normalize_images(&input.images, public_base)?,
    })
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/products
pub async fn list_products(
    MaybeAuthUser(caller): MaybeAuthUser,
    State(state): State<AppState>,
    Query(params): Query<ProductListParams>,
) -> AppResult<Json<PagedResponse<ProductListItem>>> {
    let (seller_id, status) = resolve_listing_scope(caller.as_ref(), &params)?;

    let sort = match params.sort.as_deref() {
        None => ProductSort::default(),
        Some(s) => ProductSort::parse(s).ok_or_else(|| {
            AppError::Core(CoreError::Validation(format!(
                "sort: unknown value '{s}' (expected newest, price_asc, price_desc)"
            )))
        })?,
    };

    let query = ProductQuery {
        category_id: params.category_id,
        subcategory_id: params.subcategory_id,
        seller_id,
        status,
        search: params
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_string),
        min_price: params.min_price,
        max_price: params.max_price,
        sort,
        limit: clamp_limit(params.limit),
        offset: clamp_offset(params.offset),
    };

    let (data, total) = ProductRepo::list(&state.pool, &query).await?;
    Ok(Json(PagedResponse { data, total }))
}

/// GET /api/products/{id}
///
/// Products that are not approved are reported as missing to everyone but
/// their owner and admins.
pub async fn get_product(
    MaybeAuthUser(caller): MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ProductDetail>>> {
    let product = ProductRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found("Product", id))?;

    let status = ProductStatus::parse(&product.status)?;
    if !can_view(caller.as_ref(), product.seller_id, status) {
        return Err(not_found("Product", id));
    }

    let variants = VariantRepo::list_by_product(&state.pool, id).await?;
    Ok(Json(DataResponse {
        data: ProductDetail::new(product, variants),
    }))
}

/// POST /api/products
///
/// Creates the product and any variants in one transaction.
pub async fn create_product(
    RequireSeller(user): RequireSeller,
    State(state): State<AppState>,
    Json(input): Json<CreateProductRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<ProductDetail>>)> {
    validate_product(&ProductFields {
        name: &input.name,
        description: &input.description,
        price: input.price,
        mrp: input.mrp,
        stock: input.stock,
    })?;
    validate_variants(&input.variants)?;

    let base = &state.config.public_base_url;
    let images = normalize_images(&input.images, base)?;
    let variant_rows = input
        .variants
        .iter()
        .map(|v| variant_values(v, base))
        .collect::<Result<Vec<_>, _>>()?;
    let (category_id, subcategory_id) =
        resolve_category(&state, input.category_id, input.subcategory_id).await?;

    let status = if input.submit {
        ProductStatus::Pending
    } else {
        ProductStatus::Draft
    };

    let mut tx = state.pool.begin().await?;
    let mut product = ProductRepo::create(
        &mut tx,
        &CreateProduct {
            seller_id: user.user_id,
            category_id,
            subcategory_id,
            name: input.name.trim().to_string(),
            description: input.description.trim().to_string(),
            price: input.price,
            mrp: input.mrp,
            stock: input.stock,
            images,
            status: status.as_str().to_string(),
        },
    )
    .await?;

    let mut variants = Vec::with_capacity(variant_rows.len());
    for values in &variant_rows {
        variants.push(VariantRepo::create(&mut tx, product.id, values).await?);
    }
    if !variants.is_empty() {
        product.stock = ProductRepo::sync_stock_from_variants(&mut tx, product.id).await?;
    }
    tx.commit().await?;

    tracing::info!(
        product_id = product.id,
        seller_id = user.user_id,
        variants = variants.len(),
        status = status.as_str(),
        "Product created"
    );
    if status == ProductStatus::Pending {
        state.event_bus.publish(PlatformEvent::product_submitted(
            product.id,
            &product.name,
            product.seller_id,
        ));
    }

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: ProductDetail::new(product, variants),
        }),
    ))
}

/// PUT /api/products/{id}
///
/// Partial update validated against the merged result. When the owner
/// changes what shoppers see on an approved product it returns to review.
pub async fn update_product(
    RequireSeller(user): RequireSeller,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateProductRequest>,
) -> AppResult<Json<DataResponse<ProductDetail>>> {
    load_owned_product(&state, &user, id).await?;

    let mut tx = state.pool.begin().await?;
    let current = ProductRepo::find_for_update(&mut tx, id)
        .await?
        .ok_or_else(|| not_found("Product", id))?;
    let variants = VariantRepo::list_by_product_tx(&mut tx, id).await?;

    if input.stock.is_some_and(|s| s != current.stock) && !variants.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "stock: is the sum of variant stock for products with variants".into(),
        )));
    }

    let images = match &input.images {
        Some(value) => normalize_images(value, &state.config.public_base_url)?,
        None => bazaar_core::images::stored_images(&current.images),
    };
    let (category_id, subcategory_id) = match (input.category_id, input.subcategory_id) {
        (None, None) => (current.category_id, current.subcategory_id),
        (cat, sub) => {
            let cat = cat.unwrap_or(current.category_id);
            // Moving to another category drops a subcategory that was not resent.
            let sub = sub.unwrap_or(if cat == current.category_id {
                current.subcategory_id
            } else {
                None
            });
            resolve_category(&state, cat, sub).await?
        }
    };

    let merged = UpdateProduct {
        category_id,
        subcategory_id,
        name: input
            .name
            .map(|n| n.trim().to_string())
            .unwrap_or_else(|| current.name.clone()),
        description: input
            .description
            .map(|d| d.trim().to_string())
            .unwrap_or_else(|| current.description.clone()),
        price: input.price.unwrap_or(current.price),
        mrp: input.mrp.unwrap_or(current.mrp),
        stock: input.stock.unwrap_or(current.stock),
        images,
        status: current.status.clone(),
    };

    validate_product(&ProductFields {
        name: &merged.name,
        description: &merged.description,
        price: merged.price,
        mrp: merged.mrp,
        stock: merged.stock,
    })?;

    let visible_change = merged.name != current.name
        || merged.description != current.description
        || merged.price != current.price
        || merged.mrp != current.mrp
        || merged.images != bazaar_core::images::stored_images(&current.images);

    let current_status = ProductStatus::parse(&current.status)?;
    let status = if user.is_admin() {
        current_status
    } else {
        status_after_seller_edit(current_status, visible_change)
    };
    let merged = UpdateProduct {
        status: status.as_str().to_string(),
        ..merged
    };

    let product = ProductRepo::update(&mut tx, id, &merged)
        .await?
        .ok_or_else(|| not_found("Product", id))?;
    tx.commit().await?;

    if status != current_status {
        tracing::info!(product_id = id, "Approved product edited, returned to review");
        state.event_bus.publish(PlatformEvent::product_submitted(
            product.id,
            &product.name,
            product.seller_id,
        ));
    }

    Ok(Json(DataResponse {
        data: ProductDetail::new(product, variants),
    }))
}

/// DELETE /api/products/{id}
///
/// Refused while an in-flight order references the product.
pub async fn delete_product(
    RequireSeller(user): RequireSeller,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    load_owned_product(&state, &user, id).await?;

    let open = ProductRepo::count_open_order_refs(&state.pool, id).await?;
    if open > 0 {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Product is part of {open} open order line(s) and cannot be deleted"
        ))));
    }

    if !ProductRepo::delete(&state.pool, id).await? {
        return Err(not_found("Product", id));
    }
    tracing::info!(product_id = id, user_id = user.user_id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/products/{id}/submit
pub async fn submit_product(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Product>>> {
    let product = ProductRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found("Product", id))?;
    if product.seller_id != auth.user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the product's seller can submit it for review".into(),
        )));
    }

    let next = submit_for_review(ProductStatus::parse(&product.status)?)?;
    let product = ProductRepo::set_status(&state.pool, id, next.as_str(), None)
        .await?
        .ok_or_else(|| not_found("Product", id))?;

    state.event_bus.publish(PlatformEvent::product_submitted(
        product.id,
        &product.name,
        product.seller_id,
    ));
    Ok(Json(DataResponse { data: product }))
}

/// POST /api/products/{id}/review
pub async fn review_product(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ReviewRequest>,
) -> AppResult<Json<DataResponse<Product>>> {
    let product = ProductRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found("Product", id))?;

    let next = review(ProductStatus::parse(&product.status)?, input.approve)?;
    let note = input.note.as_deref().map(str::trim).filter(|n| !n.is_empty());
    if next == ProductStatus::Rejected && note.is_none() {
        return Err(AppError::Core(CoreError::Validation(
            "note: a reason is required when rejecting".into(),
        )));
    }

    let product = ProductRepo::set_status(&state.pool, id, next.as_str(), note)
        .await?
        .ok_or_else(|| not_found("Product", id))?;

    tracing::info!(
        product_id = id,
        admin_id = admin.user_id,
        status = next.as_str(),
        "Product reviewed"
    );
    state.event_bus.publish(PlatformEvent::product_reviewed(
        product.id,
        &product.name,
        product.seller_id,
        next.as_str(),
        note,
        admin.user_id,
    ));
    Ok(Json(DataResponse { data: product }))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn user(id: DbId, role: Role) -> AuthUser {
        AuthUser {
            user_id: id,
            role,
            impersonator_id: None,
        }
    }

    #[test]
    fn anonymous_sees_only_approved() {
        let params = ProductListParams {
            status: Some("draft".into()),
            ..Default::default()
        };
        let (seller, status) = resolve_listing_scope(None, &params).unwrap();
        assert_eq!(seller, None);
        assert_eq!(status.as_deref(), Some("approved"));
    }

    #[test]
    fn seller_mine_lists_every_status() {
        let params = ProductListParams {
            mine: Some(true),
            ..Default::default()
        };
        let (seller, status) = resolve_listing_scope(Some(&user(5, Role::Seller)), &params).unwrap();
        assert_eq!(seller, Some(5));
        assert_eq!(status, None);
    }

    #[test]
    fn seller_browsing_another_seller_sees_approved() {
        let params = ProductListParams {
            seller_id: Some(9),
            status: Some("pending".into()),
            ..Default::default()
        };
        let (_, status) = resolve_listing_scope(Some(&user(5, Role::Seller)), &params).unwrap();
        assert_eq!(status.as_deref(), Some("approved"));
    }

    #[test]
    fn admin_may_filter_any_status() {
        let params = ProductListParams {
            status: Some("pending".into()),
            ..Default::default()
        };
        let (_, status) = resolve_listing_scope(Some(&user(1, Role::Admin)), &params).unwrap();
        assert_eq!(status.as_deref(), Some("pending"));
    }

    #[test]
    fn buyer_mine_and_unknown_status_rejected() {
        let mine = ProductListParams {
            mine: Some(true),
            ..Default::default()
        };
        assert_matches!(
            resolve_listing_scope(Some(&user(2, Role::Buyer)), &mine),
            Err(CoreError::Forbidden(_))
        );
        assert_matches!(resolve_listing_scope(None, &mine), Err(CoreError::Unauthorized(_)));

        let bad = ProductListParams {
            status: Some("archived".into()),
            ..Default::default()
        };
        assert_matches!(resolve_listing_scope(None, &bad), Err(CoreError::Validation(_)));
    }

    #[test]
    fn hidden_products_visible_to_owner_and_admin() {
        assert!(can_view(None, 3, ProductStatus::Approved));
        assert!(!can_view(None, 3, ProductStatus::Draft));
        assert!(can_view(Some(&user(3, Role::Seller)), 3, ProductStatus::Rejected));
        assert!(!can_view(Some(&user(4, Role::Seller)), 3, ProductStatus::Pending));
        assert!(can_view(Some(&user(1, Role::Admin)), 3, ProductStatus::Draft));
    }
}
