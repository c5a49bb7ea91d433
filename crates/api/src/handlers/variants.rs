//! Handlers for `/products/{id}/variants`.
//!
//! The edit form saves the whole variant list at once; the response maps the
//! form's placeholder ids to the ids that were created.

use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use bazaar_core::product::ProductStatus;
use bazaar_core::types::DbId;
use bazaar_core::variants::{plan_variant_sync, validate_variants, VariantInput};
use bazaar_db::models::variant::ProductVariant;
use bazaar_db::repositories::{ProductRepo, VariantRepo};
use serde::{Deserialize, Serialize};

use super::products::{can_view, load_owned_product, variant_values};
use crate::error::{not_found, AppResult};
use crate::middleware::auth::MaybeAuthUser;
use crate::middleware::rbac::RequireSeller;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `PUT /products/{id}/variants`.
#[derive(Debug, Deserialize)]
pub struct SyncVariantsRequest {
    pub variants: Vec<VariantInput>,
}

/// Result of a variant sync.
#[derive(Debug, Serialize)]
pub struct SyncVariantsResponse {
    pub variants: Vec<ProductVariant>,
    /// Placeholder id (as sent, stringified) to created id. Rows sent
    /// without an id are keyed by their list index as `"#<index>"`.
    pub id_map: BTreeMap<String, DbId>,
    /// Product stock after the sync.
    pub stock: i32,
}

/// GET /api/products/{id}/variants
///
/// Same visibility as the product itself.
pub async fn list_variants(
    MaybeAuthUser(caller): MaybeAuthUser,
    State(state): State<AppState>,
    Path(product_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<ProductVariant>>>> {
    let product = ProductRepo::find_by_id(&state.pool, product_id)
        .await?
        .ok_or_else(|| not_found("Product", product_id))?;
    let status = ProductStatus::parse(&product.status)?;
    if !can_view(caller.as_ref(), product.seller_id, status) {
        return Err(not_found("Product", product_id));
    }
    let variants = VariantRepo::list_by_product(&state.pool, product.id).await?;
    Ok(Json(DataResponse { data: variants }))
}

/// PUT /api/products/{id}/variants
///
/// Replace the product's variant list: rows with a stored id are updated,
/// new rows created, and stored rows missing from the list deleted. Product
/// stock is recomputed from the result.
pub async fn sync_variants(
    RequireSeller(user): RequireSeller,
    State(state): State<AppState>,
    Path(product_id): Path<DbId>,
    Json(input): Json<SyncVariantsRequest>,
) -> AppResult<Json<DataResponse<SyncVariantsResponse>>> {
    load_owned_product(&state, &user, product_id).await?;
    validate_variants(&input.variants)?;

    let values = input
        .variants
        .iter()
        .map(|v| variant_values(v, &state.config.public_base_url))
        .collect::<Result<Vec<_>, _>>()?;

    let mut tx = state.pool.begin().await?;
    ProductRepo::find_for_update(&mut tx, product_id)
        .await?
        .ok_or_else(|| not_found("Product", product_id))?;
    let existing = VariantRepo::lock_ids_for_product(&mut tx, product_id).await?;
    let plan = plan_variant_sync(&existing, &input.variants)?;

    // Deletes first so a recreated SKU does not collide with the row it replaces.
    VariantRepo::delete_many(&mut tx, product_id, &plan.delete).await?;
    for (id, idx) in &plan.update {
        VariantRepo::update(&mut tx, *id, &values[*idx]).await?;
    }
    let mut id_map = BTreeMap::new();
    for idx in &plan.create {
        let created = VariantRepo::create(&mut tx, product_id, &values[*idx]).await?;
        let key = match input.variants[*idx].id {
            Some(placeholder) => placeholder.to_string(),
            None => format!("#{idx}"),
        };
        id_map.insert(key, created.id);
    }

    let stock = if existing.is_empty() && input.variants.is_empty() {
        // Never had variants: the product's own stock stands.
        ProductRepo::find_for_update(&mut tx, product_id)
            .await?
            .map(|p| p.stock)
            .unwrap_or_default()
    } else {
        // Removing the last variant leaves the product out of stock until
        // the seller sets a stock figure again.
        ProductRepo::sync_stock_from_variants(&mut tx, product_id).await?
    };
    let variants = VariantRepo::list_by_product_tx(&mut tx, product_id).await?;
    tx.commit().await?;

    tracing::info!(
        product_id,
        created = plan.create.len(),
        updated = plan.update.len(),
        deleted = plan.delete.len(),
        "Variants synced"
    );

    Ok(Json(DataResponse {
        data: SyncVariantsResponse {
            variants,
            id_map,
            stock,
        },
    }))
}

/// DELETE /api/products/{id}/variants/{variant_id}
pub async fn delete_variant(
    RequireSeller(user): RequireSeller,
    State(state): State<AppState>,
    Path((product_id, variant_id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    load_owned_product(&state, &user, product_id).await?;

    let mut tx = state.pool.begin().await?;
    VariantRepo::find_for_update(&mut tx, product_id, variant_id)
        .await?
        .ok_or_else(|| not_found("ProductVariant", variant_id))?;
    VariantRepo::delete_many(&mut tx, product_id, &[variant_id]).await?;
    // Zero once the last variant is gone.
    let stock = ProductRepo::sync_stock_from_variants(&mut tx, product_id).await?;
    tx.commit().await?;

    tracing::info!(product_id, variant_id, stock, "Variant deleted");

    Ok(StatusCode::NO_CONTENT)
}
