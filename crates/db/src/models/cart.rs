//! Cart item model.

use bazaar_core::types::{DbId, Money, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `cart_items` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CartItem {
    pub id: DbId,
    pub user_id: DbId,
    pub product_id: DbId,
    pub variant_id: Option<DbId>,
    pub quantity: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Cart line joined with the product and variant it points at.
///
/// `unit_price`, `unit_mrp`, and `available_stock` come from the variant when
/// one is selected, otherwise from the product.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CartLineRow {
    pub id: DbId,
    pub product_id: DbId,
    pub variant_id: Option<DbId>,
    pub quantity: i32,
    pub product_name: String,
    pub product_status: String,
    pub seller_id: DbId,
    pub color: Option<String>,
    pub size: Option<String>,
    pub unit_price: Money,
    pub unit_mrp: Option<Money>,
    pub available_stock: i32,
    #[serde(skip)]
    pub product_images: serde_json::Value,
    #[serde(skip)]
    pub variant_images: Option<serde_json::Value>,
}
