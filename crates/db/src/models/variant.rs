//! Product variant model and DTOs.

use bazaar_core::types::{DbId, Money, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use super::product::serialize_images;

/// A row from the `product_variants` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProductVariant {
    pub id: DbId,
    pub product_id: DbId,
    pub color: Option<String>,
    pub size: Option<String>,
    pub sku: Option<String>,
    pub price: Money,
    pub mrp: Option<Money>,
    pub stock: i32,
    #[serde(serialize_with = "serialize_images")]
    pub images: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Column values for inserting or overwriting a variant.
#[derive(Debug, Clone)]
pub struct VariantValues {
    pub color: Option<String>,
    pub size: Option<String>,
    pub sku: Option<String>,
    pub price: Money,
    pub mrp: Option<Money>,
    pub stock: i32,
    pub images: Vec<String>,
}
