//! Product entity model and DTOs.

use bazaar_core::images::stored_images;
use bazaar_core::types::{DbId, Money, Timestamp};
use serde::{Serialize, Serializer};
use sqlx::FromRow;

/// A row from the `products` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Product {
    pub id: DbId,
    pub seller_id: DbId,
    pub category_id: Option<DbId>,
    pub subcategory_id: Option<DbId>,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub mrp: Option<Money>,
    pub stock: i32,
    #[serde(serialize_with = "serialize_images")]
    pub images: serde_json::Value,
    pub status: String,
    pub review_note: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Product row enriched for listing pages.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProductListItem {
    pub id: DbId,
    pub seller_id: DbId,
    pub seller_name: String,
    pub category_id: Option<DbId>,
    pub category_name: Option<String>,
    pub subcategory_id: Option<DbId>,
    pub name: String,
    pub price: Money,
    pub mrp: Option<Money>,
    pub stock: i32,
    #[serde(serialize_with = "serialize_images")]
    pub images: serde_json::Value,
    pub status: String,
    pub variant_count: i64,
    pub created_at: Timestamp,
}

/// Always emit images as a JSON array of strings, whatever shape is stored.
pub fn serialize_images<S: Serializer>(value: &serde_json::Value, s: S) -> Result<S::Ok, S::Error> {
    stored_images(value).serialize(s)
}

/// DTO for inserting a product. Images must already be normalised.
#[derive(Debug)]
pub struct CreateProduct {
    pub seller_id: DbId,
    pub category_id: Option<DbId>,
    pub subcategory_id: Option<DbId>,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub mrp: Option<Money>,
    pub stock: i32,
    pub images: Vec<String>,
    pub status: String,
}

/// Full replacement of the editable columns, computed by merging a patch
/// onto the stored row so validation sees the final values.
#[derive(Debug)]
pub struct UpdateProduct {
    pub category_id: Option<DbId>,
    pub subcategory_id: Option<DbId>,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub mrp: Option<Money>,
    pub stock: i32,
    pub images: Vec<String>,
    pub status: String,
}

/// Sort orders accepted by the product listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
}

impl ProductSort {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "newest" => Some(ProductSort::Newest),
            "price_asc" => Some(ProductSort::PriceAsc),
            "price_desc" => Some(ProductSort::PriceDesc),
            _ => None,
        }
    }

    pub(crate) fn order_by(self) -> &'static str {
        match self {
            ProductSort::Newest => "p.created_at DESC, p.id DESC",
            ProductSort::PriceAsc => "p.price ASC, p.id ASC",
            ProductSort::PriceDesc => "p.price DESC, p.id DESC",
        }
    }
}

/// Resolved listing filter. Visibility has already been decided by the caller.
#[derive(Debug, Default)]
pub struct ProductQuery {
    pub category_id: Option<DbId>,
    pub subcategory_id: Option<DbId>,
    pub seller_id: Option<DbId>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    pub sort: ProductSort,
    pub limit: i64,
    pub offset: i64,
}
