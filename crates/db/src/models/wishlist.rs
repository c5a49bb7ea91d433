//! Wishlist item model.

use bazaar_core::types::{DbId, Money, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use super::product::serialize_images;

/// A wishlist entry joined with current product details.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WishlistEntry {
    pub id: DbId,
    pub product_id: DbId,
    pub name: String,
    pub price: Money,
    pub mrp: Option<Money>,
    pub stock: i32,
    pub status: String,
    #[serde(serialize_with = "serialize_images")]
    pub images: serde_json::Value,
    pub created_at: Timestamp,
}
