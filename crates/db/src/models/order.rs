//! Order and order item models.

use bazaar_core::types::{DbId, Money, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `orders` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Order {
    pub id: DbId,
    pub order_number: String,
    pub buyer_id: DbId,
    pub status: String,
    pub payment_method: String,
    pub shipping_address: serde_json::Value,
    pub subtotal: Money,
    pub shipping_fee: Money,
    pub total: Money,
    pub delivered_at: Option<Timestamp>,
    pub cancelled_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Order row with a line count, for list pages.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OrderSummary {
    pub id: DbId,
    pub order_number: String,
    pub buyer_id: DbId,
    pub buyer_name: String,
    pub status: String,
    pub payment_method: String,
    pub total: Money,
    pub item_count: i64,
    pub created_at: Timestamp,
}

/// A row from the `order_items` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OrderItem {
    pub id: DbId,
    pub order_id: DbId,
    /// `None` once the product has been deleted.
    pub product_id: Option<DbId>,
    pub variant_id: Option<DbId>,
    pub seller_id: DbId,
    pub product_name: String,
    pub variant_label: Option<String>,
    pub image: Option<String>,
    pub unit_price: Money,
    pub quantity: i32,
    pub line_total: Money,
    pub created_at: Timestamp,
}

/// DTO for the order header written at checkout.
#[derive(Debug)]
pub struct CreateOrder {
    pub buyer_id: DbId,
    pub payment_method: String,
    pub shipping_address: serde_json::Value,
    pub subtotal: Money,
    pub shipping_fee: Money,
    pub total: Money,
}

/// DTO for one snapshotted order line.
#[derive(Debug, Clone)]
pub struct CreateOrderItem {
    pub product_id: DbId,
    pub variant_id: Option<DbId>,
    pub seller_id: DbId,
    pub product_name: String,
    pub variant_label: Option<String>,
    pub image: Option<String>,
    pub unit_price: Money,
    pub quantity: i32,
}

/// Whose orders a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderScope {
    /// Orders placed by this buyer.
    Buyer(DbId),
    /// Orders this seller placed as a buyer, plus orders containing at least
    /// one item they sell.
    Seller(DbId),
    All,
}

/// Query parameters for order listing.
#[derive(Debug, Default, Deserialize)]
pub struct OrderListParams {
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
