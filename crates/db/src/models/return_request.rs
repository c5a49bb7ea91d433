//! Return request model.

use bazaar_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `return_requests` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReturnRequest {
    pub id: DbId,
    pub order_item_id: DbId,
    pub buyer_id: DbId,
    pub quantity: i32,
    pub reason: String,
    pub status: String,
    pub decision_note: Option<String>,
    pub decided_by: Option<DbId>,
    pub decided_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Return request joined with the item and order it refers to.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReturnWithItem {
    pub id: DbId,
    pub order_item_id: DbId,
    pub order_id: DbId,
    pub order_number: String,
    pub buyer_id: DbId,
    pub seller_id: DbId,
    pub product_id: Option<DbId>,
    pub variant_id: Option<DbId>,
    pub product_name: String,
    pub quantity: i32,
    pub reason: String,
    pub status: String,
    pub decision_note: Option<String>,
    pub decided_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

#[derive(Debug)]
pub struct CreateReturnRequest {
    pub order_item_id: DbId,
    pub buyer_id: DbId,
    pub quantity: i32,
    pub reason: String,
}
