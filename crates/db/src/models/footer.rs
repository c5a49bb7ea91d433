//! Footer content row.

use bazaar_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// The single row of the `footer_content` table.
#[derive(Debug, Clone, FromRow)]
pub struct FooterRow {
    pub content: serde_json::Value,
    pub updated_by: Option<DbId>,
    pub updated_at: Timestamp,
}
