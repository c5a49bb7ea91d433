//! Notification entity models and DTOs.

use bazaar_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `notifications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: DbId,
    pub user_id: DbId,
    pub event_type: String,
    pub title: String,
    pub message: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<DbId>,
    pub is_read: bool,
    pub read_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// DTO for creating a notification.
#[derive(Debug, Clone)]
pub struct CreateNotification {
    pub user_id: DbId,
    pub event_type: String,
    pub title: String,
    pub message: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<DbId>,
}
