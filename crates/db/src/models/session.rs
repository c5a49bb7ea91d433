//! Refresh-token session model.

use bazaar_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `sessions` table.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: DbId,
    pub user_id: DbId,
    pub refresh_token_hash: String,
    /// Admin who started this session by impersonating `user_id`.
    pub impersonator_id: Option<DbId>,
    pub expires_at: Timestamp,
    pub revoked_at: Option<Timestamp>,
    pub user_agent: Option<String>,
    pub created_at: Timestamp,
}

/// DTO for creating a session.
#[derive(Debug)]
pub struct CreateSession {
    pub user_id: DbId,
    pub refresh_token_hash: String,
    pub impersonator_id: Option<DbId>,
    pub expires_at: Timestamp,
    pub user_agent: Option<String>,
}
