//! Repository for the `sessions` table (refresh-token sessions).

use bazaar_core::types::DbId;
use sqlx::PgPool;

use crate::models::session::{CreateSession, Session};

const COLUMNS: &str = "id, user_id, refresh_token_hash, impersonator_id, expires_at, \
                       revoked_at, user_agent, created_at";

pub struct SessionRepo;

impl SessionRepo {
    pub async fn create(pool: &PgPool, input: &CreateSession) -> Result<Session, sqlx::Error> {
        let query = format!(
            "INSERT INTO sessions (user_id, refresh_token_hash, impersonator_id, expires_at, user_agent)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Session>(&query)
            .bind(input.user_id)
            .bind(&input.refresh_token_hash)
            .bind(input.impersonator_id)
            .bind(input.expires_at)
            .bind(input.user_agent.as_deref())
            .fetch_one(pool)
            .await
    }

    /// Find an unrevoked, unexpired session by refresh token hash.
    pub async fn find_by_refresh_token_hash(
        pool: &PgPool,
        hash: &str,
    ) -> Result<Option<Session>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM sessions
             WHERE refresh_token_hash = $1 AND revoked_at IS NULL AND expires_at > NOW()"
        );
        sqlx::query_as::<_, Session>(&query)
            .bind(hash)
            .fetch_optional(pool)
            .await
    }

    /// Revoke a single session. Returns `false` if it was already revoked,
    /// which callers treat as a concurrent refresh.
    pub async fn revoke(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE sessions SET revoked_at = NOW() WHERE id = $1 AND revoked_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Revoke every active session for a user. Returns how many were revoked.
    pub async fn revoke_all_for_user(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE sessions SET revoked_at = NOW() WHERE user_id = $1 AND revoked_at IS NULL",
        )
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Revoke the impersonation sessions an admin opened.
    pub async fn revoke_impersonations_by(
        pool: &PgPool,
        impersonator_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE sessions SET revoked_at = NOW()
             WHERE impersonator_id = $1 AND revoked_at IS NULL",
        )
        .bind(impersonator_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
