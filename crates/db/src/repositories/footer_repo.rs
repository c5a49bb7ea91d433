//! Repository for the single-row `footer_content` table.

use bazaar_core::types::DbId;
use sqlx::PgPool;

use crate::models::footer::FooterRow;

pub struct FooterRepo;

impl FooterRepo {
    /// The stored footer, or `None` if an admin has never saved one.
    pub async fn get(pool: &PgPool) -> Result<Option<FooterRow>, sqlx::Error> {
        sqlx::query_as::<_, FooterRow>(
            "SELECT content, updated_by, updated_at FROM footer_content WHERE id = 1",
        )
        .fetch_optional(pool)
        .await
    }

    /// Replace the footer content wholesale.
    pub async fn upsert(
        pool: &PgPool,
        content: &serde_json::Value,
        updated_by: DbId,
    ) -> Result<FooterRow, sqlx::Error> {
        sqlx::query_as::<_, FooterRow>(
            "INSERT INTO footer_content (id, content, updated_by, updated_at)
             VALUES (1, $1, $2, NOW())
             ON CONFLICT (id) DO UPDATE
                SET content = EXCLUDED.content,
                    updated_by = EXCLUDED.updated_by,
                    updated_at = NOW()
             RETURNING content, updated_by, updated_at",
        )
        .bind(content)
        .bind(updated_by)
        .fetch_one(pool)
        .await
    }
}
