//! Repository for the `wishlist_items` table.

use bazaar_core::types::DbId;
use sqlx::PgPool;

use crate::models::wishlist::WishlistEntry;

pub struct WishlistRepo;

impl WishlistRepo {
    /// The user's wishlist with current product data, newest first.
    pub async fn list(pool: &PgPool, user_id: DbId) -> Result<Vec<WishlistEntry>, sqlx::Error> {
        sqlx::query_as::<_, WishlistEntry>(
            "SELECT w.id, w.product_id, p.name, p.price, p.mrp, p.stock, p.status, p.images,
                    w.created_at
             FROM wishlist_items w
             JOIN products p ON p.id = w.product_id
             WHERE w.user_id = $1
             ORDER BY w.created_at DESC, w.id DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Add a product. Returns `false` when it was already on the list.
    pub async fn add(pool: &PgPool, user_id: DbId, product_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO wishlist_items (user_id, product_id) VALUES ($1, $2)
             ON CONFLICT ON CONSTRAINT uq_wishlist_items_user_product DO NOTHING",
        )
        .bind(user_id)
        .bind(product_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn contains(
        pool: &PgPool,
        user_id: DbId,
        product_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM wishlist_items WHERE user_id = $1 AND product_id = $2)",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_one(pool)
        .await
    }

    pub async fn remove(
        pool: &PgPool,
        user_id: DbId,
        product_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM wishlist_items WHERE user_id = $1 AND product_id = $2")
                .bind(user_id)
                .bind(product_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
