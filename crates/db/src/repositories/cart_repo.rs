//! Repository for the `cart_items` table.

use bazaar_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::cart::{CartItem, CartLineRow};

const COLUMNS: &str = "id, user_id, product_id, variant_id, quantity, created_at, updated_at";

/// Cart lines joined with live product / variant data. `$1` is the user id.
const LINE_SELECT: &str = "\
    SELECT ci.id, ci.product_id, ci.variant_id, ci.quantity,
           p.name AS product_name, p.status AS product_status, p.seller_id,
           v.color, v.size,
           COALESCE(v.price, p.price) AS unit_price,
           CASE WHEN v.id IS NULL THEN p.mrp ELSE v.mrp END AS unit_mrp,
           COALESCE(v.stock, p.stock) AS available_stock,
           p.images AS product_images,
           v.images AS variant_images
    FROM cart_items ci
    JOIN products p ON p.id = ci.product_id
    LEFT JOIN product_variants v ON v.id = ci.variant_id
    WHERE ci.user_id = $1";

pub struct CartRepo;

impl CartRepo {
    pub async fn list_lines(pool: &PgPool, user_id: DbId) -> Result<Vec<CartLineRow>, sqlx::Error> {
        let query = format!("{LINE_SELECT} ORDER BY ci.id");
        sqlx::query_as::<_, CartLineRow>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Cart lines read inside the checkout transaction.
    pub async fn list_lines_tx(
        conn: &mut PgConnection,
        user_id: DbId,
    ) -> Result<Vec<CartLineRow>, sqlx::Error> {
        let query = format!("{LINE_SELECT} ORDER BY ci.id");
        sqlx::query_as::<_, CartLineRow>(&query)
            .bind(user_id)
            .fetch_all(conn)
            .await
    }

    /// One line of the user's cart, with live pricing.
    pub async fn find_line(
        pool: &PgPool,
        user_id: DbId,
        item_id: DbId,
    ) -> Result<Option<CartLineRow>, sqlx::Error> {
        let query = format!("{LINE_SELECT} AND ci.id = $2");
        sqlx::query_as::<_, CartLineRow>(&query)
            .bind(user_id)
            .bind(item_id)
            .fetch_optional(pool)
            .await
    }

    /// Existing line for the same product / variant pair, if any.
    pub async fn find_by_product(
        pool: &PgPool,
        user_id: DbId,
        product_id: DbId,
        variant_id: Option<DbId>,
    ) -> Result<Option<CartItem>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM cart_items
             WHERE user_id = $1 AND product_id = $2 AND variant_id IS NOT DISTINCT FROM $3"
        );
        sqlx::query_as::<_, CartItem>(&query)
            .bind(user_id)
            .bind(product_id)
            .bind(variant_id)
            .fetch_optional(pool)
            .await
    }

    /// Insert a line, or set the quantity of the existing line for the same pair.
    pub async fn upsert(
        pool: &PgPool,
        user_id: DbId,
        product_id: DbId,
        variant_id: Option<DbId>,
        quantity: i32,
    ) -> Result<CartItem, sqlx::Error> {
        let query = format!(
            "INSERT INTO cart_items (user_id, product_id, variant_id, quantity)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (user_id, product_id, (COALESCE(variant_id, 0)))
             DO UPDATE SET quantity = EXCLUDED.quantity
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CartItem>(&query)
            .bind(user_id)
            .bind(product_id)
            .bind(variant_id)
            .bind(quantity)
            .fetch_one(pool)
            .await
    }

    pub async fn update_quantity(
        pool: &PgPool,
        user_id: DbId,
        item_id: DbId,
        quantity: i32,
    ) -> Result<Option<CartItem>, sqlx::Error> {
        let query = format!(
            "UPDATE cart_items SET quantity = $3 WHERE id = $1 AND user_id = $2 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CartItem>(&query)
            .bind(item_id)
            .bind(user_id)
            .bind(quantity)
            .fetch_optional(pool)
            .await
    }

    pub async fn remove(pool: &PgPool, user_id: DbId, item_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND user_id = $2")
            .bind(item_id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Empty the cart. Returns the number of lines removed.
    pub async fn clear(conn: &mut PgConnection, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user_id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected())
    }
}
