//! Repository for the `product_variants` table.
//!
//! Writes take `&mut PgConnection` so the whole-list sync can run in one
//! transaction alongside the product row lock.

use bazaar_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::variant::{ProductVariant, VariantValues};

const COLUMNS: &str =
    "id, product_id, color, size, sku, price, mrp, stock, images, created_at, updated_at";

pub struct VariantRepo;

impl VariantRepo {
    /// All variants of a product, oldest first.
    pub async fn list_by_product(
        pool: &PgPool,
        product_id: DbId,
    ) -> Result<Vec<ProductVariant>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM product_variants WHERE product_id = $1 ORDER BY id"
        );
        sqlx::query_as::<_, ProductVariant>(&query)
            .bind(product_id)
            .fetch_all(pool)
            .await
    }

    /// Same as [`list_by_product`](Self::list_by_product) but on the caller's transaction.
    pub async fn list_by_product_tx(
        conn: &mut PgConnection,
        product_id: DbId,
    ) -> Result<Vec<ProductVariant>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM product_variants WHERE product_id = $1 ORDER BY id"
        );
        sqlx::query_as::<_, ProductVariant>(&query)
            .bind(product_id)
            .fetch_all(conn)
            .await
    }

    /// Ids of a product's variants, locking the rows.
    pub async fn lock_ids_for_product(
        conn: &mut PgConnection,
        product_id: DbId,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT id FROM product_variants WHERE product_id = $1 ORDER BY id FOR UPDATE",
        )
        .bind(product_id)
        .fetch_all(conn)
        .await
    }

    pub async fn count_for_product(pool: &PgPool, product_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM product_variants WHERE product_id = $1")
            .bind(product_id)
            .fetch_one(pool)
            .await
    }

    /// Find a variant, scoped to its product.
    pub async fn find(
        pool: &PgPool,
        product_id: DbId,
        variant_id: DbId,
    ) -> Result<Option<ProductVariant>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM product_variants WHERE id = $1 AND product_id = $2"
        );
        sqlx::query_as::<_, ProductVariant>(&query)
            .bind(variant_id)
            .bind(product_id)
            .fetch_optional(pool)
            .await
    }

    /// Find a variant and lock its row for the rest of the transaction.
    pub async fn find_for_update(
        conn: &mut PgConnection,
        product_id: DbId,
        variant_id: DbId,
    ) -> Result<Option<ProductVariant>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM product_variants WHERE id = $1 AND product_id = $2 FOR UPDATE"
        );
        sqlx::query_as::<_, ProductVariant>(&query)
            .bind(variant_id)
            .bind(product_id)
            .fetch_optional(conn)
            .await
    }

    pub async fn create(
        conn: &mut PgConnection,
        product_id: DbId,
        values: &VariantValues,
    ) -> Result<ProductVariant, sqlx::Error> {
        let query = format!(
            "INSERT INTO product_variants (product_id, color, size, sku, price, mrp, stock, images)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProductVariant>(&query)
            .bind(product_id)
            .bind(&values.color)
            .bind(&values.size)
            .bind(&values.sku)
            .bind(values.price)
            .bind(values.mrp)
            .bind(values.stock)
            .bind(serde_json::json!(values.images))
            .fetch_one(conn)
            .await
    }

    /// Overwrite every column of a variant.
    pub async fn update(
        conn: &mut PgConnection,
        variant_id: DbId,
        values: &VariantValues,
    ) -> Result<ProductVariant, sqlx::Error> {
        let query = format!(
            "UPDATE product_variants SET
                color = $2, size = $3, sku = $4, price = $5, mrp = $6, stock = $7, images = $8
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProductVariant>(&query)
            .bind(variant_id)
            .bind(&values.color)
            .bind(&values.size)
            .bind(&values.sku)
            .bind(values.price)
            .bind(values.mrp)
            .bind(values.stock)
            .bind(serde_json::json!(values.images))
            .fetch_one(conn)
            .await
    }

    /// Delete the given variants of a product. Returns the number removed.
    pub async fn delete_many(
        conn: &mut PgConnection,
        product_id: DbId,
        ids: &[DbId],
    ) -> Result<u64, sqlx::Error> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result =
            sqlx::query("DELETE FROM product_variants WHERE product_id = $1 AND id = ANY($2)")
                .bind(product_id)
                .bind(ids)
                .execute(conn)
                .await?;
        Ok(result.rows_affected())
    }

    /// Add `delta` (may be negative) to a variant's stock.
    pub async fn adjust_stock(
        conn: &mut PgConnection,
        variant_id: DbId,
        delta: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE product_variants SET stock = stock + $2 WHERE id = $1")
            .bind(variant_id)
            .bind(delta)
            .execute(conn)
            .await?;
        Ok(())
    }
}
