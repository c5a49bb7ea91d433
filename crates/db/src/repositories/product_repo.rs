//! Repository for the `products` table.

use bazaar_core::order::OrderStatus;
use bazaar_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::product::{CreateProduct, Product, ProductListItem, ProductQuery, UpdateProduct};

/// Column list for `products` queries.
const COLUMNS: &str = "id, seller_id, category_id, subcategory_id, name, description, \
                       price, mrp, stock, images, status, review_note, created_at, updated_at";

/// Provides CRUD and listing operations for products.
pub struct ProductRepo;

/// Bind the optional filters of a [`ProductQuery`] in the order that
/// [`ProductRepo::filter_clause`] numbered them.
macro_rules! bind_filters {
    ($q:expr, $f:expr) => {{
        let mut q = $q;
        if let Some(id) = $f.category_id {
            q = q.bind(id);
        }
        if let Some(id) = $f.subcategory_id {
            q = q.bind(id);
        }
        if let Some(id) = $f.seller_id {
            q = q.bind(id);
        }
        if let Some(ref status) = $f.status {
            q = q.bind(status.clone());
        }
        if let Some(ref search) = $f.search {
            q = q.bind(format!("%{}%", search.trim()));
        }
        if let Some(min) = $f.min_price {
            q = q.bind(min);
        }
        if let Some(max) = $f.max_price {
            q = q.bind(max);
        }
        q
    }};
}

impl ProductRepo {
    /// Insert a product inside the caller's transaction.
    pub async fn create(
        conn: &mut PgConnection,
        input: &CreateProduct,
    ) -> Result<Product, sqlx::Error> {
        let query = format!(
            "INSERT INTO products (
                seller_id, category_id, subcategory_id, name, description,
                price, mrp, stock, images, status
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(input.seller_id)
            .bind(input.category_id)
            .bind(input.subcategory_id)
            .bind(input.name.trim())
            .bind(input.description.trim())
            .bind(input.price)
            .bind(input.mrp)
            .bind(input.stock)
            .bind(serde_json::json!(input.images))
            .bind(&input.status)
            .fetch_one(conn)
            .await
    }

    /// Find a product by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Product>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM products WHERE id = $1");
        sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a product and lock its row for the rest of the transaction.
    pub async fn find_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Product>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM products WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Build the `WHERE` clause for a listing. Placeholders start at `$1`;
    /// returns the clause and the next free placeholder index.
    fn filter_clause(f: &ProductQuery) -> (String, u32) {
        let mut conditions = Vec::new();
        let mut idx = 1u32;
        let mut push = |cond: &str| {
            conditions.push(cond.replace('?', &format!("${idx}")));
            idx += 1;
        };

        if f.category_id.is_some() {
            push("p.category_id = ?");
        }
        if f.subcategory_id.is_some() {
            push("p.subcategory_id = ?");
        }
        if f.seller_id.is_some() {
            push("p.seller_id = ?");
        }
        if f.status.is_some() {
            push("p.status = ?");
        }
        if f.search.is_some() {
            push("p.name ILIKE ?");
        }
        if f.min_price.is_some() {
            push("p.price >= ?");
        }
        if f.max_price.is_some() {
            push("p.price <= ?");
        }

        let clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        (clause, idx)
    }

    /// List products matching `filter`, returning the page and the total match count.
    pub async fn list(
        pool: &PgPool,
        filter: &ProductQuery,
    ) -> Result<(Vec<ProductListItem>, i64), sqlx::Error> {
        let (where_clause, next_idx) = Self::filter_clause(filter);

        let count_query = format!("SELECT COUNT(*) FROM products p {where_clause}");
        let total: i64 = bind_filters!(sqlx::query_scalar::<_, i64>(&count_query), filter)
            .fetch_one(pool)
            .await?;

        let list_query = format!(
            "SELECT p.id, p.seller_id, u.name AS seller_name,
                    p.category_id, c.name AS category_name, p.subcategory_id,
                    p.name, p.price, p.mrp, p.stock, p.images, p.status,
                    (SELECT COUNT(*) FROM product_variants v WHERE v.product_id = p.id) AS variant_count,
                    p.created_at
             FROM products p
             JOIN users u ON u.id = p.seller_id
             LEFT JOIN categories c ON c.id = p.category_id
             {where_clause}
             ORDER BY {order_by}
             LIMIT ${limit_idx} OFFSET ${offset_idx}",
            order_by = filter.sort.order_by(),
            limit_idx = next_idx,
            offset_idx = next_idx + 1,
        );
        let items = bind_filters!(sqlx::query_as::<_, ProductListItem>(&list_query), filter)
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(pool)
            .await?;

        Ok((items, total))
    }

    /// Overwrite the editable columns inside the caller's transaction.
    pub async fn update(
        conn: &mut PgConnection,
        id: DbId,
        input: &UpdateProduct,
    ) -> Result<Option<Product>, sqlx::Error> {
        let query = format!(
            "UPDATE products SET
                category_id = $2,
                subcategory_id = $3,
                name = $4,
                description = $5,
                price = $6,
                mrp = $7,
                stock = $8,
                images = $9,
                status = $10
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .bind(input.category_id)
            .bind(input.subcategory_id)
            .bind(input.name.trim())
            .bind(input.description.trim())
            .bind(input.price)
            .bind(input.mrp)
            .bind(input.stock)
            .bind(serde_json::json!(input.images))
            .bind(&input.status)
            .fetch_optional(conn)
            .await
    }

    /// Set moderation status and (optionally) the reviewer's note.
    pub async fn set_status(
        pool: &PgPool,
        id: DbId,
        status: &str,
        review_note: Option<&str>,
    ) -> Result<Option<Product>, sqlx::Error> {
        let query = format!(
            "UPDATE products SET status = $2, review_note = $3 WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .bind(status)
            .bind(review_note)
            .fetch_optional(pool)
            .await
    }

    /// Number of order lines referencing this product on orders still in flight.
    pub async fn count_open_order_refs(pool: &PgPool, id: DbId) -> Result<i64, sqlx::Error> {
        let open: Vec<&str> = OrderStatus::ALL
            .into_iter()
            .filter(|s| !s.is_terminal())
            .map(OrderStatus::as_str)
            .collect();
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM order_items oi
             JOIN orders o ON o.id = oi.order_id
             WHERE oi.product_id = $1 AND o.status = ANY($2)",
        )
        .bind(id)
        .bind(open)
        .fetch_one(pool)
        .await
    }

    /// Delete a product. Variants, cart rows, and wishlist rows cascade;
    /// order lines keep their snapshot with `product_id` cleared.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Add `delta` (may be negative) to product-level stock.
    pub async fn adjust_stock(
        conn: &mut PgConnection,
        id: DbId,
        delta: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE products SET stock = stock + $2 WHERE id = $1")
            .bind(id)
            .bind(delta)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Set product-level stock to the sum of its variants' stock.
    ///
    /// Products with variants keep this total so listings can show
    /// availability without a join.
    pub async fn sync_stock_from_variants(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<i32, sqlx::Error> {
        sqlx::query_scalar(
            "UPDATE products SET stock = (
                SELECT COALESCE(SUM(stock), 0)::INTEGER FROM product_variants WHERE product_id = $1
             )
             WHERE id = $1
             RETURNING stock",
        )
        .bind(id)
        .fetch_one(conn)
        .await
    }
}
