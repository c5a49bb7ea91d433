//! Repository for the `orders` and `order_items` tables.

use bazaar_core::order::order_number;
use bazaar_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::order::{CreateOrder, CreateOrderItem, Order, OrderItem, OrderScope, OrderSummary};

const COLUMNS: &str = "id, order_number, buyer_id, status, payment_method, shipping_address, \
                       subtotal, shipping_fee, total, delivered_at, cancelled_at, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, order_id, product_id, variant_id, seller_id, product_name, \
                            variant_label, image, unit_price, quantity, line_total, created_at";

pub struct OrderRepo;

impl OrderRepo {
    /// Write the order header and its lines inside the checkout transaction.
    ///
    /// The order number is derived from the generated id, so the header is
    /// inserted first and then stamped.
    pub async fn create(
        conn: &mut PgConnection,
        input: &CreateOrder,
        items: &[CreateOrderItem],
    ) -> Result<(Order, Vec<OrderItem>), sqlx::Error> {
        let (id, created_at): (DbId, chrono::DateTime<chrono::Utc>) = sqlx::query_as(
            "INSERT INTO orders (buyer_id, payment_method, shipping_address, subtotal, shipping_fee, total)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id, created_at",
        )
        .bind(input.buyer_id)
        .bind(&input.payment_method)
        .bind(&input.shipping_address)
        .bind(input.subtotal)
        .bind(input.shipping_fee)
        .bind(input.total)
        .fetch_one(&mut *conn)
        .await?;

        let query = format!("UPDATE orders SET order_number = $2 WHERE id = $1 RETURNING {COLUMNS}");
        let order = sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .bind(order_number(id, created_at))
            .fetch_one(&mut *conn)
            .await?;

        let insert_item = format!(
            "INSERT INTO order_items (
                order_id, product_id, variant_id, seller_id, product_name,
                variant_label, image, unit_price, quantity, line_total
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {ITEM_COLUMNS}"
        );
        let mut created = Vec::with_capacity(items.len());
        for item in items {
            let row = sqlx::query_as::<_, OrderItem>(&insert_item)
                .bind(order.id)
                .bind(item.product_id)
                .bind(item.variant_id)
                .bind(item.seller_id)
                .bind(&item.product_name)
                .bind(&item.variant_label)
                .bind(&item.image)
                .bind(item.unit_price)
                .bind(item.quantity)
                .bind(item.unit_price * rust_decimal::Decimal::from(item.quantity))
                .fetch_one(&mut *conn)
                .await?;
            created.push(row);
        }

        Ok((order, created))
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Order>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM orders WHERE id = $1");
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find an order and lock its row for the rest of the transaction.
    pub async fn find_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Order>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM orders WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// List orders visible in `scope`, newest first, with the total match count.
    pub async fn list(
        pool: &PgPool,
        scope: OrderScope,
        status: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<OrderSummary>, i64), sqlx::Error> {
        let (scope_cond, scope_id) = match scope {
            OrderScope::Buyer(id) => ("o.buyer_id = $1", Some(id)),
            OrderScope::Seller(id) => (
                "(o.buyer_id = $1 OR EXISTS (
                    SELECT 1 FROM order_items si WHERE si.order_id = o.id AND si.seller_id = $1))",
                Some(id),
            ),
            OrderScope::All => ("$1::BIGINT IS NULL", None),
        };
        let where_clause = format!("WHERE {scope_cond} AND ($2::TEXT IS NULL OR o.status = $2)");

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM orders o {where_clause}"))
            .bind(scope_id)
            .bind(status)
            .fetch_one(pool)
            .await?;

        let query = format!(
            "SELECT o.id, o.order_number, o.buyer_id, u.name AS buyer_name, o.status,
                    o.payment_method, o.total,
                    (SELECT COUNT(*) FROM order_items oi WHERE oi.order_id = o.id) AS item_count,
                    o.created_at
             FROM orders o
             JOIN users u ON u.id = o.buyer_id
             {where_clause}
             ORDER BY o.created_at DESC, o.id DESC
             LIMIT $3 OFFSET $4"
        );
        let rows = sqlx::query_as::<_, OrderSummary>(&query)
            .bind(scope_id)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?;

        Ok((rows, total))
    }

    /// Order lines, optionally restricted to one seller's items.
    pub async fn items(
        pool: &PgPool,
        order_id: DbId,
        seller_id: Option<DbId>,
    ) -> Result<Vec<OrderItem>, sqlx::Error> {
        let query = format!(
            "SELECT {ITEM_COLUMNS} FROM order_items
             WHERE order_id = $1 AND ($2::BIGINT IS NULL OR seller_id = $2)
             ORDER BY id"
        );
        sqlx::query_as::<_, OrderItem>(&query)
            .bind(order_id)
            .bind(seller_id)
            .fetch_all(pool)
            .await
    }

    pub async fn items_tx(
        conn: &mut PgConnection,
        order_id: DbId,
    ) -> Result<Vec<OrderItem>, sqlx::Error> {
        let query = format!("SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id");
        sqlx::query_as::<_, OrderItem>(&query)
            .bind(order_id)
            .fetch_all(conn)
            .await
    }

    /// Lock an order line. Return requests against the line serialise on it.
    pub async fn find_item_for_update(
        conn: &mut PgConnection,
        item_id: DbId,
    ) -> Result<Option<OrderItem>, sqlx::Error> {
        let query = format!("SELECT {ITEM_COLUMNS} FROM order_items WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, OrderItem>(&query)
            .bind(item_id)
            .fetch_optional(conn)
            .await
    }

    /// Distinct sellers with at least one line on the order.
    pub async fn seller_ids(pool: &PgPool, order_id: DbId) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT DISTINCT seller_id FROM order_items WHERE order_id = $1 ORDER BY seller_id",
        )
        .bind(order_id)
        .fetch_all(pool)
        .await
    }

    pub async fn seller_has_items(
        pool: &PgPool,
        order_id: DbId,
        seller_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM order_items WHERE order_id = $1 AND seller_id = $2)",
        )
        .bind(order_id)
        .bind(seller_id)
        .fetch_one(pool)
        .await
    }

    /// Set the status, stamping `delivered_at` / `cancelled_at` as it lands.
    pub async fn update_status(
        conn: &mut PgConnection,
        id: DbId,
        status: &str,
    ) -> Result<Order, sqlx::Error> {
        let query = format!(
            "UPDATE orders SET
                status = $2,
                delivered_at = CASE WHEN $2 = 'delivered' THEN NOW() ELSE delivered_at END,
                cancelled_at = CASE WHEN $2 = 'cancelled' THEN NOW() ELSE cancelled_at END
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .bind(status)
            .fetch_one(conn)
            .await
    }
}
