//! Repository for the `return_requests` table.

use bazaar_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::order::OrderScope;
use crate::models::return_request::{CreateReturnRequest, ReturnRequest, ReturnWithItem};

const COLUMNS: &str = "id, order_item_id, buyer_id, quantity, reason, status, decision_note, \
                       decided_by, decided_at, created_at, updated_at";

const JOINED_SELECT: &str = "\
    SELECT r.id, r.order_item_id, oi.order_id, o.order_number, r.buyer_id, oi.seller_id,
           oi.product_id, oi.variant_id, oi.product_name, r.quantity, r.reason, r.status,
           r.decision_note, r.decided_at, r.created_at
    FROM return_requests r
    JOIN order_items oi ON oi.id = r.order_item_id
    JOIN orders o ON o.id = oi.order_id";

pub struct ReturnRepo;

impl ReturnRepo {
    pub async fn create(
        conn: &mut PgConnection,
        input: &CreateReturnRequest,
    ) -> Result<ReturnRequest, sqlx::Error> {
        let query = format!(
            "INSERT INTO return_requests (order_item_id, buyer_id, quantity, reason)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ReturnRequest>(&query)
            .bind(input.order_item_id)
            .bind(input.buyer_id)
            .bind(input.quantity)
            .bind(input.reason.trim())
            .fetch_one(conn)
            .await
    }

    /// Units of an order line already covered by requests that were not rejected.
    pub async fn requested_quantity(
        conn: &mut PgConnection,
        order_item_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity), 0)::BIGINT FROM return_requests
             WHERE order_item_id = $1 AND status <> 'rejected'",
        )
        .bind(order_item_id)
        .fetch_one(conn)
        .await
    }

    /// Returns visible in `scope`, newest first, with the total match count.
    pub async fn list(
        pool: &PgPool,
        scope: OrderScope,
        status: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<ReturnWithItem>, i64), sqlx::Error> {
        let (scope_cond, scope_id) = match scope {
            OrderScope::Buyer(id) => ("r.buyer_id = $1", Some(id)),
            OrderScope::Seller(id) => ("(r.buyer_id = $1 OR oi.seller_id = $1)", Some(id)),
            OrderScope::All => ("$1::BIGINT IS NULL", None),
        };
        let where_clause = format!("WHERE {scope_cond} AND ($2::TEXT IS NULL OR r.status = $2)");

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM return_requests r
             JOIN order_items oi ON oi.id = r.order_item_id
             {where_clause}"
        ))
        .bind(scope_id)
        .bind(status)
        .fetch_one(pool)
        .await?;

        let query = format!(
            "{JOINED_SELECT} {where_clause} ORDER BY r.created_at DESC, r.id DESC LIMIT $3 OFFSET $4"
        );
        let rows = sqlx::query_as::<_, ReturnWithItem>(&query)
            .bind(scope_id)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?;

        Ok((rows, total))
    }

    pub async fn find_with_item(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<ReturnWithItem>, sqlx::Error> {
        let query = format!("{JOINED_SELECT} WHERE r.id = $1");
        sqlx::query_as::<_, ReturnWithItem>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lock a request row and return its current status.
    pub async fn lock_status(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT status FROM return_requests WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Record a decision on a request.
    pub async fn decide(
        conn: &mut PgConnection,
        id: DbId,
        status: &str,
        note: Option<&str>,
        decided_by: DbId,
    ) -> Result<ReturnRequest, sqlx::Error> {
        let query = format!(
            "UPDATE return_requests SET
                status = $2,
                decision_note = COALESCE($3, decision_note),
                decided_by = $4,
                decided_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ReturnRequest>(&query)
            .bind(id)
            .bind(status)
            .bind(note)
            .bind(decided_by)
            .fetch_one(conn)
            .await
    }
}
