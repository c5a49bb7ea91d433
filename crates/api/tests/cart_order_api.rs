//! HTTP-level tests for the cart, wishlist, checkout, and order lifecycle.

mod common;

use axum::http::StatusCode;
use common::{
    approved_product, body_json, delete, get, patch_json, post_empty, post_json, put_json,
    shipping_address, signed_in,
};
use rust_decimal::Decimal;
use sqlx::PgPool;

fn money(value: &serde_json::Value) -> Decimal {
    value
        .as_str()
        .expect("money is serialized as a string")
        .parse()
        .unwrap()
}

async fn stock_of(app: &axum::Router, product_id: i64) -> i64 {
    let json = body_json(get(app, &format!("/api/products/{product_id}"), None).await).await;
    json["data"]["stock"].as_i64().unwrap()
}

async fn add_to_cart(app: &axum::Router, token: &str, product_id: i64, quantity: i32) -> StatusCode {
    post_json(
        app,
        "/api/cart",
        Some(token),
        serde_json::json!({ "product_id": product_id, "quantity": quantity }),
    )
    .await
    .status()
}

async fn checkout(app: &axum::Router, token: &str) -> axum::http::Response<axum::body::Body> {
    post_json(
        app,
        "/api/orders",
        Some(token),
        serde_json::json!({ "shipping_address": shipping_address(), "payment_method": "cod" }),
    )
    .await
}

// ---------------------------------------------------------------------------
// Cart
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn cart_merges_lines_and_prices_totals(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_, admin) = signed_in(&pool, &app, "admin@example.com", "admin").await;
    let (_, seller) = signed_in(&pool, &app, "seller@example.com", "seller").await;
    let (_, buyer) = signed_in(&pool, &app, "buyer@example.com", "buyer").await;
    let mug = approved_product(&app, &seller, &admin, "Clay Mug", "249.00", 5).await;

    assert_eq!(add_to_cart(&app, &buyer, mug, 1).await, StatusCode::CREATED);
    assert_eq!(add_to_cart(&app, &buyer, mug, 1).await, StatusCode::CREATED);

    let cart = body_json(get(&app, "/api/cart", Some(&buyer)).await).await["data"].clone();
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);
    assert_eq!(cart["items"][0]["quantity"], 2);
    assert_eq!(money(&cart["totals"]["subtotal"]), Decimal::from(498));
    assert_eq!(money(&cart["totals"]["shipping"]), Decimal::from(49));
    assert_eq!(money(&cart["totals"]["total"]), Decimal::from(547));

    // Beyond stock on update, beyond the per-line cap on add.
    let item_id = cart["items"][0]["id"].as_i64().unwrap();
    let too_many = put_json(
        &app,
        &format!("/api/cart/{item_id}"),
        Some(&buyer),
        serde_json::json!({ "quantity": 6 }),
    )
    .await;
    assert_eq!(too_many.status(), StatusCode::CONFLICT);
    assert_eq!(add_to_cart(&app, &buyer, mug, 11).await, StatusCode::BAD_REQUEST);

    let updated = put_json(
        &app,
        &format!("/api/cart/{item_id}"),
        Some(&buyer),
        serde_json::json!({ "quantity": 3 }),
    )
    .await;
    assert_eq!(updated.status(), StatusCode::OK);
    let totals = body_json(updated).await["data"]["totals"].clone();
    assert_eq!(money(&totals["shipping"]), Decimal::ZERO);

    assert_eq!(
        delete(&app, &format!("/api/cart/{item_id}"), Some(&buyer)).await.status(),
        StatusCode::NO_CONTENT
    );
    assert_eq!(
        delete(&app, &format!("/api/cart/{item_id}"), Some(&buyer)).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn cart_requires_login_and_approved_products(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_, seller) = signed_in(&pool, &app, "seller@example.com", "seller").await;
    let (_, buyer) = signed_in(&pool, &app, "buyer@example.com", "buyer").await;

    assert_eq!(get(&app, "/api/cart", None).await.status(), StatusCode::UNAUTHORIZED);

    let draft = post_json(
        &app,
        "/api/products",
        Some(&seller),
        serde_json::json!({
            "name": "Draft Bowl",
            "description": "Not yet submitted for review by its seller.",
            "price": "99.00",
            "stock": 4,
        }),
    )
    .await;
    let draft_id = body_json(draft).await["data"]["id"].as_i64().unwrap();
    assert_eq!(add_to_cart(&app, &buyer, draft_id, 1).await, StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Wishlist
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn wishlist_is_idempotent_and_moves_to_cart(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_, admin) = signed_in(&pool, &app, "admin@example.com", "admin").await;
    let (_, seller) = signed_in(&pool, &app, "seller@example.com", "seller").await;
    let (_, buyer) = signed_in(&pool, &app, "buyer@example.com", "buyer").await;
    let mug = approved_product(&app, &seller, &admin, "Clay Mug", "249.00", 5).await;

    let body = serde_json::json!({ "product_id": mug });
    let first = post_json(&app, "/api/wishlist", Some(&buyer), body.clone()).await;
    assert_eq!(first.status(), StatusCode::CREATED);
    let again = post_json(&app, "/api/wishlist", Some(&buyer), body).await;
    assert_eq!(again.status(), StatusCode::OK);
    assert_eq!(body_json(again).await["data"]["added"], false);

    let list = body_json(get(&app, "/api/wishlist", Some(&buyer)).await).await;
    assert_eq!(list["data"].as_array().unwrap().len(), 1);

    let moved = post_empty(
        &app,
        &format!("/api/wishlist/{mug}/move-to-cart"),
        Some(&buyer),
    )
    .await;
    assert_eq!(moved.status(), StatusCode::OK);
    let cart = body_json(moved).await["data"].clone();
    assert_eq!(cart["items"][0]["product_id"], mug);

    let list = body_json(get(&app, "/api/wishlist", Some(&buyer)).await).await;
    assert!(list["data"].as_array().unwrap().is_empty());
    assert_eq!(
        delete(&app, &format!("/api/wishlist/{mug}"), Some(&buyer)).await.status(),
        StatusCode::NOT_FOUND
    );
}

// ---------------------------------------------------------------------------
// Checkout
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn checkout_snapshots_prices_and_decrements_stock(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_, admin) = signed_in(&pool, &app, "admin@example.com", "admin").await;
    let (seller_user, seller) = signed_in(&pool, &app, "seller@example.com", "seller").await;
    let (buyer_user, buyer) = signed_in(&pool, &app, "buyer@example.com", "buyer").await;
    let mug = approved_product(&app, &seller, &admin, "Clay Mug", "249.00", 5).await;
    add_to_cart(&app, &buyer, mug, 2).await;

    let response = checkout(&app, &buyer).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let order = body_json(response).await["data"].clone();
    assert_eq!(order["status"], "pending");
    assert_eq!(order["buyer_id"], buyer_user.id);
    assert!(order["order_number"].as_str().unwrap().starts_with("ORD-"));
    assert_eq!(money(&order["total"]), Decimal::from(547));
    assert_eq!(order["items"][0]["product_name"], "Clay Mug");
    assert_eq!(order["items"][0]["seller_id"], seller_user.id);

    assert_eq!(stock_of(&app, mug).await, 3);
    let cart = body_json(get(&app, "/api/cart", Some(&buyer)).await).await;
    assert!(cart["data"]["items"].as_array().unwrap().is_empty());

    // A later price change does not touch the placed order.
    put_json(
        &app,
        &format!("/api/products/{mug}"),
        Some(&admin),
        serde_json::json!({ "price": "199.00" }),
    )
    .await;
    let order_id = order["id"].as_i64().unwrap();
    let again = body_json(get(&app, &format!("/api/orders/{order_id}"), Some(&buyer)).await).await;
    assert_eq!(money(&again["data"]["items"][0]["unit_price"]), Decimal::from(249));

    let empty = checkout(&app, &buyer).await;
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn checkout_refuses_when_stock_ran_out(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_, admin) = signed_in(&pool, &app, "admin@example.com", "admin").await;
    let (_, seller) = signed_in(&pool, &app, "seller@example.com", "seller").await;
    let (_, buyer) = signed_in(&pool, &app, "buyer@example.com", "buyer").await;
    let mug = approved_product(&app, &seller, &admin, "Clay Mug", "249.00", 5).await;
    add_to_cart(&app, &buyer, mug, 3).await;

    put_json(
        &app,
        &format!("/api/products/{mug}"),
        Some(&seller),
        serde_json::json!({ "stock": 1 }),
    )
    .await;

    let response = checkout(&app, &buyer).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert!(body_json(response).await["error"]
        .as_str()
        .unwrap()
        .contains("Clay Mug"));

    // Nothing was committed.
    assert_eq!(stock_of(&app, mug).await, 1);
    let cart = body_json(get(&app, "/api/cart", Some(&buyer)).await).await;
    assert_eq!(cart["data"]["items"].as_array().unwrap().len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn checkout_validates_the_address(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_, buyer) = signed_in(&pool, &app, "buyer@example.com", "buyer").await;

    let mut address = shipping_address();
    address["phone"] = serde_json::json!("12");
    let response = post_json(
        &app,
        "/api/orders",
        Some(&buyer),
        serde_json::json!({ "shipping_address": address, "payment_method": "cod" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"]
        .as_str()
        .unwrap()
        .contains("phone"));
}

// ---------------------------------------------------------------------------
// Order lifecycle
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn orders_are_scoped_to_participants(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_, admin) = signed_in(&pool, &app, "admin@example.com", "admin").await;
    let (_, seller) = signed_in(&pool, &app, "seller@example.com", "seller").await;
    let (_, rival) = signed_in(&pool, &app, "rival@example.com", "seller").await;
    let (_, buyer) = signed_in(&pool, &app, "buyer@example.com", "buyer").await;
    let (_, stranger) = signed_in(&pool, &app, "stranger@example.com", "buyer").await;
    let mug = approved_product(&app, &seller, &admin, "Clay Mug", "249.00", 5).await;
    add_to_cart(&app, &buyer, mug, 1).await;
    let order_id = body_json(checkout(&app, &buyer).await).await["data"]["id"]
        .as_i64()
        .unwrap();
    let uri = format!("/api/orders/{order_id}");

    assert_eq!(get(&app, &uri, Some(&buyer)).await.status(), StatusCode::OK);
    assert_eq!(get(&app, &uri, Some(&seller)).await.status(), StatusCode::OK);
    assert_eq!(get(&app, &uri, Some(&admin)).await.status(), StatusCode::OK);
    assert_eq!(get(&app, &uri, Some(&rival)).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(get(&app, &uri, Some(&stranger)).await.status(), StatusCode::NOT_FOUND);

    let seller_list = body_json(get(&app, "/api/orders", Some(&seller)).await).await;
    assert_eq!(seller_list["total"], 1);
    let rival_list = body_json(get(&app, "/api/orders", Some(&rival)).await).await;
    assert_eq!(rival_list["total"], 0);
    let pending = body_json(get(&app, "/api/orders?status=pending", Some(&admin)).await).await;
    assert_eq!(pending["total"], 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn sellers_see_their_own_purchases(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_, admin) = signed_in(&pool, &app, "admin@example.com", "admin").await;
    let (_, potter) = signed_in(&pool, &app, "potter@example.com", "seller").await;
    let (_, weaver) = signed_in(&pool, &app, "weaver@example.com", "seller").await;
    let mug = approved_product(&app, &potter, &admin, "Clay Mug", "249.00", 5).await;

    assert_eq!(add_to_cart(&app, &weaver, mug, 1).await, StatusCode::CREATED);
    let order_id = body_json(checkout(&app, &weaver).await).await["data"]["id"]
        .as_i64()
        .unwrap();

    let weaver_list = body_json(get(&app, "/api/orders", Some(&weaver)).await).await;
    assert_eq!(weaver_list["total"], 1);
    assert_eq!(weaver_list["data"][0]["id"], order_id);
    let potter_list = body_json(get(&app, "/api/orders", Some(&potter)).await).await;
    assert_eq!(potter_list["total"], 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn seller_fulfils_and_buyer_cannot_skip_ahead(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_, admin) = signed_in(&pool, &app, "admin@example.com", "admin").await;
    let (_, seller) = signed_in(&pool, &app, "seller@example.com", "seller").await;
    let (_, buyer) = signed_in(&pool, &app, "buyer@example.com", "buyer").await;
    let mug = approved_product(&app, &seller, &admin, "Clay Mug", "249.00", 5).await;
    add_to_cart(&app, &buyer, mug, 1).await;
    let order_id = body_json(checkout(&app, &buyer).await).await["data"]["id"]
        .as_i64()
        .unwrap();
    let uri = format!("/api/orders/{order_id}/status");

    let buyer_ship = patch_json(&app, &uri, Some(&buyer), serde_json::json!({ "status": "confirmed" })).await;
    assert_eq!(buyer_ship.status(), StatusCode::FORBIDDEN);

    let skip = patch_json(&app, &uri, Some(&seller), serde_json::json!({ "status": "delivered" })).await;
    assert_eq!(skip.status(), StatusCode::CONFLICT);

    for status in ["confirmed", "shipped", "delivered"] {
        let response = patch_json(&app, &uri, Some(&seller), serde_json::json!({ "status": status })).await;
        assert_eq!(response.status(), StatusCode::OK, "moving to {status}");
    }
    let order = body_json(get(&app, &format!("/api/orders/{order_id}"), Some(&buyer)).await).await;
    assert_eq!(order["data"]["status"], "delivered");
    assert!(order["data"]["delivered_at"].is_string());

    let late_cancel = post_empty(&app, &format!("/api/orders/{order_id}/cancel"), Some(&buyer)).await;
    assert_eq!(late_cancel.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn cancelling_restocks(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_, admin) = signed_in(&pool, &app, "admin@example.com", "admin").await;
    let (_, seller) = signed_in(&pool, &app, "seller@example.com", "seller").await;
    let (_, buyer) = signed_in(&pool, &app, "buyer@example.com", "buyer").await;
    let mug = approved_product(&app, &seller, &admin, "Clay Mug", "249.00", 5).await;
    add_to_cart(&app, &buyer, mug, 2).await;
    let order_id = body_json(checkout(&app, &buyer).await).await["data"]["id"]
        .as_i64()
        .unwrap();
    assert_eq!(stock_of(&app, mug).await, 3);

    let cancelled = post_empty(&app, &format!("/api/orders/{order_id}/cancel"), Some(&buyer)).await;
    assert_eq!(cancelled.status(), StatusCode::OK);
    assert_eq!(body_json(cancelled).await["data"]["status"], "cancelled");
    assert_eq!(stock_of(&app, mug).await, 5);

    // Deleting a product with only terminal orders is allowed.
    assert_eq!(
        delete(&app, &format!("/api/products/{mug}"), Some(&seller)).await.status(),
        StatusCode::NO_CONTENT
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn multi_seller_orders_are_driven_by_admin(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_, admin) = signed_in(&pool, &app, "admin@example.com", "admin").await;
    let (_, seller) = signed_in(&pool, &app, "seller@example.com", "seller").await;
    let (_, other) = signed_in(&pool, &app, "other@example.com", "seller").await;
    let (_, buyer) = signed_in(&pool, &app, "buyer@example.com", "buyer").await;
    let mug = approved_product(&app, &seller, &admin, "Clay Mug", "249.00", 5).await;
    let throw = approved_product(&app, &other, &admin, "Linen Throw", "1299.00", 2).await;
    add_to_cart(&app, &buyer, mug, 1).await;
    add_to_cart(&app, &buyer, throw, 1).await;
    let order_id = body_json(checkout(&app, &buyer).await).await["data"]["id"]
        .as_i64()
        .unwrap();

    // Each seller sees only their own lines.
    let items = body_json(
        get(&app, &format!("/api/orders/{order_id}/items"), Some(&seller)).await,
    )
    .await;
    assert_eq!(items["data"].as_array().unwrap().len(), 1);
    assert_eq!(items["data"][0]["product_name"], "Clay Mug");

    // Open orders block deleting their products.
    assert_eq!(
        delete(&app, &format!("/api/products/{mug}"), Some(&seller)).await.status(),
        StatusCode::CONFLICT
    );

    let uri = format!("/api/orders/{order_id}/status");
    let by_seller = patch_json(&app, &uri, Some(&seller), serde_json::json!({ "status": "confirmed" })).await;
    assert_eq!(by_seller.status(), StatusCode::FORBIDDEN);
    let by_admin = patch_json(&app, &uri, Some(&admin), serde_json::json!({ "status": "confirmed" })).await;
    assert_eq!(by_admin.status(), StatusCode::OK);
}
