//! Repository tests for users, categories, products, and variants.

use assert_matches::assert_matches;
use bazaar_db::models::product::{CreateProduct, ProductQuery, ProductSort, UpdateProduct};
use bazaar_db::models::user::{CreateUser, UpdateUser, UserListParams};
use bazaar_db::models::variant::VariantValues;
use bazaar_db::repositories::{CategoryRepo, ProductRepo, UserRepo, VariantRepo};
use rust_decimal::Decimal;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn new_user(pool: &PgPool, email: &str, role: &str) -> i64 {
    UserRepo::create(
        pool,
        &CreateUser {
            name: format!("User {email}"),
            email: email.to_string(),
            password_hash: "not-a-real-hash".to_string(),
            role: role.to_string(),
        },
    )
    .await
    .unwrap()
    .id
}

fn new_product(seller_id: i64, name: &str, price: i64, status: &str) -> CreateProduct {
    CreateProduct {
        seller_id,
        category_id: None,
        subcategory_id: None,
        name: name.to_string(),
        description: "A sturdy product description for tests".to_string(),
        price: Decimal::from(price),
        mrp: Some(Decimal::from(price + 100)),
        stock: 5,
        images: vec!["http://localhost:3000/uploads/a.png".to_string()],
        status: status.to_string(),
    }
}

async fn insert_product(pool: &PgPool, input: &CreateProduct) -> i64 {
    let mut conn = pool.acquire().await.unwrap();
    ProductRepo::create(&mut conn, input).await.unwrap().id
}

fn variant(color: &str, sku: Option<&str>) -> VariantValues {
    VariantValues {
        color: Some(color.to_string()),
        size: Some("M".to_string()),
        sku: sku.map(str::to_string),
        price: Decimal::from(250),
        mrp: None,
        stock: 3,
        images: Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn email_is_unique_case_insensitively(pool: PgPool) {
    new_user(&pool, "asha@example.com", "buyer").await;
    let err = UserRepo::create(
        &pool,
        &CreateUser {
            name: "Dup".into(),
            email: "ASHA@example.com".into(),
            password_hash: "x".into(),
            role: "buyer".into(),
        },
    )
    .await
    .unwrap_err();
    assert_matches!(err, sqlx::Error::Database(db) if db.constraint() == Some("uq_users_email"));

    let found = UserRepo::find_by_email(&pool, " Asha@Example.com ").await.unwrap();
    assert!(found.is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn user_update_and_filtered_list(pool: PgPool) {
    let seller = new_user(&pool, "s@example.com", "seller").await;
    new_user(&pool, "b@example.com", "buyer").await;

    let updated = UserRepo::update(
        &pool,
        seller,
        &UpdateUser {
            name: Some("  Shop Owner ".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(updated.name, "Shop Owner");
    assert_eq!(updated.role, "seller");

    let sellers = UserRepo::list(
        &pool,
        &UserListParams {
            role: Some("seller".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(sellers.len(), 1);

    assert!(UserRepo::deactivate(&pool, seller).await.unwrap());
    assert!(!UserRepo::deactivate(&pool, seller).await.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn failed_logins_accumulate_and_reset(pool: PgPool) {
    let id = new_user(&pool, "lock@example.com", "buyer").await;
    assert_eq!(UserRepo::increment_failed_login(&pool, id).await.unwrap(), 1);
    assert_eq!(UserRepo::increment_failed_login(&pool, id).await.unwrap(), 2);
    UserRepo::record_successful_login(&pool, id).await.unwrap();
    let user = UserRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(user.failed_login_count, 0);
    assert!(user.last_login_at.is_some());
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn category_slug_is_unique(pool: PgPool) {
    let cat = CategoryRepo::create(&pool, "Home Decor", "home-decor", None).await.unwrap();
    let err = CategoryRepo::create(&pool, "Home decor", "home-decor", None).await.unwrap_err();
    assert_matches!(err, sqlx::Error::Database(db) if db.constraint() == Some("uq_categories_slug"));

    CategoryRepo::create_subcategory(&pool, cat.id, "Lamps", "lamps").await.unwrap();
    let subs = CategoryRepo::list_subcategories(&pool, cat.id).await.unwrap();
    assert_eq!(subs.len(), 1);

    let all = CategoryRepo::list_all_subcategories(&pool).await.unwrap();
    assert_eq!(all[0].category_name, "Home Decor");
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn product_round_trip(pool: PgPool) {
    let seller = new_user(&pool, "s@example.com", "seller").await;
    let id = insert_product(&pool, &new_product(seller, "  Clay Mug ", 300, "draft")).await;

    let product = ProductRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(product.name, "Clay Mug");
    assert_eq!(product.price, Decimal::from(300));
    assert_eq!(product.images, serde_json::json!(["http://localhost:3000/uploads/a.png"]));

    let mut conn = pool.acquire().await.unwrap();
    let updated = ProductRepo::update(
        &mut conn,
        id,
        &UpdateProduct {
            category_id: None,
            subcategory_id: None,
            name: "Clay Mug XL".into(),
            description: product.description.clone(),
            price: Decimal::from(350),
            mrp: None,
            stock: 9,
            images: Vec::new(),
            status: "pending".into(),
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(updated.status, "pending");
    assert_eq!(updated.stock, 9);
    assert_eq!(updated.mrp, None);

    let reviewed = ProductRepo::set_status(&pool, id, "rejected", Some("Blurry photos"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reviewed.review_note.as_deref(), Some("Blurry photos"));

    assert!(ProductRepo::delete(&pool, id).await.unwrap());
    assert!(ProductRepo::find_by_id(&pool, id).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn mrp_below_price_rejected_by_check(pool: PgPool) {
    let seller = new_user(&pool, "s@example.com", "seller").await;
    let mut input = new_product(seller, "Cheap", 300, "draft");
    input.mrp = Some(Decimal::from(100));
    let mut conn = pool.acquire().await.unwrap();
    let err = ProductRepo::create(&mut conn, &input).await.unwrap_err();
    assert_matches!(err, sqlx::Error::Database(db) if db.constraint() == Some("ck_products_mrp"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn product_list_filters_sorts_and_counts(pool: PgPool) {
    let seller = new_user(&pool, "s@example.com", "seller").await;
    let other = new_user(&pool, "o@example.com", "seller").await;
    insert_product(&pool, &new_product(seller, "Brass Lamp", 900, "approved")).await;
    insert_product(&pool, &new_product(seller, "Paper Lamp", 200, "approved")).await;
    insert_product(&pool, &new_product(seller, "Lamp Draft", 100, "draft")).await;
    insert_product(&pool, &new_product(other, "Wool Rug", 500, "approved")).await;

    let (items, total) = ProductRepo::list(
        &pool,
        &ProductQuery {
            status: Some("approved".into()),
            search: Some("lamp".into()),
            sort: ProductSort::PriceAsc,
            limit: 1,
            offset: 0,
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(total, 2);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name, "Paper Lamp");
    assert_eq!(items[0].variant_count, 0);

    let (items, total) = ProductRepo::list(
        &pool,
        &ProductQuery {
            seller_id: Some(other),
            min_price: Some(Decimal::from(400)),
            max_price: Some(Decimal::from(600)),
            limit: 20,
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(total, 1);
    assert_eq!(items[0].seller_name, "User o@example.com");
}

// ---------------------------------------------------------------------------
// Variants
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn variant_crud_and_sku_uniqueness(pool: PgPool) {
    let seller = new_user(&pool, "s@example.com", "seller").await;
    let product_id = insert_product(&pool, &new_product(seller, "Tee", 250, "draft")).await;

    let mut tx = pool.begin().await.unwrap();
    let red = VariantRepo::create(&mut tx, product_id, &variant("Red", Some("tee-red")))
        .await
        .unwrap();
    let blue = VariantRepo::create(&mut tx, product_id, &variant("Blue", None))
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let mut conn = pool.acquire().await.unwrap();
    let err = VariantRepo::create(&mut conn, product_id, &variant("Green", Some("TEE-RED")))
        .await
        .unwrap_err();
    assert_matches!(err, sqlx::Error::Database(db) if db.constraint() == Some("uq_product_variants_sku"));

    let ids = VariantRepo::lock_ids_for_product(&mut conn, product_id).await.unwrap();
    assert_eq!(ids, vec![red.id, blue.id]);

    let updated = VariantRepo::update(&mut conn, blue.id, &variant("Navy", None)).await.unwrap();
    assert_eq!(updated.color.as_deref(), Some("Navy"));

    VariantRepo::adjust_stock(&mut conn, red.id, -2).await.unwrap();
    let red = VariantRepo::find(&pool, product_id, red.id).await.unwrap().unwrap();
    assert_eq!(red.stock, 1);

    assert_eq!(VariantRepo::delete_many(&mut conn, product_id, &[red.id]).await.unwrap(), 1);
    assert_eq!(VariantRepo::count_for_product(&pool, product_id).await.unwrap(), 1);
    assert_eq!(ProductRepo::sync_stock_from_variants(&mut conn, product_id).await.unwrap(), 3);
    assert!(VariantRepo::find(&pool, product_id + 1, blue.id).await.unwrap().is_none());
}
