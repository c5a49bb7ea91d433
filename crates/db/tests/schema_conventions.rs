use sqlx::PgPool;

/// All `id` columns must be bigint, except the singleton footer row.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_all_pks_are_correct_type(pool: PgPool) {
    let rows: Vec<(String, String)> = sqlx::query_as(
        "SELECT table_name, data_type
         FROM information_schema.columns
         WHERE column_name = 'id'
           AND table_schema = 'public'
           AND table_name != '_sqlx_migrations'
         ORDER BY table_name",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    assert!(!rows.is_empty());
    for (table, data_type) in &rows {
        let expected = if table == "footer_content" { "smallint" } else { "bigint" };
        assert_eq!(data_type, expected, "Table {table}.id has the wrong type");
    }
}

/// Unique indexes are named `uq_*` so the API can map violations to 409.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unique_indexes_use_uq_prefix(pool: PgPool) {
    let names: Vec<(String,)> = sqlx::query_as(
        "SELECT indexname FROM pg_indexes
         WHERE schemaname = 'public'
           AND indexdef LIKE 'CREATE UNIQUE INDEX%'
           AND indexname NOT LIKE '%_pkey'
           AND tablename != '_sqlx_migrations'",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    for (name,) in &names {
        assert!(name.starts_with("uq_"), "unique index {name} should start with uq_");
    }
}

/// Money columns are fixed-point.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_money_columns_are_numeric(pool: PgPool) {
    let rows: Vec<(String, String, String)> = sqlx::query_as(
        "SELECT table_name, column_name, data_type
         FROM information_schema.columns
         WHERE table_schema = 'public'
           AND column_name IN ('price', 'mrp', 'unit_price', 'line_total', 'subtotal', 'total')",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    assert!(rows.len() >= 8);
    for (table, column, data_type) in &rows {
        assert_eq!(data_type, "numeric", "{table}.{column} should be numeric");
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_health_check(pool: PgPool) {
    bazaar_db::health_check(&pool).await.unwrap();
}
