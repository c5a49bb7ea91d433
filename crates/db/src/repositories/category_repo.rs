//! Repository for the `categories` and `subcategories` tables.

use bazaar_core::types::DbId;
use sqlx::PgPool;

use crate::models::category::{
    Category, CategoryWithCount, Subcategory, SubcategoryWithParent,
};

const COLUMNS: &str = "id, name, slug, description, created_at, updated_at";
const SUB_COLUMNS: &str = "id, category_id, name, slug, created_at, updated_at";

pub struct CategoryRepo;

impl CategoryRepo {
    pub async fn create(
        pool: &PgPool,
        name: &str,
        slug: &str,
        description: Option<&str>,
    ) -> Result<Category, sqlx::Error> {
        let query = format!(
            "INSERT INTO categories (name, slug, description) VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Category>(&query)
            .bind(name)
            .bind(slug)
            .bind(description)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Category>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM categories WHERE id = $1");
        sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All categories by name, each with its count of approved products.
    pub async fn list_with_counts(pool: &PgPool) -> Result<Vec<CategoryWithCount>, sqlx::Error> {
        sqlx::query_as::<_, CategoryWithCount>(
            "SELECT c.id, c.name, c.slug, c.description,
                    COUNT(p.id) AS product_count
             FROM categories c
             LEFT JOIN products p ON p.category_id = c.id AND p.status = 'approved'
             GROUP BY c.id
             ORDER BY c.name",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        name: Option<&str>,
        slug: Option<&str>,
        description: Option<&str>,
    ) -> Result<Option<Category>, sqlx::Error> {
        let query = format!(
            "UPDATE categories SET
                name = COALESCE($2, name),
                slug = COALESCE($3, slug),
                description = COALESCE($4, description)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .bind(name)
            .bind(slug)
            .bind(description)
            .fetch_optional(pool)
            .await
    }

    /// Delete a category. Subcategories cascade; products keep a NULL category.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Subcategories
    // -----------------------------------------------------------------------

    pub async fn create_subcategory(
        pool: &PgPool,
        category_id: DbId,
        name: &str,
        slug: &str,
    ) -> Result<Subcategory, sqlx::Error> {
        let query = format!(
            "INSERT INTO subcategories (category_id, name, slug) VALUES ($1, $2, $3)
             RETURNING {SUB_COLUMNS}"
        );
        sqlx::query_as::<_, Subcategory>(&query)
            .bind(category_id)
            .bind(name)
            .bind(slug)
            .fetch_one(pool)
            .await
    }

    pub async fn find_subcategory(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<Subcategory>, sqlx::Error> {
        let query = format!("SELECT {SUB_COLUMNS} FROM subcategories WHERE id = $1");
        sqlx::query_as::<_, Subcategory>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_subcategories(
        pool: &PgPool,
        category_id: DbId,
    ) -> Result<Vec<Subcategory>, sqlx::Error> {
        let query = format!(
            "SELECT {SUB_COLUMNS} FROM subcategories WHERE category_id = $1 ORDER BY name"
        );
        sqlx::query_as::<_, Subcategory>(&query)
            .bind(category_id)
            .fetch_all(pool)
            .await
    }

    /// Every subcategory with its parent's name, grouped by parent.
    pub async fn list_all_subcategories(
        pool: &PgPool,
    ) -> Result<Vec<SubcategoryWithParent>, sqlx::Error> {
        sqlx::query_as::<_, SubcategoryWithParent>(
            "SELECT s.id, s.category_id, c.name AS category_name, s.name, s.slug
             FROM subcategories s
             JOIN categories c ON c.id = s.category_id
             ORDER BY c.name, s.name",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn delete_subcategory(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM subcategories WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
