//! Category and subcategory models.

use bazaar_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Category {
    pub id: DbId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Category with the number of publicly visible products in it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CategoryWithCount {
    pub id: DbId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub product_count: i64,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Subcategory {
    pub id: DbId,
    pub category_id: DbId,
    pub name: String,
    pub slug: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Subcategory joined with its parent name, for the "all subcategories" listing.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SubcategoryWithParent {
    pub id: DbId,
    pub category_id: DbId,
    pub category_name: String,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateCategory {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCategory {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSubcategory {
    pub category_id: DbId,
    pub name: String,
}
