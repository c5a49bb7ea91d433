//! Repository for the `users` table.

use bazaar_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::user::{CreateUser, UpdateUser, User, UserListParams};
use crate::{clamp_limit, clamp_offset};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, email, password_hash, role, is_active, \
                        last_login_at, failed_login_count, locked_until, created_at, updated_at";

/// Provides CRUD operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (name, email, password_hash, role)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(input.name.trim())
            .bind(input.email.trim())
            .bind(&input.password_hash)
            .bind(&input.role)
            .fetch_one(pool)
            .await
    }

    /// Find a user by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by email (case-insensitive).
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)");
        sqlx::query_as::<_, User>(&query)
            .bind(email.trim())
            .fetch_optional(pool)
            .await
    }

    /// List users, newest first, with optional role and text filters.
    pub async fn list(pool: &PgPool, params: &UserListParams) -> Result<Vec<User>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM users
             WHERE ($1::TEXT IS NULL OR role = $1)
               AND ($2::TEXT IS NULL OR name ILIKE $2 OR email ILIKE $2)
             ORDER BY created_at DESC, id DESC
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(params.role.as_deref())
            .bind(params.q.as_deref().map(|q| format!("%{}%", q.trim())))
            .bind(clamp_limit(params.limit))
            .bind(clamp_offset(params.offset))
            .fetch_all(pool)
            .await
    }

    /// Ids of all active admins (notification fan-out).
    pub async fn list_active_admin_ids(pool: &PgPool) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar("SELECT id FROM users WHERE role = 'admin' AND is_active = true")
            .fetch_all(pool)
            .await
    }

    /// Update a user. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateUser,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET
                name = COALESCE($2, name),
                role = COALESCE($3, role),
                is_active = COALESCE($4, is_active)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(input.name.as_deref().map(str::trim))
            .bind(input.role.as_deref())
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Soft-deactivate a user by setting `is_active = false`.
    ///
    /// Returns `true` if the row was updated.
    pub async fn deactivate(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE users SET is_active = false WHERE id = $1 AND is_active = true")
                .bind(id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Increment the failed login counter by 1, returning the new count.
    pub async fn increment_failed_login(pool: &PgPool, id: DbId) -> Result<i32, sqlx::Error> {
        sqlx::query_scalar(
            "UPDATE users SET failed_login_count = failed_login_count + 1
             WHERE id = $1
             RETURNING failed_login_count",
        )
        .bind(id)
        .fetch_one(pool)
        .await
    }

    /// Lock a user account until the specified timestamp.
    pub async fn lock_account(
        pool: &PgPool,
        id: DbId,
        until: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET locked_until = $2 WHERE id = $1")
            .bind(id)
            .bind(until)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Record a successful login: reset `failed_login_count` to 0, clear `locked_until`,
    /// and set `last_login_at` to now.
    pub async fn record_successful_login(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET
                failed_login_count = 0,
                locked_until = NULL,
                last_login_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Update a user's password hash. Returns `true` if the row was updated.
    pub async fn update_password(
        pool: &PgPool,
        id: DbId,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
