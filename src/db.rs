use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use crate::error::ApiError;

/// Type alias for the PostgreSQL connection pool
pub type DbPool = PgPool;

/// Creates and configures a PostgreSQL connection pool
///
/// # Arguments
/// * `database_url` - PostgreSQL connection string
///
/// # Returns
/// * `Result<DbPool>` - Configured connection pool or error
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    tracing::debug!("Creating database connection pool");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(3))
        .connect(database_url)
        .await?;

    tracing::info!("Database connection pool created successfully");
    Ok(pool)
}

/// Check if a product with the given name already exists
pub async fn check_duplicate_product(pool: &PgPool, name: &str) -> Result<bool, ApiError> {
    tracing::debug!("Checking for duplicate product: {}", name);

    let exists: Option<bool> =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM products WHERE name = $1)")
            .bind(name)
            .fetch_one(pool)
            .await?;

    Ok(exists.unwrap_or(false))
}

/// Check if a product with the given name exists, excluding a specific ID
/// Used by update operations so a product can keep its own name
pub async fn check_duplicate_product_excluding_id(
    pool: &PgPool,
    name: &str,
    exclude_id: i32,
) -> Result<bool, ApiError> {
    let exists: Option<bool> =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM products WHERE name = $1 AND id != $2)")
            .bind(name)
            .bind(exclude_id)
            .fetch_one(pool)
            .await?;

    Ok(exists.unwrap_or(false))
}

/// Check if a category with the given name already exists
pub async fn check_duplicate_category(pool: &PgPool, name: &str) -> Result<bool, ApiError> {
    let exists: Option<bool> =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categories WHERE name = $1)")
            .bind(name)
            .fetch_one(pool)
            .await?;

    Ok(exists.unwrap_or(false))
}
