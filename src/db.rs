use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use tracing::info;

use crate::include_res;

pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let db_pool = SqlitePoolOptions::new()
        .max_connections(16)
        .connect(database_url)
        .await?;
    migrate(&db_pool).await?;
    Ok(db_pool)
}

/// Creates tables and the `profile_overview` view when missing.
pub async fn migrate(db_pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(include_res!(str, "/schema.sql"))
        .execute(db_pool)
        .await?;
    info!("schema ready");
    Ok(())
}

/// A private in-memory database; one connection so every query sees the same data.
pub async fn memory_pool() -> Result<SqlitePool, sqlx::Error> {
    let db_pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;
    migrate(&db_pool).await?;
    Ok(db_pool)
}
