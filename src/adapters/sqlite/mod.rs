//! SQLite adapters for the session database.

pub mod connection;
pub mod migrations;
pub mod session_store;

pub use connection::{create_pool, create_test_pool, ConnectionError};
pub use migrations::{Migration, MigrationError, Migrator};
pub use session_store::SqliteSessionStore;

use sqlx::SqlitePool;

/// In-memory pool with the schema applied, for tests.
pub async fn create_migrated_test_pool() -> anyhow::Result<SqlitePool> {
    let pool = create_test_pool().await?;
    Migrator::new(pool.clone()).run().await?;
    Ok(pool)
}
