//! Database access for shiplabel-ingest
//!
//! SQLite persistence for address records, behind the [`AddressStore`] trait.

pub mod addresses;
pub mod migrations;

pub use addresses::{AddressStore, RecordFilter, RecordPatch, SortOrder, SqliteAddressStore};

use shiplabel_common::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool
///
/// Opens `<root>/shiplabel.db` (created if missing) and ensures the
/// addresses table exists.
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    let pool = shiplabel_common::db::init_database(db_path).await?;
    init_tables(&pool).await?;
    Ok(pool)
}

/// Single-connection in-memory pool with the full schema (tests, dry runs)
pub async fn init_memory_pool() -> Result<SqlitePool> {
    let pool = shiplabel_common::db::init_memory_database().await?;
    init_tables(&pool).await?;
    Ok(pool)
}

/// Create the addresses table and its scan index if they don't exist
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS addresses (
            id TEXT PRIMARY KEY,
            date TEXT NOT NULL,
            company_name TEXT NOT NULL DEFAULT '',
            contact_name TEXT NOT NULL DEFAULT '',
            street TEXT NOT NULL DEFAULT '',
            city TEXT NOT NULL DEFAULT '',
            state TEXT NOT NULL DEFAULT '',
            country TEXT NOT NULL DEFAULT '',
            zip_code TEXT NOT NULL DEFAULT '',
            mobile_number TEXT NOT NULL DEFAULT '',
            email TEXT NOT NULL DEFAULT '-',
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_addresses_created_at ON addresses (created_at)")
        .execute(pool)
        .await?;

    tracing::info!("Database tables initialized (settings, addresses)");

    Ok(())
}
