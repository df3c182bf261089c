//! # Schema Management
//!
//! The inventory has one table and one schema version. There is no
//! migration chain: a database whose version differs from
//! [`SCHEMA_VERSION`] is wiped and rebuilt.
//!
//! ## How It Works
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Schema Check on Startup                            │
//! │                                                                         │
//! │  App Startup                                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PRAGMA user_version                                                   │
//! │       │                                                                 │
//! │       ├── == SCHEMA_VERSION ──► CREATE TABLE IF NOT EXISTS, done       │
//! │       │                                                                 │
//! │       ├── == 0 (fresh file) ──► create table                           │
//! │       │                                                                 │
//! │       └── anything else ──────► DROP TABLE items (data is lost!)       │
//! │                                  create table                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PRAGMA user_version = SCHEMA_VERSION                                  │
//! │                                                                         │
//! │  All of the above runs in one transaction.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Changing the Schema
//!
//! 1. Edit [`CREATE_ITEMS_TABLE`]
//! 2. Bump [`SCHEMA_VERSION`]
//! 3. Existing installs lose their items on next start. That is accepted.

use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};

/// Current schema version, stored in `PRAGMA user_version`.
pub const SCHEMA_VERSION: i64 = 1;

/// DDL for the items table.
///
/// `AUTOINCREMENT` keeps ids of deleted rows from being handed out again.
pub const CREATE_ITEMS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS items (
        id       INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
        name     TEXT    NOT NULL,
        price    REAL    NOT NULL,
        quantity INTEGER NOT NULL
    )
"#;

/// Brings the schema to [`SCHEMA_VERSION`], recreating the table if needed.
///
/// ## Safety
/// - Idempotent: safe to run multiple times
/// - Transactional: a failure leaves the previous schema untouched
/// - Destructive on version mismatch
pub async fn ensure_schema(pool: &SqlitePool) -> DbResult<()> {
    info!("Checking schema version");

    let mut tx = pool.begin().await.map_err(migration_error)?;

    let current = read_user_version(&mut tx).await?;
    debug!(current, expected = SCHEMA_VERSION, "Schema version read");

    if current != SCHEMA_VERSION {
        if current != 0 {
            warn!(
                current,
                expected = SCHEMA_VERSION,
                "Schema version mismatch, dropping and recreating items table"
            );
        }
        sqlx::query("DROP TABLE IF EXISTS items")
            .execute(&mut *tx)
            .await
            .map_err(migration_error)?;
    }

    sqlx::query(CREATE_ITEMS_TABLE)
        .execute(&mut *tx)
        .await
        .map_err(migration_error)?;

    // PRAGMA does not accept bound parameters.
    sqlx::query(&format!("PRAGMA user_version = {}", SCHEMA_VERSION))
        .execute(&mut *tx)
        .await
        .map_err(migration_error)?;

    tx.commit().await.map_err(migration_error)?;

    info!(version = SCHEMA_VERSION, "Schema ready");
    Ok(())
}

/// Returns `(expected_version, current_version)` for diagnostics.
pub async fn schema_status(pool: &SqlitePool) -> DbResult<(i64, i64)> {
    let current: i64 = sqlx::query_scalar("PRAGMA user_version")
        .fetch_one(pool)
        .await?;

    Ok((SCHEMA_VERSION, current))
}

async fn read_user_version(tx: &mut Transaction<'_, Sqlite>) -> DbResult<i64> {
    sqlx::query_scalar("PRAGMA user_version")
        .fetch_one(&mut **tx)
        .await
        .map_err(migration_error)
}

fn migration_error(err: sqlx::Error) -> DbError {
    DbError::SchemaFailed(err.to_string())
}
