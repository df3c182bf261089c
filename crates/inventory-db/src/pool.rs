//! # Database Handle
//!
//! Opens the SQLite file (or a private in-memory database), makes sure the
//! items table matches the current schema, and owns the single
//! [`ItemStore`] that every repository built on this handle shares.
//!
//! ## Open Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Database::new(config)                           │
//! │                                                                         │
//! │  DbConfig                                                              │
//! │   ├── ":memory:" ──► sqlite::memory:, one connection, never recycled   │
//! │   └── file path ───► mkdir -p parent, create file if missing           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  journal_mode = WAL, synchronous = NORMAL                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SqlitePool (min..=max connections)                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  schema::ensure_schema  (skipped when check_schema = false)            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ItemStore ── cloned out by items(), one change registry per handle    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! WAL lets live-query re-reads run while a write is in flight.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::InventoryConfig;
use crate::error::{DbError, DbResult};
use crate::schema;
use crate::store::ItemStore;

/// Path value that selects a private in-memory database.
pub const IN_MEMORY_PATH: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// Where the items live and how many connections may reach them.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/inventory/inventory.db")
///     .max_connections(4)
///     .connect_timeout(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DbConfig {
    /// Database file, or [`IN_MEMORY_PATH`].
    pub database_path: PathBuf,

    /// Upper bound on pooled connections. Default: 5
    pub max_connections: u32,

    /// Connections kept open while idle. Default: 1
    pub min_connections: u32,

    /// How long an operation waits for a free connection. Default: 30s
    pub connect_timeout: Duration,

    /// Idle connections above `min_connections` are closed after this.
    /// Default: 10 minutes
    pub idle_timeout: Duration,

    /// Verify (and if needed recreate) the schema when opening.
    /// Default: true
    pub check_schema: bool,
}

impl DbConfig {
    /// Configuration for a database file at `path`.
    ///
    /// ## Arguments
    /// * `path` - Database file; it and its parent directories are created
    ///   on open if missing. [`IN_MEMORY_PATH`] selects an in-memory database.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(10 * 60),
            check_schema: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Turns the schema check on open on or off.
    pub fn check_schema(mut self, check: bool) -> Self {
        self.check_schema = check;
        self
    }

    /// A private, throwaway database.
    ///
    /// Every [`Database`] opened from this config is independent of every
    /// other one, which is what tests want:
    /// ```rust,ignore
    /// let db = Database::new(DbConfig::in_memory()).await?;
    /// ```
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(IN_MEMORY_PATH),
            // Each connection would see its own empty database.
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            check_schema: true,
        }
    }

    /// True if this config selects an in-memory database.
    pub fn is_in_memory(&self) -> bool {
        self.database_path == Path::new(IN_MEMORY_PATH)
    }
}

fn connect_options(config: &DbConfig) -> DbResult<SqliteConnectOptions> {
    let options = if config.is_in_memory() {
        SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
    } else {
        if let Some(parent) = config.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    DbError::ConnectionFailed(format!("cannot create {}: {}", parent.display(), e))
                })?;
            }
        }
        SqliteConnectOptions::new()
            .filename(&config.database_path)
            .create_if_missing(true)
    };

    Ok(options
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal))
}

fn pool_options(config: &DbConfig) -> SqlitePoolOptions {
    let options = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.connect_timeout);

    if config.is_in_memory() {
        // Closing the last connection would discard every item.
        options.idle_timeout(None).max_lifetime(None)
    } else {
        options.idle_timeout(Some(config.idle_timeout))
    }
}

// =============================================================================
// Database
// =============================================================================

/// Open database: the pool plus the store over the items table.
///
/// ## Usage
/// ```rust,ignore
/// let db = Database::new(DbConfig::new("./inventory.db")).await?;
/// let mut items = db.items().query_all();
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,

    /// Shared by every `items()` caller so their live queries see each
    /// other's writes.
    items: ItemStore,
}

impl Database {
    /// Opens the database described by `config`.
    ///
    /// ## Returns
    /// * `Ok(Database)` - Pool connected, schema current
    /// * `Err(DbError::ConnectionFailed)` - File or directory unusable
    /// * `Err(DbError::SchemaFailed)` - Schema check or recreation failed
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            in_memory = config.is_in_memory(),
            "Opening inventory database"
        );

        let pool = pool_options(&config)
            .connect_with(connect_options(&config)?)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        debug!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            "Pool connected"
        );

        if config.check_schema {
            schema::ensure_schema(&pool).await?;
        }

        let items = ItemStore::new(pool.clone());

        Ok(Database { pool, items })
    }

    /// Opens the database described by a loaded [`InventoryConfig`].
    ///
    /// ## Returns
    /// * `Err(DbError::Config)` - The settings are invalid or no default
    ///   data directory exists; nothing was opened
    /// * Otherwise as [`Database::new`]
    pub async fn open(config: &InventoryConfig) -> DbResult<Self> {
        config.validate()?;
        Database::new(config.to_db_config()?).await
    }

    /// Runs the schema check by hand (for configs with `check_schema` off).
    pub async fn ensure_schema(&self) -> DbResult<()> {
        schema::ensure_schema(&self.pool).await
    }

    /// Returns `(expected_version, current_version)` of the schema.
    pub async fn schema_status(&self) -> DbResult<(i64, i64)> {
        schema::schema_status(&self.pool).await
    }

    /// Raw pool, for diagnostics.
    ///
    /// Writes that bypass [`ItemStore`] are invisible to live queries.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// The store over the items table. Every call returns the same store.
    pub fn items(&self) -> ItemStore {
        self.items.clone()
    }

    /// Closes the pool.
    ///
    /// Store calls fail afterwards; open live queries yield an error on
    /// their next re-evaluation and end.
    pub async fn close(&self) {
        info!("Closing inventory database");
        self.pool.close().await;
    }

    /// True if a trivial query succeeds.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
