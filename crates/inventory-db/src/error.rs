//! # Error Types
//!
//! Everything that can go wrong below the repository surface.
//!
//! ## Where Errors Surface
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sqlx::Error ──► DbError::from (classified by SQLite result code)      │
//! │                      │                                                  │
//! │                      ├──► Err from insert_item / update_item /         │
//! │                      │    delete_item                                   │
//! │                      └──► final Err item of a live query stream        │
//! │                                                                         │
//! │  ConfigError ──► DbError::Config (Database::open with bad settings)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## What Is NOT an Error
//! - Inserting an id that already exists: the insert is skipped
//! - Updating or deleting an id that does not exist: nothing changes
//! - Querying an id that does not exist: the live query yields `None`

use thiserror::Error;

use crate::config::ConfigError;

/// Storage failure, surfaced to the caller unchanged.
///
/// Nothing in this crate retries.
#[derive(Debug, Error)]
pub enum DbError {
    /// The database could not be opened, or the pool is closed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Reading `PRAGMA user_version` or rebuilding the items table failed.
    #[error("Schema setup failed: {0}")]
    SchemaFailed(String),

    /// A statement was rejected by SQLite.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// The disk (or the configured size limit) is full.
    #[error("Storage full: {0}")]
    StorageFull(String),

    /// The database file is damaged or is not a database.
    #[error("Database corrupted: {0}")]
    Corrupted(String),

    /// Low-level I/O failure below SQLite.
    #[error("Storage I/O error: {0}")]
    StorageIo(String),

    /// No connection became free within `connect_timeout`.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Anything sqlx reports that fits no other variant.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Returns true if this error came from the storage engine itself
    /// rather than from configuration.
    pub fn is_storage_failure(&self) -> bool {
        !matches!(self, DbError::Config(_))
    }
}

// SQLite primary result codes (extended codes share the low byte).
const SQLITE_CORRUPT: i32 = 11;
const SQLITE_FULL: i32 = 13;
const SQLITE_NOTADB: i32 = 26;

/// ## Mapping
/// ```text
/// sqlx::Error::Database (SQLITE_FULL)        → DbError::StorageFull
/// sqlx::Error::Database (CORRUPT / NOTADB)   → DbError::Corrupted
/// sqlx::Error::Database (other)              → DbError::QueryFailed
/// sqlx::Error::Io                            → DbError::StorageIo
/// sqlx::Error::PoolTimedOut                  → DbError::PoolExhausted
/// sqlx::Error::PoolClosed                    → DbError::ConnectionFailed
/// Other                                      → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                let primary = db_err
                    .code()
                    .and_then(|code| code.parse::<i32>().ok())
                    .map(|code| code & 0xff);

                match primary {
                    Some(SQLITE_FULL) => DbError::StorageFull(message),
                    Some(SQLITE_CORRUPT) | Some(SQLITE_NOTADB) => DbError::Corrupted(message),
                    _ => DbError::QueryFailed(message),
                }
            }

            sqlx::Error::Io(io_err) => DbError::StorageIo(io_err.to_string()),
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("database is closed".into()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

pub type DbResult<T> = Result<T, DbError>;
