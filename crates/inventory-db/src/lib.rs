//! # inventory-db: Local Storage for Inventory Items
//!
//! This crate stores inventory items in a local SQLite database and serves
//! them back as live queries that re-emit whenever the table changes.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Inventory Data Flow                              │
//! │                                                                         │
//! │  UI layer (list screen, entry form, details screen)                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   inventory-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │  Container    │    │  Repository   │    │  ItemStore   │  │   │
//! │  │   │(container.rs) │───►│ (repository/) │───►│  (store.rs)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ get_repository│    │ ItemsRepo     │    │ insert/update│  │   │
//! │  │   │ lazy, once    │    │ 5 operations  │    │ delete/query │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────┬───────┘  │   │
//! │  │                                                    │          │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────▼───────┐  │   │
//! │  │   │   Database    │    │    Schema     │    │ ChangeTracker│  │   │
//! │  │   │   (pool.rs)   │    │  (schema.rs)  │    │  (live.rs)   │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   <platform data dir>/inventory.db   (table: items)            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`schema`] - Schema versioning and destructive recreation
//! - [`store`] - Item statements and live queries
//! - [`live`] - Change notification and the live query stream
//! - [`repository`] - The consumer-facing repository trait and backends
//! - [`container`] - Lazy, process-wide repository access
//! - [`config`] - TOML and environment configuration
//! - [`error`] - Database error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use futures_util::StreamExt;
//! use inventory_db::{get_repository, DbConfig};
//!
//! let repo = get_repository(&DbConfig::new("./inventory.db")).await?;
//! repo.insert_item(&Item::new("Apples", 10.0, 20)).await?;
//!
//! let mut items = repo.get_all_items_stream();
//! while let Some(snapshot) = items.next().await {
//!     render(snapshot?);
//! }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod container;
pub mod error;
pub mod live;
pub mod pool;
pub mod repository;
pub mod schema;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, InventoryConfig};
pub use container::{app_container, get_repository, AppContainer, AppDataContainer};
pub use error::{DbError, DbResult};
pub use live::{ChangeTracker, LiveQuery};
pub use pool::{Database, DbConfig};
pub use store::ItemStore;

// Repository re-exports for convenience
pub use repository::{InMemoryItemsRepository, ItemsRepository, OfflineItemsRepository};
