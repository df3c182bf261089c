//! # Repository Module
//!
//! The only interface consumers of the inventory depend on.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  Consumer (entry form, list screen, ...)                               │
//! │       │                                                                 │
//! │       │  repo.insert_item(&item)                                       │
//! │       ▼                                                                 │
//! │  dyn ItemsRepository                                                   │
//! │  ├── get_all_items_stream()                                            │
//! │  ├── get_item_stream(id)                                               │
//! │  ├── insert_item(item)                                                 │
//! │  ├── delete_item(item)                                                 │
//! │  └── update_item(item)                                                 │
//! │       │                                                                 │
//! │       ├──► OfflineItemsRepository ──► ItemStore ──► SQLite             │
//! │       └──► InMemoryItemsRepository ──► BTreeMap (tests, demos)         │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • Consumers never see sqlx                                            │
//! │  • Storage engine can be swapped without touching consumers            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Implementations add no validation or business rules: every method maps
//! to exactly one store operation.

pub mod memory;
pub mod offline;

use async_trait::async_trait;

use crate::error::DbResult;
use crate::live::LiveQuery;
use inventory_core::{Item, ItemId};

pub use memory::InMemoryItemsRepository;
pub use offline::OfflineItemsRepository;

/// Domain-level access to stored items.
#[async_trait]
pub trait ItemsRepository: Send + Sync {
    /// Live list of all items, ordered by name.
    fn get_all_items_stream(&self) -> LiveQuery<Vec<Item>>;

    /// Live view of one item; `None` while it does not exist.
    fn get_item_stream(&self, id: ItemId) -> LiveQuery<Option<Item>>;

    /// Inserts an item.
    ///
    /// `Ok(None)` if nothing was stored: the id is already taken, or the
    /// price is NaN (which SQLite turns into a refused NULL).
    async fn insert_item(&self, item: &Item) -> DbResult<Option<ItemId>>;

    /// Deletes an item by id. `Ok(false)` if it did not exist.
    async fn delete_item(&self, item: &Item) -> DbResult<bool>;

    /// Replaces an item by id. `Ok(false)` if it did not exist.
    async fn update_item(&self, item: &Item) -> DbResult<bool>;
}
