//! # Offline Items Repository
//!
//! [`ItemsRepository`] backed by the local SQLite [`ItemStore`].

use async_trait::async_trait;

use crate::error::DbResult;
use crate::live::LiveQuery;
use crate::repository::ItemsRepository;
use crate::store::ItemStore;
use inventory_core::{Item, ItemId};

/// Repository over the local database.
///
/// ## Usage
/// ```rust,ignore
/// let repo = OfflineItemsRepository::new(db.items());
/// repo.insert_item(&Item::new("Apples", 10.0, 20)).await?;
/// ```
#[derive(Debug, Clone)]
pub struct OfflineItemsRepository {
    store: ItemStore,
}

impl OfflineItemsRepository {
    /// Creates a repository over `store`.
    pub fn new(store: ItemStore) -> Self {
        OfflineItemsRepository { store }
    }
}

#[async_trait]
impl ItemsRepository for OfflineItemsRepository {
    fn get_all_items_stream(&self) -> LiveQuery<Vec<Item>> {
        self.store.query_all()
    }

    fn get_item_stream(&self, id: ItemId) -> LiveQuery<Option<Item>> {
        self.store.query_by_id(id)
    }

    async fn insert_item(&self, item: &Item) -> DbResult<Option<ItemId>> {
        self.store.insert(item).await
    }

    async fn delete_item(&self, item: &Item) -> DbResult<bool> {
        self.store.delete(item).await
    }

    async fn update_item(&self, item: &Item) -> DbResult<bool> {
        self.store.update(item).await
    }
}
