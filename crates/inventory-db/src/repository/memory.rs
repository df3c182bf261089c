//! # In-Memory Items Repository
//!
//! [`ItemsRepository`] with no database behind it. Same contract as the
//! SQLite-backed repository: duplicate-id inserts are skipped, generated ids
//! are never reused, "all items" is ordered by name, and every change wakes
//! live queries.
//!
//! SQLite quirks are mirrored too: a generated id past `i64::MAX` is
//! `StorageFull`, and a NaN price (stored by SQLite as NULL, which the
//! `NOT NULL` column refuses) makes an insert a silent skip and an update
//! a `QueryFailed`.
//!
//! Useful for consumers' tests and for demos that should not touch disk.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::live::{ChangeTracker, LiveQuery};
use crate::repository::ItemsRepository;
use inventory_core::{sort_by_name, Item, ItemId, UNASSIGNED_ID};

#[derive(Debug, Default)]
struct MemoryState {
    items: BTreeMap<ItemId, Item>,
    /// Highest id ever stored; generated ids continue from here.
    high_water: ItemId,
}

impl MemoryState {
    fn snapshot(&self) -> Vec<Item> {
        let mut items: Vec<Item> = self.items.values().cloned().collect();
        sort_by_name(&mut items);
        items
    }
}

/// Repository holding items in process memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryItemsRepository {
    state: Arc<RwLock<MemoryState>>,
    changes: ChangeTracker,
}

impl InMemoryItemsRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ItemsRepository for InMemoryItemsRepository {
    fn get_all_items_stream(&self) -> LiveQuery<Vec<Item>> {
        let state = self.state.clone();
        LiveQuery::new(self.changes.register(), move || {
            let state = state.clone();
            async move { Ok(state.read().await.snapshot()) }
        })
    }

    fn get_item_stream(&self, id: ItemId) -> LiveQuery<Option<Item>> {
        let state = self.state.clone();
        LiveQuery::new(self.changes.register(), move || {
            let state = state.clone();
            async move { Ok(state.read().await.items.get(&id).cloned()) }
        })
    }

    async fn insert_item(&self, item: &Item) -> DbResult<Option<ItemId>> {
        let mut state = self.state.write().await;

        let id = if item.id == UNASSIGNED_ID {
            state
                .high_water
                .checked_add(1)
                .ok_or_else(|| DbError::StorageFull("no item ids left".into()))?
        } else {
            item.id
        };

        if item.price.is_nan() {
            debug!(id, "Insert ignored, price is not a number");
            return Ok(None);
        }

        if state.items.contains_key(&id) {
            debug!(id, "Insert ignored, id already present");
            return Ok(None);
        }

        let mut stored = item.clone();
        stored.id = id;
        state.items.insert(id, stored);
        state.high_water = state.high_water.max(id);
        self.changes.notify_commit();

        Ok(Some(id))
    }

    async fn delete_item(&self, item: &Item) -> DbResult<bool> {
        let mut state = self.state.write().await;

        if state.items.remove(&item.id).is_none() {
            return Ok(false);
        }
        self.changes.notify_commit();

        Ok(true)
    }

    async fn update_item(&self, item: &Item) -> DbResult<bool> {
        let mut state = self.state.write().await;

        match state.items.get_mut(&item.id) {
            Some(_) if item.price.is_nan() => {
                return Err(DbError::QueryFailed(
                    "NOT NULL constraint failed: items.price".into(),
                ));
            }
            Some(stored) => {
                *stored = item.clone();
            }
            None => return Ok(false),
        }
        self.changes.notify_commit();

        Ok(true)
    }
}
