//! # Item Store
//!
//! Typed statements against the `items` table, plus live queries.
//!
//! ## Statement Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Operation        SQL                                      Notifies?    │
//! │  ───────────────  ───────────────────────────────────────  ──────────   │
//! │  insert           INSERT OR IGNORE ... NULLIF(id, 0)       if inserted  │
//! │  update           UPDATE items SET ... WHERE id = ?        if matched   │
//! │  delete           DELETE FROM items WHERE id = ?           if matched   │
//! │  query_all        SELECT ... ORDER BY name ASC             (live)       │
//! │  query_by_id      SELECT ... WHERE id = ?                  (live)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Conflict Policy
//! Inserting an id that already exists is skipped, not upserted. A form
//! submitted twice must not overwrite the first save.

use std::sync::Arc;

use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::DbResult;
use crate::live::{ChangeTracker, LiveQuery};
use inventory_core::{Item, ItemId};

const SELECT_ALL: &str = r#"
    SELECT id, name, price, quantity
    FROM items
    ORDER BY name ASC, id ASC
"#;

const SELECT_BY_ID: &str = r#"
    SELECT id, name, price, quantity
    FROM items
    WHERE id = ?1
"#;

/// Store for the items table.
///
/// Clones share the pool, the write lock and the live-query registry, so
/// a mutation through any clone wakes subscribers of every clone.
#[derive(Debug, Clone)]
pub struct ItemStore {
    pool: SqlitePool,
    changes: ChangeTracker,
    /// One mutation (statement + notification) at a time.
    write_lock: Arc<Mutex<()>>,
}

impl ItemStore {
    /// Creates a store over an pool whose schema is current.
    pub fn new(pool: SqlitePool) -> Self {
        ItemStore {
            pool,
            changes: ChangeTracker::new(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Inserts an item.
    ///
    /// ## Returns
    /// * `Ok(Some(id))` - Inserted; `id` is the assigned or supplied id
    /// * `Ok(None)` - Nothing changed: the id is taken, or a column would be
    ///   NULL (SQLite stores a NaN price as NULL, and `OR IGNORE` skips the
    ///   `NOT NULL` violation)
    /// * `Err(DbError::StorageFull)` - No generated id is left after `i64::MAX`
    pub async fn insert(&self, item: &Item) -> DbResult<Option<ItemId>> {
        let _guard = self.write_lock.lock().await;

        debug!(id = item.id, name = %item.name, "Inserting item");

        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO items (id, name, price, quantity)
            VALUES (NULLIF(?1, 0), ?2, ?3, ?4)
            "#,
        )
        .bind(item.id)
        .bind(&item.name)
        .bind(item.price)
        .bind(item.quantity)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            debug!(id = item.id, "Insert ignored, id already present");
            return Ok(None);
        }

        let id = result.last_insert_rowid();
        self.changes.notify_commit();

        Ok(Some(id))
    }

    /// Replaces every field of the item with the same id.
    ///
    /// ## Returns
    /// * `Ok(true)` - Item updated
    /// * `Ok(false)` - No item with that id; nothing changed
    /// * `Err(DbError::QueryFailed)` - A NaN price hit the `NOT NULL` column
    pub async fn update(&self, item: &Item) -> DbResult<bool> {
        let _guard = self.write_lock.lock().await;

        debug!(id = item.id, "Updating item");

        let result = sqlx::query(
            r#"
            UPDATE items SET
                name = ?2,
                price = ?3,
                quantity = ?4
            WHERE id = ?1
            "#,
        )
        .bind(item.id)
        .bind(&item.name)
        .bind(item.price)
        .bind(item.quantity)
        .execute(&self.pool)
        .await?;

        Ok(self.finish_write(result.rows_affected(), item.id))
    }

    /// Deletes the item with the same id as `item`.
    ///
    /// ## Returns
    /// * `Ok(true)` - Item deleted
    /// * `Ok(false)` - No item with that id; nothing changed
    pub async fn delete(&self, item: &Item) -> DbResult<bool> {
        let _guard = self.write_lock.lock().await;

        debug!(id = item.id, "Deleting item");

        let result = sqlx::query("DELETE FROM items WHERE id = ?1")
            .bind(item.id)
            .execute(&self.pool)
            .await?;

        Ok(self.finish_write(result.rows_affected(), item.id))
    }

    fn finish_write(&self, rows_affected: u64, id: ItemId) -> bool {
        if rows_affected == 0 {
            debug!(id, "No item with this id, nothing changed");
            return false;
        }
        self.changes.notify_commit();
        true
    }

    /// Live list of all items, ordered by name.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let mut items = store.query_all();
    /// while let Some(snapshot) = items.next().await {
    ///     render(snapshot?);
    /// }
    /// ```
    pub fn query_all(&self) -> LiveQuery<Vec<Item>> {
        let pool = self.pool.clone();
        LiveQuery::new(self.changes.register(), move || {
            let pool = pool.clone();
            async move { fetch_all(&pool).await }
        })
    }

    /// Live view of one item; yields `None` while it does not exist.
    pub fn query_by_id(&self, id: ItemId) -> LiveQuery<Option<Item>> {
        let pool = self.pool.clone();
        LiveQuery::new(self.changes.register(), move || {
            let pool = pool.clone();
            async move { fetch_by_id(&pool, id).await }
        })
    }

    /// One-shot read of all items, ordered by name.
    pub async fn get_all(&self) -> DbResult<Vec<Item>> {
        fetch_all(&self.pool).await
    }

    /// One-shot read of a single item.
    pub async fn get_by_id(&self, id: ItemId) -> DbResult<Option<Item>> {
        fetch_by_id(&self.pool, id).await
    }

    /// Counts stored items (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Number of live queries currently open on this store.
    pub fn subscriber_count(&self) -> usize {
        self.changes.subscriber_count()
    }
}

async fn fetch_all(pool: &SqlitePool) -> DbResult<Vec<Item>> {
    let items = sqlx::query_as::<_, Item>(SELECT_ALL)
        .fetch_all(pool)
        .await?;

    Ok(items)
}

async fn fetch_by_id(pool: &SqlitePool, id: ItemId) -> DbResult<Option<Item>> {
    let item = sqlx::query_as::<_, Item>(SELECT_BY_ID)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(item)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};
    use futures_util::StreamExt;
    use std::time::Duration;

    fn apples() -> Item {
        Item::with_id(1, "Apples", 10.0, 20)
    }

    fn bananas() -> Item {
        Item::with_id(2, "Bananas", 15.0, 97)
    }

    async fn store() -> ItemStore {
        Database::new(DbConfig::in_memory()).await.unwrap().items()
    }

    async fn add_two_items(store: &ItemStore) {
        store.insert(&apples()).await.unwrap();
        store.insert(&bananas()).await.unwrap();
    }

    async fn next<T: Send + 'static>(query: &mut LiveQuery<T>) -> T {
        tokio::time::timeout(Duration::from_secs(5), query.next())
            .await
            .expect("live query emission")
            .expect("stream still open")
            .expect("query ok")
    }

    #[tokio::test]
    async fn test_insert_then_query_all() {
        let store = store().await;
        store.insert(&apples()).await.unwrap();

        let mut all = store.query_all();
        assert_eq!(next(&mut all).await, vec![apples()]);
    }

    #[tokio::test]
    async fn test_query_all_returns_all_items() {
        let store = store().await;
        add_two_items(&store).await;

        let mut all = store.query_all();
        assert_eq!(next(&mut all).await, vec![apples(), bananas()]);
    }

    #[tokio::test]
    async fn test_query_by_id() {
        let store = store().await;
        add_two_items(&store).await;

        let mut one = store.query_by_id(1);
        assert_eq!(next(&mut one).await, Some(apples()));
    }

    #[tokio::test]
    async fn test_query_by_missing_id_yields_none() {
        let store = store().await;

        let mut one = store.query_by_id(42);
        assert_eq!(next(&mut one).await, None);
    }

    #[tokio::test]
    async fn test_update_round_trip() {
        let store = store().await;
        add_two_items(&store).await;

        assert!(store.update(&Item::with_id(1, "Apples", 15.0, 25)).await.unwrap());
        assert!(store.update(&Item::with_id(2, "Bananas", 5.0, 50)).await.unwrap());

        let mut all = store.query_all();
        let items = next(&mut all).await;
        assert_eq!(items[0], Item::with_id(1, "Apples", 15.0, 25));
        assert_eq!(items[1], Item::with_id(2, "Bananas", 5.0, 50));

        let mut one = store.query_by_id(1);
        assert_eq!(next(&mut one).await, Some(Item::with_id(1, "Apples", 15.0, 25)));
    }

    #[tokio::test]
    async fn test_delete_all_leaves_empty_list() {
        let store = store().await;
        add_two_items(&store).await;

        assert!(store.delete(&apples()).await.unwrap());
        assert!(store.delete(&bananas()).await.unwrap());

        let mut all = store.query_all();
        assert!(next(&mut all).await.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_id_insert_is_ignored() {
        let store = store().await;

        assert_eq!(store.insert(&apples()).await.unwrap(), Some(1));
        let imposter = Item::with_id(1, "Durian", 99.0, 1);
        assert_eq!(store.insert(&imposter).await.unwrap(), None);

        assert_eq!(store.get_all().await.unwrap(), vec![apples()]);
    }

    #[tokio::test]
    async fn test_unassigned_id_is_generated() {
        let store = store().await;

        let first = store.insert(&Item::new("Apples", 1.0, 1)).await.unwrap();
        let second = store.insert(&Item::new("Apples", 1.0, 1)).await.unwrap();

        assert_eq!(first, Some(1));
        assert_eq!(second, Some(2));
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_generated_ids_are_not_reused() {
        let store = store().await;

        let id = store.insert(&Item::new("Apples", 1.0, 1)).await.unwrap().unwrap();
        store.delete(&Item::with_id(id, "Apples", 1.0, 1)).await.unwrap();

        let next_id = store.insert(&Item::new("Apples", 1.0, 1)).await.unwrap().unwrap();
        assert!(next_id > id);
    }

    #[tokio::test]
    async fn test_update_missing_is_noop() {
        let store = store().await;
        store.insert(&apples()).await.unwrap();

        assert!(!store.update(&Item::with_id(9, "Ghost", 1.0, 1)).await.unwrap());
        assert_eq!(store.get_all().await.unwrap(), vec![apples()]);
    }

    #[tokio::test]
    async fn test_delete_missing_is_noop() {
        let store = store().await;
        store.insert(&apples()).await.unwrap();

        assert!(!store.delete(&Item::with_id(9, "Ghost", 1.0, 1)).await.unwrap());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_ordered_by_name_not_id() {
        let store = store().await;
        store.insert(&Item::with_id(1, "Cherries", 1.0, 1)).await.unwrap();
        store.insert(&Item::with_id(2, "Apples", 1.0, 1)).await.unwrap();
        store.insert(&Item::with_id(3, "Bananas", 1.0, 1)).await.unwrap();

        let mut all = store.query_all();
        let names: Vec<String> = next(&mut all).await.into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["Apples", "Bananas", "Cherries"]);
    }

    #[tokio::test]
    async fn test_live_query_follows_mutations() {
        let store = store().await;
        let mut all = store.query_all();
        assert!(next(&mut all).await.is_empty());

        store.insert(&bananas()).await.unwrap();
        assert_eq!(next(&mut all).await, vec![bananas()]);

        store.insert(&apples()).await.unwrap();
        assert_eq!(next(&mut all).await, vec![apples(), bananas()]);

        store.update(&Item::with_id(1, "Apples", 15.0, 25)).await.unwrap();
        assert_eq!(next(&mut all).await[0], Item::with_id(1, "Apples", 15.0, 25));

        store.delete(&apples()).await.unwrap();
        store.delete(&bananas()).await.unwrap();
        // Both deletes may arrive as one snapshot.
        let mut last = next(&mut all).await;
        while !last.is_empty() {
            last = next(&mut all).await;
        }
        assert!(last.is_empty());
    }

    #[tokio::test]
    async fn test_live_by_id_goes_absent_after_delete() {
        let store = store().await;
        store.insert(&apples()).await.unwrap();

        let mut one = store.query_by_id(1);
        assert_eq!(next(&mut one).await, Some(apples()));

        store.delete(&apples()).await.unwrap();
        assert_eq!(next(&mut one).await, None);
    }

    #[tokio::test]
    async fn test_id_space_exhausted_is_storage_full() {
        let store = store().await;

        assert_eq!(
            store.insert(&Item::with_id(i64::MAX, "Max", 1.0, 1)).await.unwrap(),
            Some(i64::MAX)
        );
        let err = store.insert(&Item::new("Next", 1.0, 1)).await.unwrap_err();
        assert!(matches!(err, DbError::StorageFull(_)));
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_nan_price_insert_is_skipped_and_update_fails() {
        let store = store().await;

        assert_eq!(store.insert(&Item::with_id(1, "Odd", f64::NAN, 1)).await.unwrap(), None);
        assert_eq!(store.count().await.unwrap(), 0);

        store.insert(&apples()).await.unwrap();
        let err = store
            .update(&Item::with_id(1, "Apples", f64::NAN, 20))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::QueryFailed(_)));
        assert_eq!(store.get_by_id(1).await.unwrap(), Some(apples()));
    }

    #[tokio::test]
    async fn test_ignored_writes_do_not_notify() {
        let store = store().await;
        store.insert(&apples()).await.unwrap();

        let mut all = store.query_all();
        next(&mut all).await;

        store.insert(&Item::with_id(1, "Durian", 1.0, 1)).await.unwrap();
        store.update(&Item::with_id(9, "Ghost", 1.0, 1)).await.unwrap();
        store.delete(&Item::with_id(9, "Ghost", 1.0, 1)).await.unwrap();

        let waited = tokio::time::timeout(Duration::from_millis(50), all.next()).await;
        assert!(waited.is_err());
    }

    #[tokio::test]
    async fn test_cancel_removes_subscription() {
        let store = store().await;
        let all = store.query_all();
        let one = store.query_by_id(1);
        assert_eq!(store.subscriber_count(), 2);

        all.cancel();
        drop(one);
        assert_eq!(store.subscriber_count(), 0);

        // Storage unaffected.
        store.insert(&apples()).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_inserts() {
        let store = store().await;

        let mut handles = Vec::new();
        for n in 0..20 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .insert(&Item::new(format!("Item {:02}", n), n as f64, n))
                    .await
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().unwrap().is_some());
        }

        let items = store.get_all().await.unwrap();
        assert_eq!(items.len(), 20);
        let mut ids: Vec<ItemId> = items.iter().map(|i| i.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 20);
    }

    #[tokio::test]
    async fn test_closed_pool_fails_live_query() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let store = db.items();
        db.close().await;

        let mut all = store.query_all();
        let first = all.next().await.unwrap();
        assert!(matches!(first, Err(DbError::ConnectionFailed(_))));
        assert!(all.next().await.is_none());
    }

    #[tokio::test]
    async fn test_closed_pool_fails_writes() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let store = db.items();
        db.close().await;

        let err = store.insert(&apples()).await.unwrap_err();
        assert!(err.is_storage_failure());
    }
}
