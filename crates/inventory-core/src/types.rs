//! # Domain Types
//!
//! The inventory tracks exactly one entity.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                            Item                                         │
//! │  ─────────────────────────────────────────────────────────────────────  │
//! │  id        i64   assigned by the store when left at UNASSIGNED_ID (0)  │
//! │  name      text  not unique, the sort key of "all items" queries       │
//! │  price     f64   no range enforced here                                │
//! │  quantity  i32   no range enforced here                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Range checks and string coercion belong to whoever builds the `Item`
//! from user input; nothing in this crate rejects a negative price.

use serde::{Deserialize, Serialize};

/// Identifier of a stored item.
pub type ItemId = i64;

/// Sentinel meaning "let the store pick the id".
pub const UNASSIGNED_ID: ItemId = 0;

// =============================================================================
// Item
// =============================================================================

/// A single inventory line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Item {
    /// Unique identifier, immutable once assigned.
    pub id: ItemId,

    /// Display name.
    pub name: String,

    /// Unit price.
    pub price: f64,

    /// Units on hand.
    pub quantity: i32,
}

impl Item {
    /// Creates an item with an unassigned id.
    pub fn new(name: impl Into<String>, price: f64, quantity: i32) -> Self {
        Item {
            id: UNASSIGNED_ID,
            name: name.into(),
            price,
            quantity,
        }
    }

    /// Creates an item with a caller-chosen id.
    pub fn with_id(id: ItemId, name: impl Into<String>, price: f64, quantity: i32) -> Self {
        Item {
            id,
            name: name.into(),
            price,
            quantity,
        }
    }

    /// Returns true once the item carries a real identifier.
    #[inline]
    pub fn has_id(&self) -> bool {
        self.id != UNASSIGNED_ID
    }
}

/// Sorts items the way "all items" queries return them: ascending by name.
///
/// Ties keep their relative order.
pub fn sort_by_name(items: &mut [Item]) {
    items.sort_by(|a, b| a.name.cmp(&b.name));
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_item_is_unassigned() {
        let item = Item::new("Apples", 10.0, 20);
        assert_eq!(item.id, UNASSIGNED_ID);
        assert!(!item.has_id());
    }

    #[test]
    fn test_with_id() {
        let item = Item::with_id(7, "Bananas", 15.0, 97);
        assert!(item.has_id());
        assert_eq!(item.id, 7);
        assert_eq!(item.quantity, 97);
    }

    #[test]
    fn test_sort_by_name() {
        let mut items = vec![
            Item::with_id(1, "Cherries", 1.0, 1),
            Item::with_id(2, "Apples", 1.0, 1),
            Item::with_id(3, "Bananas", 1.0, 1),
        ];
        sort_by_name(&mut items);
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Apples", "Bananas", "Cherries"]);
    }

    #[test]
    fn test_serde_field_names() {
        let item = Item::with_id(1, "Apples", 10.0, 20);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["name"], "Apples");
        assert_eq!(json["price"], 10.0);
        assert_eq!(json["quantity"], 20);
    }
}
