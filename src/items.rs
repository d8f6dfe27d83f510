//! Item store seam
//!
//! Mail attachments are items that already exist elsewhere; the mail tables
//! only keep their object ids. [`ItemStore`] is how the mail store turns those
//! ids back into items when a mail is loaded.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

/// An item instance referenced by a mail attachment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Item {
    /// Unique world object id, the value stored in `mail_attachments.item_id`
    pub object_id: i32,
    /// Item template id
    pub item_id: i32,
    pub count: i64,
}

impl Item {
    pub fn new(object_id: i32, item_id: i32, count: i64) -> Self {
        Self {
            object_id,
            item_id,
            count,
        }
    }
}

/// Lookup of item instances by object id
pub trait ItemStore: Send + Sync {
    /// Load an item, `None` when it no longer exists
    fn load(&self, object_id: i32) -> Option<Item>;
}

/// Item store kept in memory
#[derive(Debug, Default)]
pub struct MemoryItemStore {
    items: RwLock<HashMap<i32, Item>>,
}

impl MemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, item: Item) {
        self.items
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(item.object_id, item);
    }

    pub fn remove(&self, object_id: i32) -> Option<Item> {
        self.items
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&object_id)
    }

    pub fn len(&self) -> usize {
        self.items
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ItemStore for MemoryItemStore {
    fn load(&self, object_id: i32) -> Option<Item> {
        self.items
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&object_id)
            .cloned()
    }
}

/// Resolves every id to a placeholder item carrying only the object id
///
/// Used by tooling that inspects mail without access to the item tables.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdOnlyItemStore;

impl ItemStore for IdOnlyItemStore {
    fn load(&self, object_id: i32) -> Option<Item> {
        Some(Item::new(object_id, 0, 0))
    }
}
