//! LRU-backed identity cache

use crate::metrics;
use crate::model::MailHandle;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};

/// Default number of mails kept in memory
pub const DEFAULT_CAPACITY: usize = 10_000;

/// Maps message ids to the one live [`MailHandle`] for that id
///
/// Cloning the cache shares the underlying map. Lookups and inserts are
/// individually atomic; a miss followed by a populate is not, so two loaders
/// racing on the same id may both read the row and the last insert wins.
#[derive(Debug, Clone)]
pub struct IdentityCache {
    entries: Arc<Mutex<LruCache<i32, MailHandle>>>,
}

impl IdentityCache {
    /// Create a cache holding up to `capacity` mails (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<i32, MailHandle>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, message_id: i32) -> Option<MailHandle> {
        let found = self.lock().get(&message_id).cloned();
        if found.is_some() {
            metrics::record_cache_hit();
            tracing::trace!(message_id, "identity cache hit");
        } else {
            metrics::record_cache_miss();
            tracing::trace!(message_id, "identity cache miss");
        }
        found
    }

    /// Insert or replace the entry for `message_id`
    pub fn put(&self, message_id: i32, mail: MailHandle) {
        self.lock().put(message_id, mail);
    }

    /// Insert only when no entry exists; returns whether it was inserted
    pub fn put_if_absent(&self, message_id: i32, mail: MailHandle) -> bool {
        let mut entries = self.lock();
        if entries.contains(&message_id) {
            return false;
        }
        entries.put(message_id, mail);
        true
    }

    pub fn remove(&self, message_id: i32) -> Option<MailHandle> {
        self.lock().pop(&message_id)
    }

    /// Presence check that does not touch recency or the hit/miss counters
    pub fn contains(&self, message_id: i32) -> bool {
        self.lock().contains(&message_id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl Default for IdentityCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Mail;

    fn handle(sender: i32) -> MailHandle {
        MailHandle::new(Mail::new(sender, "Alice", 2, "Bob"))
    }

    #[test]
    fn test_put_get_remove() {
        let cache = IdentityCache::new(8);
        let mail = handle(1);

        assert!(cache.get(1).is_none());
        cache.put(1, mail.clone());
        assert!(cache.get(1).unwrap().ptr_eq(&mail));
        assert_eq!(cache.len(), 1);

        assert!(cache.remove(1).is_some());
        assert!(cache.is_empty());
        assert!(cache.remove(1).is_none());
    }

    #[test]
    fn test_put_overwrites() {
        let cache = IdentityCache::new(8);
        let first = handle(1);
        let second = handle(2);
        cache.put(5, first);
        cache.put(5, second.clone());
        assert!(cache.get(5).unwrap().ptr_eq(&second));
    }

    #[test]
    fn test_put_if_absent_keeps_existing() {
        let cache = IdentityCache::new(8);
        let first = handle(1);
        assert!(cache.put_if_absent(5, first.clone()));
        assert!(!cache.put_if_absent(5, handle(2)));
        assert!(cache.get(5).unwrap().ptr_eq(&first));
    }

    #[test]
    fn test_capacity_bound_evicts_least_recent() {
        let cache = IdentityCache::new(2);
        cache.put(1, handle(1));
        cache.put(2, handle(2));
        cache.get(1);
        cache.put(3, handle(3));
        assert!(cache.contains(1));
        assert!(!cache.contains(2));
        assert!(cache.contains(3));
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let cache = IdentityCache::new(0);
        assert_eq!(cache.capacity(), 1);
    }

    #[test]
    fn test_clones_share_entries() {
        let cache = IdentityCache::new(4);
        let other = cache.clone();
        other.put(9, handle(9));
        assert!(cache.contains(9));
        cache.clear();
        assert!(other.is_empty());
    }
}
