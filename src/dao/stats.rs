//! Operation counters for a store

use crate::metrics;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters, bumped after each completed operation
#[derive(Debug, Default)]
pub struct EntityStats {
    load: AtomicU64,
    insert: AtomicU64,
    update: AtomicU64,
    delete: AtomicU64,
}

impl EntityStats {
    pub fn record_load(&self) {
        self.load.fetch_add(1, Ordering::Relaxed);
        metrics::record_operation("load");
    }

    pub fn record_insert(&self) {
        self.insert.fetch_add(1, Ordering::Relaxed);
        metrics::record_operation("insert");
    }

    pub fn record_update(&self) {
        self.update.fetch_add(1, Ordering::Relaxed);
        metrics::record_operation("update");
    }

    pub fn record_delete(&self) {
        self.delete.fetch_add(1, Ordering::Relaxed);
        metrics::record_operation("delete");
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            load_count: self.load.load(Ordering::Relaxed),
            insert_count: self.insert.load(Ordering::Relaxed),
            update_count: self.update.load(Ordering::Relaxed),
            delete_count: self.delete.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`EntityStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Row reads that reached the database (cache hits are not counted)
    pub load_count: u64,
    pub insert_count: u64,
    pub update_count: u64,
    pub delete_count: u64,
}
