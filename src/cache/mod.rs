//! Identity cache for loaded mail
//!
//! Keeps one canonical in-memory instance per message id for the lifetime of
//! the process. Capacity comes from configuration; eviction is plain LRU.

mod identity;

pub use identity::{IdentityCache, DEFAULT_CAPACITY};
