//! gamemail - cached mail record store for a game server
//!
//! Persists in-game mail (messages with item attachments and a price) in
//! SQLite and keeps one canonical in-memory instance per message id. Stat
//! conditions live in the `conditions` workspace crate and are re-exported
//! here.
//!
//! # Architecture
//!
//! - **model**: Mail record, sender type, persistence state, shared handle
//! - **dao**: Mail store (SQL, connection handling, row mapping)
//! - **cache**: Identity cache (message id -> shared mail)
//! - **items**: Item store seam used to resolve attachments
//! - **storage**: Connection pool and schema
//! - **config**: YAML configuration and validation
//! - **metrics**: Prometheus counters

pub mod cache;
pub mod config;
pub mod dao;
pub mod error;
pub mod items;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod storage;

// Re-exports
pub use conditions;
pub use error::{GameMailError, Result};
