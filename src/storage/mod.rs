//! SQLite storage
//!
//! Connection pooling and the three mail tables:
//! - `mail`: one row per message
//! - `character_mail`: ownership index (who sent / received what)
//! - `mail_attachments`: item object ids attached to a message

mod pool;
mod schema;

pub use pool::{open_in_memory_pool, open_pool, DbConnection, DbPool};
pub use schema::init_schema;
