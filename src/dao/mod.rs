//! Data access for mail
//!
//! [`MailStore`] owns the SQL, the connection pool and the identity cache for
//! mail records.

mod mail_dao;
mod rows;
mod stats;

pub use mail_dao::{MailRole, MailStore, StoreOptions};
pub use stats::{EntityStats, StatsSnapshot};
