//! Configuration system
//!
//! Loads ~/.config/gamemail/config.yaml with sections for:
//! - the SQLite database and its connection pool
//! - the identity cache size
//! - mail store behavior

mod mail_config;
pub mod validation;

pub use mail_config::{CacheConfig, DatabaseConfig, MailConfig, StoreConfig};
pub use validation::{validate_config, validate_config_result, ValidationError};
