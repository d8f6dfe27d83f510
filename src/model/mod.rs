//! Mail data model
//!
//! - [`Mail`]: a message row with its attachments
//! - [`SenderType`]: who produced the mail, stored as an ordinal
//! - [`PersistenceState`]: which store operations a record allows
//! - [`MailHandle`]: the shared instance handed out by the identity cache

mod mail;
mod state;

pub use mail::{Mail, MailHandle, SenderType};
pub use state::PersistenceState;
