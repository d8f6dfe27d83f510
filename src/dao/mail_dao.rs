//! SQLite-backed mail store
//!
//! Maps [`Mail`] records to the `mail`, `character_mail` and
//! `mail_attachments` tables and keeps loaded mail in an [`IdentityCache`].
//!
//! Each operation comes in two forms. The `try_*` methods return
//! [`crate::Result`] so callers can tell a missing mail from an unavailable
//! database. The plain methods are the boundary the mail service uses: they
//! log failures and fall back to `None`, an empty list or `false`.
//!
//! Persistence-state checks are silent: saving a stored mail, or updating a
//! deleted one, does nothing and is not an error.
//!
//! # Example
//!
//! ```no_run
//! use gamemail::dao::{MailRole, MailStore};
//! use gamemail::items::MemoryItemStore;
//! use gamemail::model::{Mail, MailHandle};
//! use std::sync::Arc;
//!
//! let store = MailStore::in_memory(Arc::new(MemoryItemStore::new())).unwrap();
//!
//! let mail = MailHandle::new(Mail::new(1, "Alice", 2, "Bob").with_topic("Hello"));
//! store.save(&mail);
//!
//! let inbox = store.find_by_owner(2, MailRole::Received);
//! assert_eq!(inbox.len(), 1);
//! ```

use super::rows::mail_from_row;
use super::stats::{EntityStats, StatsSnapshot};
use crate::cache::IdentityCache;
use crate::config::{validate_config_result, MailConfig};
use crate::items::ItemStore;
use crate::metrics;
use crate::model::{Mail, MailHandle, PersistenceState};
use crate::storage::{self, DbConnection, DbPool};
use crate::{GameMailError, Result};
use rusqlite::{params, Connection, OptionalExtension, Params};
use std::sync::Arc;

const RESTORE_MAIL: &str = "SELECT sender_id, sender_name, receiver_id, receiver_name, expire_time, topic, body, price, type, unread, returnable, systemMsg1, systemMsg2 FROM mail WHERE message_id = ?1";
const STORE_MAIL: &str = "INSERT INTO mail (sender_id, sender_name, receiver_id, receiver_name, expire_time, topic, body, price, type, unread, returnable, systemMsg1, systemMsg2) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)";
const UPDATE_MAIL: &str = "UPDATE mail SET sender_id = ?1, sender_name = ?2, receiver_id = ?3, receiver_name = ?4, expire_time = ?5, topic = ?6, body = ?7, price = ?8, type = ?9, unread = ?10, returnable = ?11, systemMsg1 = ?12, systemMsg2 = ?13 WHERE message_id = ?14";
const REMOVE_MAIL: &str = "DELETE FROM mail WHERE message_id = ?1";

const RESTORE_EXPIRED_MAIL: &str =
    "SELECT message_id FROM mail WHERE expire_time <= ?1 ORDER BY message_id";

const RESTORE_OWN_MAIL: &str = "SELECT message_id FROM character_mail WHERE char_id = ?1 AND is_sender = ?2 ORDER BY message_id";
const STORE_OWN_MAIL: &str =
    "INSERT INTO character_mail (char_id, message_id, is_sender) VALUES (?1, ?2, ?3)";
const REMOVE_OWN_MAIL: &str =
    "DELETE FROM character_mail WHERE char_id = ?1 AND message_id = ?2 AND is_sender = ?3";

const RESTORE_MAIL_ATTACHMENTS: &str =
    "SELECT item_id FROM mail_attachments WHERE message_id = ?1 ORDER BY rowid";
const STORE_MAIL_ATTACHMENT: &str =
    "INSERT INTO mail_attachments (message_id, item_id) VALUES (?1, ?2)";
const REMOVE_MAIL_ATTACHMENTS: &str = "DELETE FROM mail_attachments WHERE message_id = ?1";

/// Which side of a mail an owner is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MailRole {
    /// The owner is the receiver (inbox)
    Received,
    /// The owner is the sender (outbox)
    Sent,
}

impl MailRole {
    pub fn is_sender(self) -> bool {
        self == MailRole::Sent
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MailRole::Received => "received",
            MailRole::Sent => "sent",
        }
    }
}

/// Store behavior switches
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreOptions {
    /// Run all statements of a save in one transaction
    pub atomic_save: bool,
}

/// Mail record store
pub struct MailStore {
    pool: DbPool,
    cache: IdentityCache,
    items: Arc<dyn ItemStore>,
    options: StoreOptions,
    stats: EntityStats,
}

impl MailStore {
    /// Build a store from already constructed collaborators
    pub fn new(
        pool: DbPool,
        cache: IdentityCache,
        items: Arc<dyn ItemStore>,
        options: StoreOptions,
    ) -> Self {
        Self {
            pool,
            cache,
            items,
            options,
            stats: EntityStats::default(),
        }
    }

    /// Validate the configuration, open the database and build the store
    pub fn open(config: &MailConfig, items: Arc<dyn ItemStore>) -> Result<Self> {
        validate_config_result(config)?;
        let pool = storage::open_pool(&config.database)?;
        let options = StoreOptions {
            atomic_save: config.store.atomic_save,
        };
        Ok(Self::new(
            pool,
            IdentityCache::new(config.cache.capacity),
            items,
            options,
        ))
    }

    /// Store over a private in-memory database
    pub fn in_memory(items: Arc<dyn ItemStore>) -> Result<Self> {
        let pool = storage::open_in_memory_pool()?;
        Ok(Self::new(
            pool,
            IdentityCache::default(),
            items,
            StoreOptions::default(),
        ))
    }

    pub fn cache(&self) -> &IdentityCache {
        &self.cache
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn options(&self) -> StoreOptions {
        self.options
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    fn connection(&self) -> Result<DbConnection> {
        Ok(self.pool.get()?)
    }

    // --- load ---------------------------------------------------------------

    /// Load a mail by id; cache hits never touch the database
    pub fn try_load(&self, message_id: i32) -> Result<Option<MailHandle>> {
        if let Some(mail) = self.cache.get(message_id) {
            return Ok(Some(mail));
        }

        let Some(mut mail) = self.load_row(message_id)? else {
            tracing::debug!(message_id, "Mail not found");
            return Ok(None);
        };
        mail.set_state(PersistenceState::Stored);

        let handle = MailHandle::new(mail);
        self.cache.put(message_id, handle.clone());
        Ok(Some(handle))
    }

    /// Load a mail by id, `None` when missing or on any failure (logged)
    pub fn load(&self, message_id: i32) -> Option<MailHandle> {
        match self.try_load(message_id) {
            Ok(mail) => mail,
            Err(e) => {
                metrics::record_error("load");
                tracing::error!(message_id, error = %e, "Error while restoring mail");
                None
            }
        }
    }

    /// Load each id in order, leaving out ids that do not resolve
    pub fn load_many(&self, message_ids: &[i32]) -> Vec<MailHandle> {
        if message_ids.is_empty() {
            return Vec::new();
        }

        message_ids
            .iter()
            .filter_map(|&message_id| self.load(message_id))
            .collect()
    }

    fn load_row(&self, message_id: i32) -> Result<Option<Mail>> {
        let conn = self.connection()?;
        tracing::trace!(sql = RESTORE_MAIL, message_id, "Executing");

        let mail = conn
            .query_row(RESTORE_MAIL, params![message_id], |row| {
                mail_from_row(message_id, row)
            })
            .optional()?;

        let mail = match mail {
            Some(mut mail) => {
                let object_ids = query_ids(&conn, RESTORE_MAIL_ATTACHMENTS, params![message_id])?;
                for object_id in object_ids {
                    match self.items.load(object_id) {
                        Some(item) => mail.add_attachment(item),
                        None => tracing::debug!(
                            message_id,
                            object_id,
                            "Skipping attachment that no longer exists"
                        ),
                    }
                }
                Some(mail)
            }
            None => None,
        };

        self.stats.record_load();
        Ok(mail)
    }

    // --- save / update / delete ---------------------------------------------

    /// Insert a new mail with its attachments and ownership entries
    ///
    /// Returns `Ok(false)` when the mail is not in a savable state. On success
    /// the generated id is assigned, the mail is marked stored and published
    /// to the cache, replacing whatever was cached under that id.
    pub fn try_save(&self, handle: &MailHandle) -> Result<bool> {
        let mut mail = handle.write();
        if !mail.state().is_savable() {
            return Ok(false);
        }

        let message_id = if self.options.atomic_save {
            let mut conn = self.connection()?;
            let tx = conn.transaction()?;
            let message_id = insert_mail(&tx, &mail)?;
            tx.commit()?;
            message_id
        } else {
            let conn = self.connection()?;
            insert_mail(&conn, &mail)?
        };

        mail.assign_message_id(message_id);
        mail.set_state(PersistenceState::Stored);
        drop(mail);

        self.stats.record_insert();
        tracing::debug!(message_id, "Mail stored");

        self.cache.put(message_id, handle.clone());
        Ok(true)
    }

    /// Insert a new mail; failures are logged and leave the mail untouched
    pub fn save(&self, handle: &MailHandle) {
        if let Err(e) = self.try_save(handle) {
            metrics::record_error("insert");
            tracing::error!(error = %e, "Error while saving mail");
        }
    }

    /// Rewrite a stored mail's row
    ///
    /// When the mail has no attachments left, its attachment rows are removed
    /// as well. The cache is only filled if it has no entry for the id: the
    /// cached instance is the one callers mutate before calling update.
    pub fn try_update(&self, handle: &MailHandle) -> Result<bool> {
        let mut mail = handle.write();
        if !mail.state().is_updatable() {
            return Ok(false);
        }

        let message_id = mail.message_id();
        {
            let conn = self.connection()?;
            tracing::trace!(sql = UPDATE_MAIL, message_id, "Executing");
            conn.execute(
                UPDATE_MAIL,
                params![
                    mail.sender_id,
                    mail.sender_name,
                    mail.receiver_id,
                    mail.receiver_name,
                    mail.expire_time,
                    mail.topic,
                    mail.body,
                    mail.price,
                    mail.sender_type,
                    mail.unread,
                    mail.returnable,
                    mail.system_msg1,
                    mail.system_msg2,
                    message_id,
                ],
            )?;

            if mail.attachments.is_empty() {
                tracing::trace!(sql = REMOVE_MAIL_ATTACHMENTS, message_id, "Executing");
                conn.execute(REMOVE_MAIL_ATTACHMENTS, params![message_id])?;
            }
        }

        mail.set_state(PersistenceState::Stored);
        drop(mail);

        self.stats.record_update();
        self.cache.put_if_absent(message_id, handle.clone());
        Ok(true)
    }

    /// Rewrite a stored mail; failures are logged
    pub fn update(&self, handle: &MailHandle) {
        if let Err(e) = self.try_update(handle) {
            metrics::record_error("update");
            tracing::error!(
                message_id = handle.message_id(),
                error = %e,
                "Error while updating mail"
            );
        }
    }

    /// Save a new mail or update a stored one
    pub fn save_or_update(&self, handle: &MailHandle) {
        let state = handle.state();
        if state.is_savable() {
            self.save(handle);
        } else if state.is_updatable() {
            self.update(handle);
        }
    }

    /// Remove a stored mail's row
    ///
    /// Ownership and attachment rows are left alone; ownership entries go
    /// through [`MailStore::delete_ownership_entry`].
    pub fn try_delete(&self, handle: &MailHandle) -> Result<bool> {
        let mut mail = handle.write();
        if !mail.state().is_deletable() {
            return Ok(false);
        }

        let message_id = mail.message_id();
        tracing::trace!(sql = REMOVE_MAIL, message_id, "Executing");
        self.connection()?
            .execute(REMOVE_MAIL, params![message_id])?;

        mail.set_state(PersistenceState::Deleted);
        drop(mail);

        self.stats.record_delete();
        self.cache.remove(message_id);
        Ok(true)
    }

    /// Remove a stored mail's row; failures are logged
    pub fn delete(&self, handle: &MailHandle) {
        if let Err(e) = self.try_delete(handle) {
            metrics::record_error("delete");
            tracing::error!(
                message_id = handle.message_id(),
                error = %e,
                "Error while deleting mail"
            );
        }
    }

    // --- ownership index ----------------------------------------------------

    /// Ids of the mails an owner sent or received
    pub fn try_owned_message_ids(&self, owner_id: i32, role: MailRole) -> Result<Vec<i32>> {
        let conn = self.connection()?;
        query_ids(&conn, RESTORE_OWN_MAIL, params![owner_id, role.is_sender()])
    }

    /// Mails an owner sent or received
    pub fn try_find_by_owner(&self, owner_id: i32, role: MailRole) -> Result<Vec<MailHandle>> {
        let message_ids = self.try_owned_message_ids(owner_id, role)?;
        Ok(self.load_many(&message_ids))
    }

    /// Mails an owner sent or received, empty on failure (logged)
    pub fn find_by_owner(&self, owner_id: i32, role: MailRole) -> Vec<MailHandle> {
        match self.try_find_by_owner(owner_id, role) {
            Ok(mails) => mails,
            Err(e) => {
                metrics::record_error("find_by_owner");
                tracing::error!(
                    owner_id,
                    role = role.as_str(),
                    error = %e,
                    "Error while restoring mail of owner"
                );
                Vec::new()
            }
        }
    }

    pub fn received_by_owner(&self, receiver_id: i32) -> Vec<MailHandle> {
        self.find_by_owner(receiver_id, MailRole::Received)
    }

    pub fn sent_by_owner(&self, sender_id: i32) -> Vec<MailHandle> {
        self.find_by_owner(sender_id, MailRole::Sent)
    }

    /// One mail from an owner's index, `None` if the owner has no such entry
    pub fn find_owned_by_mail_id(
        &self,
        owner_id: i32,
        message_id: i32,
        role: MailRole,
    ) -> Option<MailHandle> {
        match self.try_owned_message_ids(owner_id, role) {
            Ok(ids) if ids.contains(&message_id) => self.load(message_id),
            Ok(_) => None,
            Err(e) => {
                metrics::record_error("find_by_owner");
                tracing::error!(
                    owner_id,
                    message_id,
                    role = role.as_str(),
                    error = %e,
                    "Error while restoring mail of owner"
                );
                None
            }
        }
    }

    pub fn received_by_mail_id(&self, receiver_id: i32, message_id: i32) -> Option<MailHandle> {
        self.find_owned_by_mail_id(receiver_id, message_id, MailRole::Received)
    }

    pub fn sent_by_mail_id(&self, sender_id: i32, message_id: i32) -> Option<MailHandle> {
        self.find_owned_by_mail_id(sender_id, message_id, MailRole::Sent)
    }

    /// Remove one ownership entry, returning the number of rows removed
    pub fn try_delete_ownership_entry(
        &self,
        owner_id: i32,
        message_id: i32,
        role: MailRole,
    ) -> Result<usize> {
        tracing::trace!(sql = REMOVE_OWN_MAIL, owner_id, message_id, "Executing");
        let removed = self.connection()?.execute(
            REMOVE_OWN_MAIL,
            params![owner_id, message_id, role.is_sender()],
        )?;
        Ok(removed)
    }

    /// Remove one ownership entry
    ///
    /// Returns `true` once the statement ran, whether or not a row matched;
    /// `false` means it failed (logged).
    pub fn delete_ownership_entry(&self, owner_id: i32, message_id: i32, role: MailRole) -> bool {
        match self.try_delete_ownership_entry(owner_id, message_id, role) {
            Ok(removed) => {
                tracing::debug!(owner_id, message_id, removed, "Ownership entry removed");
                true
            }
            Err(e) => {
                metrics::record_error("delete_ownership");
                tracing::error!(
                    owner_id,
                    message_id,
                    role = role.as_str(),
                    error = %e,
                    "Error while deleting mail of owner"
                );
                false
            }
        }
    }

    pub fn delete_received_by_mail_id(&self, receiver_id: i32, message_id: i32) -> bool {
        self.delete_ownership_entry(receiver_id, message_id, MailRole::Received)
    }

    pub fn delete_sent_by_mail_id(&self, sender_id: i32, message_id: i32) -> bool {
        self.delete_ownership_entry(sender_id, message_id, MailRole::Sent)
    }

    // --- expiry -------------------------------------------------------------

    /// Mails whose expiration time is at or before `threshold`
    pub fn try_find_expired(&self, threshold: i32) -> Result<Vec<MailHandle>> {
        let message_ids = {
            let conn = self.connection()?;
            query_ids(&conn, RESTORE_EXPIRED_MAIL, params![threshold])?
        };
        Ok(self.load_many(&message_ids))
    }

    /// Expired mails, empty on failure (logged)
    pub fn find_expired(&self, threshold: i32) -> Vec<MailHandle> {
        match self.try_find_expired(threshold) {
            Ok(mails) => mails,
            Err(e) => {
                metrics::record_error("find_expired");
                tracing::error!(threshold, error = %e, "Error while restoring expired mail");
                Vec::new()
            }
        }
    }
}

impl std::fmt::Debug for MailStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailStore")
            .field("pool_size", &self.pool.max_size())
            .field("cached", &self.cache.len())
            .field("options", &self.options)
            .field("stats", &self.stats.snapshot())
            .finish()
    }
}

/// Write the mail row, its attachments and ownership entries; returns the new id
fn insert_mail(conn: &Connection, mail: &Mail) -> Result<i32> {
    tracing::trace!(sql = STORE_MAIL, receiver_id = mail.receiver_id, "Executing");
    conn.execute(
        STORE_MAIL,
        params![
            mail.sender_id,
            mail.sender_name,
            mail.receiver_id,
            mail.receiver_name,
            mail.expire_time,
            mail.topic,
            mail.body,
            mail.price,
            mail.sender_type,
            mail.unread,
            mail.returnable,
            mail.system_msg1,
            mail.system_msg2,
        ],
    )?;

    let rowid = conn.last_insert_rowid();
    let message_id = i32::try_from(rowid)
        .map_err(|_| GameMailError::Other(format!("Generated message id {} overflows", rowid)))?;

    if !mail.attachments.is_empty() {
        let mut stmt = conn.prepare_cached(STORE_MAIL_ATTACHMENT)?;
        for item in &mail.attachments {
            tracing::trace!(
                sql = STORE_MAIL_ATTACHMENT,
                message_id,
                object_id = item.object_id,
                "Executing"
            );
            stmt.execute(params![message_id, item.object_id])?;
        }
    }

    if mail.sender_type.has_sender_entry() {
        tracing::trace!(sql = STORE_OWN_MAIL, message_id, owner_id = mail.sender_id, "Executing");
        conn.execute(STORE_OWN_MAIL, params![mail.sender_id, message_id, true])?;
    }

    tracing::trace!(sql = STORE_OWN_MAIL, message_id, owner_id = mail.receiver_id, "Executing");
    conn.execute(STORE_OWN_MAIL, params![mail.receiver_id, message_id, false])?;

    Ok(message_id)
}

fn query_ids<P: Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<i32>> {
    tracing::trace!(sql, "Executing");
    let mut stmt = conn.prepare_cached(sql)?;
    let ids = stmt
        .query_map(params, |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<i32>>>()?;
    Ok(ids)
}
