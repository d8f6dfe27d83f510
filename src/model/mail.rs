//! Mail record
//!
//! A mail is an in-game message between two characters (or from the game to a
//! character). It can carry item attachments and ask the receiver for a
//! payment before the items can be taken.

use super::PersistenceState;
use crate::items::Item;
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};
use std::collections::BTreeSet;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Who produced a mail
///
/// Stored as its ordinal, so variants must only ever be appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum SenderType {
    /// Written by a player
    Normal = 0,
    NewsInformer = 1,
    None = 2,
    Birthday = 3,
    Unknown = 4,
    System = 5,
    Mentor = 6,
    Present = 7,
}

impl Default for SenderType {
    fn default() -> Self {
        Self::Normal
    }
}

impl SenderType {
    pub const ALL: [SenderType; 8] = [
        Self::Normal,
        Self::NewsInformer,
        Self::None,
        Self::Birthday,
        Self::Unknown,
        Self::System,
        Self::Mentor,
        Self::Present,
    ];

    pub fn ordinal(self) -> i32 {
        self as i32
    }

    pub fn from_ordinal(ordinal: i32) -> Option<Self> {
        usize::try_from(ordinal)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    /// Only player-written mail has a "sent" entry for its sender
    pub fn has_sender_entry(self) -> bool {
        self == Self::Normal
    }
}

/// A mail message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mail {
    message_id: i32,
    pub sender_id: i32,
    pub sender_name: String,
    pub receiver_id: i32,
    pub receiver_name: String,
    /// Unix time (seconds) after which the mail is returned or removed
    pub expire_time: i32,
    pub topic: String,
    pub body: String,
    /// Adena the receiver must pay to take the attachments
    pub price: i64,
    pub sender_type: SenderType,
    pub unread: bool,
    pub returnable: bool,
    pub system_msg1: i32,
    pub system_msg2: i32,
    pub attachments: Vec<Item>,
    #[serde(skip)]
    state: PersistenceState,
}

impl Mail {
    /// Create a new, unsaved mail from one character to another
    pub fn new(
        sender_id: i32,
        sender_name: impl Into<String>,
        receiver_id: i32,
        receiver_name: impl Into<String>,
    ) -> Self {
        Self {
            message_id: 0,
            sender_id,
            sender_name: sender_name.into(),
            receiver_id,
            receiver_name: receiver_name.into(),
            expire_time: 0,
            topic: String::new(),
            body: String::new(),
            price: 0,
            sender_type: SenderType::Normal,
            unread: true,
            returnable: true,
            system_msg1: 0,
            system_msg2: 0,
            attachments: Vec::new(),
            state: PersistenceState::New,
        }
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_expire_time(mut self, expire_time: i32) -> Self {
        self.expire_time = expire_time;
        self
    }

    pub fn with_price(mut self, price: i64) -> Self {
        self.price = price;
        self
    }

    pub fn with_sender_type(mut self, sender_type: SenderType) -> Self {
        self.sender_type = sender_type;
        self
    }

    pub fn with_system_messages(mut self, msg1: i32, msg2: i32) -> Self {
        self.system_msg1 = msg1;
        self.system_msg2 = msg2;
        self
    }

    pub fn with_attachment(mut self, item: Item) -> Self {
        self.attachments.push(item);
        self
    }

    /// Identifier assigned by the store, 0 until saved
    pub fn message_id(&self) -> i32 {
        self.message_id
    }

    pub(crate) fn assign_message_id(&mut self, message_id: i32) {
        self.message_id = message_id;
    }

    pub fn state(&self) -> PersistenceState {
        self.state
    }

    pub fn set_state(&mut self, state: PersistenceState) {
        self.state = state;
    }

    pub fn add_attachment(&mut self, item: Item) {
        self.attachments.push(item);
    }

    /// Detach every item, e.g. when the receiver takes them
    pub fn take_attachments(&mut self) -> Vec<Item> {
        std::mem::take(&mut self.attachments)
    }

    pub fn attachment_ids(&self) -> BTreeSet<i32> {
        self.attachments.iter().map(|item| item.object_id).collect()
    }

    /// Receiver has to pay before taking the attachments
    pub fn is_payment(&self) -> bool {
        self.price > 0
    }

    pub fn is_expired(&self, now: i32) -> bool {
        self.expire_time <= now
    }

    /// Field-by-field equality, attachments compared by object id as a set
    pub fn same_content(&self, other: &Mail) -> bool {
        self.message_id == other.message_id
            && self.sender_id == other.sender_id
            && self.sender_name == other.sender_name
            && self.receiver_id == other.receiver_id
            && self.receiver_name == other.receiver_name
            && self.expire_time == other.expire_time
            && self.topic == other.topic
            && self.body == other.body
            && self.price == other.price
            && self.sender_type == other.sender_type
            && self.unread == other.unread
            && self.returnable == other.returnable
            && self.system_msg1 == other.system_msg1
            && self.system_msg2 == other.system_msg2
            && self.attachment_ids() == other.attachment_ids()
    }
}

/// Shared, in-place mutable mail instance
///
/// The identity cache hands the same handle to every caller, so a change made
/// through one handle is seen by all of them. Poisoned locks are recovered:
/// a mail has no invariant a panicking writer could leave half-applied.
#[derive(Debug, Clone)]
pub struct MailHandle(Arc<RwLock<Mail>>);

impl MailHandle {
    pub fn new(mail: Mail) -> Self {
        Self(Arc::new(RwLock::new(mail)))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Mail> {
        self.0.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Mail> {
        self.0.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn message_id(&self) -> i32 {
        self.read().message_id()
    }

    pub fn state(&self) -> PersistenceState {
        self.read().state()
    }

    /// Owned copy of the current contents
    pub fn snapshot(&self) -> Mail {
        self.read().clone()
    }

    /// Both handles point at the same instance
    pub fn ptr_eq(&self, other: &MailHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl From<Mail> for MailHandle {
    fn from(mail: Mail) -> Self {
        Self::new(mail)
    }
}
