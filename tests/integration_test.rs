//! Integration tests for gamemail
//!
//! These tests run the mail store against real SQLite files and check the
//! behavior mail services rely on: round trips, ownership entries, expiry and
//! the identity cache.

use gamemail::cache::IdentityCache;
use gamemail::config::MailConfig;
use gamemail::dao::{MailRole, MailStore, StoreOptions};
use gamemail::items::{Item, ItemStore, MemoryItemStore};
use gamemail::model::{Mail, MailHandle, PersistenceState, SenderType};
use gamemail::storage;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Item store that counts lookups
#[derive(Default)]
struct CountingItemStore {
    inner: MemoryItemStore,
    lookups: AtomicUsize,
}

impl CountingItemStore {
    fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl ItemStore for CountingItemStore {
    fn load(&self, object_id: i32) -> Option<Item> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.load(object_id)
    }
}

fn file_config(dir: &TempDir) -> MailConfig {
    let mut config = MailConfig::with_database_path(dir.path().join("mail.db"));
    config.database.pool_size = 4;
    config.cache.capacity = 128;
    config
}

fn open_store(dir: &TempDir, items: Arc<dyn ItemStore>) -> MailStore {
    MailStore::open(&file_config(dir), items).unwrap()
}

fn create_test_mail(sender: i32, receiver: i32, expire_time: i32) -> Mail {
    Mail::new(sender, format!("sender-{}", sender), receiver, format!("receiver-{}", receiver))
        .with_topic("Supplies")
        .with_body("Bring these to the castle")
        .with_expire_time(expire_time)
}

fn count_rows(store: &MailStore, sql: &str) -> i64 {
    store
        .pool()
        .get()
        .unwrap()
        .query_row(sql, [], |row| row.get(0))
        .unwrap()
}

mod round_trip_tests {
    use super::*;

    #[test]
    fn test_save_then_load_from_cold_cache() {
        let dir = TempDir::new().unwrap();
        let items = Arc::new(MemoryItemStore::new());
        items.insert(Item::new(268_435_460, 57, 25_000));
        items.insert(Item::new(268_435_461, 1_864, 3));
        items.insert(Item::new(268_435_462, 6_577, 1));

        let writer = open_store(&dir, items.clone());
        let mail = MailHandle::new(
            create_test_mail(100, 200, 1_800_000_000)
                .with_price(250_000)
                .with_system_messages(1_207, 0)
                .with_attachment(Item::new(268_435_462, 6_577, 1))
                .with_attachment(Item::new(268_435_460, 57, 25_000))
                .with_attachment(Item::new(268_435_461, 1_864, 3)),
        );
        writer.save(&mail);
        let id = mail.message_id();
        assert!(id > 0);

        // A second store over the same file starts with an empty cache
        let reader = open_store(&dir, items);
        let loaded = reader.load(id).unwrap();
        assert!(loaded.read().same_content(&mail.read()));
        assert_eq!(
            loaded.read().attachment_ids(),
            BTreeSet::from([268_435_460, 268_435_461, 268_435_462])
        );
        assert_eq!(loaded.state(), PersistenceState::Stored);
        assert_eq!(reader.stats().load_count, 1);
    }

    #[test]
    fn test_every_sender_type_round_trips() {
        let dir = TempDir::new().unwrap();
        let items: Arc<dyn ItemStore> = Arc::new(MemoryItemStore::new());
        let writer = open_store(&dir, items.clone());

        let mut saved = Vec::new();
        for kind in SenderType::ALL {
            let mail = MailHandle::new(create_test_mail(1, 2, 0).with_sender_type(kind));
            writer.save(&mail);
            saved.push((mail.message_id(), kind));
        }

        let reader = open_store(&dir, items);
        for (id, kind) in saved {
            assert_eq!(reader.load(id).unwrap().read().sender_type, kind);
        }
    }

    #[test]
    fn test_load_returns_canonical_instance() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir, Arc::new(MemoryItemStore::new()));
        let mail = MailHandle::new(create_test_mail(1, 2, 0));
        store.save(&mail);

        let a = store.load(mail.message_id()).unwrap();
        let b = store.load(mail.message_id()).unwrap();
        assert!(a.ptr_eq(&mail));
        assert!(b.ptr_eq(&mail));

        a.write().unread = false;
        assert!(!b.read().unread);
    }
}

mod cache_tests {
    use super::*;

    /// Store whose only connection can be checked out by the test
    fn single_connection_store(items: Arc<dyn ItemStore>) -> MailStore {
        let pool = Pool::builder()
            .max_size(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connection_timeout(Duration::from_millis(200))
            .build(SqliteConnectionManager::memory())
            .unwrap();
        storage::init_schema(&pool.get().unwrap()).unwrap();
        MailStore::new(pool, IdentityCache::new(16), items, StoreOptions::default())
    }

    #[test]
    fn test_load_many_empty_never_touches_store() {
        let items = Arc::new(CountingItemStore::default());
        let store = single_connection_store(items.clone());

        let _held = store.pool().get().unwrap();

        assert!(store.load_many(&[]).is_empty());
        assert_eq!(store.stats().load_count, 0);
        assert_eq!(items.lookups(), 0);

        // Any real database access fails while the connection is held
        assert!(store.try_load(1).is_err());
    }

    #[test]
    fn test_cache_hit_short_circuits_database() {
        let items = Arc::new(CountingItemStore::default());
        items.inner.insert(Item::new(10, 57, 1));
        let store = single_connection_store(items.clone());

        let mail = MailHandle::new(create_test_mail(1, 2, 0).with_attachment(Item::new(10, 57, 1)));
        store.save(&mail);
        let id = mail.message_id();

        let _held = store.pool().get().unwrap();
        let loaded = store.load(id).unwrap();
        assert!(loaded.ptr_eq(&mail));
        assert_eq!(store.stats().load_count, 0);
        assert_eq!(items.lookups(), 0);
    }

    #[test]
    fn test_cache_miss_repopulates() {
        let items = Arc::new(CountingItemStore::default());
        items.inner.insert(Item::new(10, 57, 1));
        let store = single_connection_store(items.clone());

        let mail = MailHandle::new(create_test_mail(1, 2, 0).with_attachment(Item::new(10, 57, 1)));
        store.save(&mail);
        let id = mail.message_id();
        store.cache().remove(id);

        let first = store.load(id).unwrap();
        let second = store.load(id).unwrap();
        assert!(first.ptr_eq(&second));
        assert_eq!(store.stats().load_count, 1);
        assert_eq!(items.lookups(), 1);
    }

    #[test]
    fn test_load_many_preserves_order_and_skips_missing() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir, Arc::new(MemoryItemStore::new()));

        let ids: Vec<i32> = (0..3)
            .map(|i| {
                let mail = MailHandle::new(create_test_mail(1, 2, i));
                store.save(&mail);
                mail.message_id()
            })
            .collect();

        let request = vec![ids[2], 9_999, ids[0], ids[1]];
        let loaded: Vec<i32> = store
            .load_many(&request)
            .iter()
            .map(MailHandle::message_id)
            .collect();
        assert_eq!(loaded, vec![ids[2], ids[0], ids[1]]);
    }
}

mod lifecycle_tests {
    use super::*;

    #[test]
    fn test_update_on_deleted_mail_is_noop() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir, Arc::new(MemoryItemStore::new()));
        let mail = MailHandle::new(create_test_mail(1, 2, 0));
        store.save(&mail);
        let id = mail.message_id();

        {
            let mut m = mail.write();
            m.set_state(PersistenceState::Deleted);
            m.topic = "rewritten".to_string();
        }
        store.update(&mail);

        assert_eq!(mail.state(), PersistenceState::Deleted);
        assert_eq!(store.stats().update_count, 0);

        let reader = open_store(&dir, Arc::new(MemoryItemStore::new()));
        assert_eq!(reader.load(id).unwrap().read().topic, "Supplies");
    }

    #[test]
    fn test_delete_then_save_as_new_mail() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir, Arc::new(MemoryItemStore::new()));
        let mail = MailHandle::new(create_test_mail(1, 2, 0));
        store.save(&mail);
        let old_id = mail.message_id();

        store.delete(&mail);
        assert!(store.load(old_id).is_none());

        // Deleted mail cannot be saved again
        store.save(&mail);
        assert_eq!(mail.message_id(), old_id);
        assert_eq!(count_rows(&store, "SELECT COUNT(*) FROM mail"), 0);
    }

    #[test]
    fn test_return_to_sender_flow() {
        let dir = TempDir::new().unwrap();
        let items = Arc::new(MemoryItemStore::new());
        items.insert(Item::new(42, 57, 1_000));
        let store = open_store(&dir, items);

        let mail = MailHandle::new(create_test_mail(1, 2, 100).with_attachment(Item::new(42, 57, 1_000)));
        store.save(&mail);
        let id = mail.message_id();

        // Receiver takes the items: attachments cleared, row rewritten
        let inbox = store.received_by_owner(2);
        assert_eq!(inbox.len(), 1);
        {
            let mut m = inbox[0].write();
            m.take_attachments();
            m.unread = false;
        }
        store.update(&inbox[0]);
        assert_eq!(count_rows(&store, "SELECT COUNT(*) FROM mail_attachments"), 0);

        // Receiver deletes the mail from the inbox, sender still sees it
        assert!(store.delete_received_by_mail_id(2, id));
        assert!(store.received_by_owner(2).is_empty());
        assert_eq!(store.sent_by_owner(1).len(), 1);
    }
}

mod ownership_tests {
    use super::*;

    #[test]
    fn test_normal_mail_creates_two_entries() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir, Arc::new(MemoryItemStore::new()));
        let mail = MailHandle::new(create_test_mail(1, 2, 0));
        store.save(&mail);

        assert_eq!(count_rows(&store, "SELECT COUNT(*) FROM character_mail"), 2);
        assert_eq!(
            count_rows(&store, "SELECT COUNT(*) FROM character_mail WHERE char_id = 1 AND is_sender = 1"),
            1
        );
        assert_eq!(
            count_rows(&store, "SELECT COUNT(*) FROM character_mail WHERE char_id = 2 AND is_sender = 0"),
            1
        );
    }

    #[test]
    fn test_non_normal_mail_creates_receiver_entry_only() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir, Arc::new(MemoryItemStore::new()));

        for kind in SenderType::ALL.into_iter().filter(|k| *k != SenderType::Normal) {
            let mail = MailHandle::new(create_test_mail(1, 2, 0).with_sender_type(kind));
            store.save(&mail);
            let entries = count_rows(
                &store,
                &format!(
                    "SELECT COUNT(*) FROM character_mail WHERE message_id = {}",
                    mail.message_id()
                ),
            );
            assert_eq!(entries, 1, "{:?}", kind);
        }

        assert!(store.sent_by_owner(1).is_empty());
        assert_eq!(store.received_by_owner(2).len(), SenderType::ALL.len() - 1);
    }

    #[test]
    fn test_find_by_owner_roles() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir, Arc::new(MemoryItemStore::new()));

        let to_bob = MailHandle::new(create_test_mail(1, 2, 0));
        let to_alice = MailHandle::new(create_test_mail(2, 1, 0));
        store.save(&to_bob);
        store.save(&to_alice);

        let received = store.find_by_owner(2, MailRole::Received);
        let sent = store.find_by_owner(2, MailRole::Sent);
        assert_eq!(received.len(), 1);
        assert!(received[0].ptr_eq(&to_bob));
        assert_eq!(sent.len(), 1);
        assert!(sent[0].ptr_eq(&to_alice));
        assert!(store.find_by_owner(3, MailRole::Received).is_empty());
    }
}

mod expiry_tests {
    use super::*;

    #[test]
    fn test_find_expired_matches_threshold_exactly() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir, Arc::new(MemoryItemStore::new()));

        let expire_times = [50, 99, 100, 101, 250, 0, 100];
        let mails: Vec<MailHandle> = expire_times
            .iter()
            .map(|&t| {
                let mail = MailHandle::new(create_test_mail(1, 2, t));
                store.save(&mail);
                mail
            })
            .collect();

        for threshold in [-1, 0, 99, 100, 101, 1_000] {
            let expected: BTreeSet<i32> = mails
                .iter()
                .filter(|m| m.read().is_expired(threshold))
                .map(MailHandle::message_id)
                .collect();
            let found: BTreeSet<i32> = store
                .find_expired(threshold)
                .iter()
                .map(MailHandle::message_id)
                .collect();
            assert_eq!(found, expected, "threshold {}", threshold);
        }
    }

    #[test]
    fn test_find_expired_skips_deleted_rows() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir, Arc::new(MemoryItemStore::new()));
        let kept = MailHandle::new(create_test_mail(1, 2, 10));
        let gone = MailHandle::new(create_test_mail(1, 2, 10));
        store.save(&kept);
        store.save(&gone);
        store.delete(&gone);

        let expired = store.find_expired(10);
        assert_eq!(expired.len(), 1);
        assert!(expired[0].ptr_eq(&kept));
    }
}

mod concurrency_tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_parallel_loads_share_one_store() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(open_store(&dir, Arc::new(MemoryItemStore::new())));

        let ids: Vec<i32> = (0..8)
            .map(|i| {
                let mail = MailHandle::new(create_test_mail(i, 2, i));
                store.save(&mail);
                mail.message_id()
            })
            .collect();
        store.cache().clear();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                let ids = ids.clone();
                thread::spawn(move || store.load_many(&ids).len())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), ids.len());
        }
        assert_eq!(store.cache().len(), ids.len());
    }
}

mod config_tests {
    use super::*;

    #[test]
    fn test_open_rejects_invalid_config() {
        let dir = TempDir::new().unwrap();
        let mut config = file_config(&dir);
        config.database.pool_size = 0;
        let err = MailStore::open(&config, Arc::new(MemoryItemStore::new())).unwrap_err();
        assert!(err.to_string().contains("database.pool_size"));
    }

    #[test]
    fn test_open_applies_options() {
        let dir = TempDir::new().unwrap();
        let mut config = file_config(&dir);
        config.store.atomic_save = true;
        config.cache.capacity = 3;

        let store = MailStore::open(&config, Arc::new(MemoryItemStore::new())).unwrap();
        assert!(store.options().atomic_save);
        assert_eq!(store.cache().capacity(), 3);

        let mail = MailHandle::new(create_test_mail(1, 2, 0));
        store.save(&mail);
        assert_eq!(count_rows(&store, "SELECT COUNT(*) FROM character_mail"), 2);
    }
}

mod condition_tests {
    use gamemail::conditions::{And, CastleLight, Condition, Env};
    use gamemail::conditions::{Castle, Creature, Player};

    struct Aden;

    impl Castle for Aden {
        fn is_light(&self) -> bool {
            false
        }
    }

    struct Lord {
        castle: Aden,
    }

    impl Player for Lord {
        fn clan_id(&self) -> Option<i32> {
            Some(269_000_001)
        }

        fn castle(&self) -> Option<&dyn Castle> {
            Some(&self.castle)
        }
    }

    impl Creature for Lord {
        fn as_player(&self) -> Option<&dyn Player> {
            Some(self)
        }
    }

    #[test]
    fn test_dark_castle_lord() {
        let lord = Lord { castle: Aden };
        let env = Env::new(&lord);

        assert!(CastleLight::new(false).test(&env));
        assert!(!CastleLight::new(true).test(&env));

        let both_sides = And::new().with(CastleLight::new(false)).with(CastleLight::new(true));
        assert!(!both_sides.test(&env));
    }
}
