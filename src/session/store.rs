use chrono::{DateTime, Utc};

use crate::storage::SharedStorage;

use super::record::{SessionRecord, KEY_ISSUED_AT, KEY_SUBJECT, KEY_TOKEN};

/// Typed view over session-scoped storage holding the current `SessionRecord`.
/// Every read and write touches all three fields inside one storage operation.
#[derive(Clone)]
pub struct SessionStore {
    storage: SharedStorage,
}

impl SessionStore {
    pub fn new(storage: SharedStorage) -> Self { Self { storage } }

    pub fn storage(&self) -> &SharedStorage { &self.storage }

    pub fn set(&self, record: &SessionRecord) {
        let ts = record.issued_at_field();
        self.storage.update(&mut |m| {
            m.insert(KEY_TOKEN.to_string(), record.credential.clone());
            m.insert(KEY_SUBJECT.to_string(), record.subject.clone());
            m.insert(KEY_ISSUED_AT.to_string(), ts.clone());
        });
    }

    pub fn get(&self) -> Option<SessionRecord> {
        let mut out = None;
        self.storage.read(&mut |m| {
            out = SessionRecord::from_fields(m.get(KEY_TOKEN), m.get(KEY_SUBJECT), m.get(KEY_ISSUED_AT));
        });
        out
    }

    pub fn is_present(&self) -> bool { self.get().is_some() }

    /// Remove the record. Idempotent.
    pub fn clear(&self) {
        self.storage.update(&mut |m| {
            m.remove(KEY_TOKEN);
            m.remove(KEY_SUBJECT);
            m.remove(KEY_ISSUED_AT);
        });
    }

    /// Remove the record together with every other session-scoped key
    /// (persisted history included).
    pub fn end_session(&self) { self.storage.clear(); }

    /// Move `issued_at` forward for the current record. Returns false when no
    /// complete record exists; a partial record is never re-stamped.
    pub fn touch(&self, issued_at: DateTime<Utc>) -> bool {
        let mut touched = false;
        let ts = issued_at.timestamp_millis().to_string();
        self.storage.update(&mut |m| {
            let present = SessionRecord::from_fields(m.get(KEY_TOKEN), m.get(KEY_SUBJECT), m.get(KEY_ISSUED_AT)).is_some();
            if present {
                m.insert(KEY_ISSUED_AT.to_string(), ts.clone());
                touched = true;
            }
        });
        touched
    }

    /// Credential for the Authorization header; empty when logged out.
    pub fn credential(&self) -> String { self.get().map(|r| r.credential).unwrap_or_default() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, SessionStorage};
    use chrono::TimeZone;
    use std::sync::Arc;

    fn rec() -> SessionRecord {
        SessionRecord::new("alice:pw", "alice", Utc.timestamp_millis_opt(1_700_000_000_000).unwrap())
    }

    #[test]
    fn set_get_clear() {
        let store = SessionStore::new(MemoryStorage::shared());
        assert!(store.get().is_none());
        assert_eq!(store.credential(), "");
        store.set(&rec());
        assert_eq!(store.get(), Some(rec()));
        assert_eq!(store.credential(), "alice:pw");
        store.clear();
        assert!(store.get().is_none());
        store.clear();
        assert!(store.get().is_none());
    }

    #[test]
    fn clear_keeps_other_keys_end_session_does_not() {
        let storage = Arc::new(MemoryStorage::new());
        let store = SessionStore::new(storage.clone());
        store.set(&rec());
        storage.set_item("command_history", "[]".into());
        store.clear();
        assert_eq!(storage.get_item("command_history").as_deref(), Some("[]"));
        store.set(&rec());
        store.end_session();
        assert!(storage.is_empty());
    }

    #[test]
    fn partial_record_reads_absent_and_is_not_touched() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set_item(KEY_TOKEN, "t".into());
        storage.set_item(KEY_SUBJECT, "u".into());
        let store = SessionStore::new(storage.clone());
        assert!(store.get().is_none());
        assert!(!store.touch(Utc::now()));
        assert!(storage.get_item(KEY_ISSUED_AT).is_none());
    }

    #[test]
    fn touch_moves_issued_at() {
        let store = SessionStore::new(MemoryStorage::shared());
        store.set(&rec());
        let later = Utc.timestamp_millis_opt(1_700_000_600_000).unwrap();
        assert!(store.touch(later));
        let got = store.get().unwrap();
        assert_eq!(got.issued_at, later);
        assert_eq!(got.credential, "alice:pw");
    }
}
