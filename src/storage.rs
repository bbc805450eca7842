//! Session-scoped key/value storage.
//!
//! One store holds everything that must live exactly as long as the login
//! session: the session record fields and the persisted command history. It is
//! injected into every component that needs it rather than reached as a global.
//! Multi-key changes go through `update`, which applies the closure under a single
//! write lock so no reader ever observes a half-applied mutation.
//!
//! Every `clear` starts a new generation. Work that outlives the session it
//! started in (a command still in flight at teardown) writes through
//! `update_within`, which refuses once the generation has moved on.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

pub type StorageMap = BTreeMap<String, String>;

pub trait SessionStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: String);
    fn remove_item(&self, key: &str);
    /// Remove every key.
    fn clear(&self);
    /// Consistent read of several keys at once.
    fn read(&self, f: &mut dyn FnMut(&StorageMap));
    /// Atomic read-modify-write over the whole map.
    fn update(&self, f: &mut dyn FnMut(&mut StorageMap));
    /// Number of `clear` calls so far.
    fn generation(&self) -> u64;
    /// `update`, applied only while the storage is still in `generation`.
    /// Returns whether the closure ran.
    fn update_within(&self, generation: u64, f: &mut dyn FnMut(&mut StorageMap)) -> bool;
}

pub type SharedStorage = Arc<dyn SessionStorage>;

#[derive(Debug, Default)]
struct Slot {
    map: StorageMap,
    generation: u64,
}

/// Process-lifetime storage; dropped with the process like a tab's session storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slot: RwLock<Slot>,
}

impl MemoryStorage {
    pub fn new() -> Self { Self::default() }

    pub fn shared() -> SharedStorage { Arc::new(Self::new()) }

    pub fn len(&self) -> usize { self.slot.read().map.len() }

    pub fn is_empty(&self) -> bool { self.slot.read().map.is_empty() }
}

impl SessionStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> { self.slot.read().map.get(key).cloned() }

    fn set_item(&self, key: &str, value: String) { self.slot.write().map.insert(key.to_string(), value); }

    fn remove_item(&self, key: &str) { self.slot.write().map.remove(key); }

    fn clear(&self) {
        let mut slot = self.slot.write();
        slot.map.clear();
        slot.generation += 1;
    }

    fn read(&self, f: &mut dyn FnMut(&StorageMap)) {
        let slot = self.slot.read();
        f(&slot.map);
    }

    fn update(&self, f: &mut dyn FnMut(&mut StorageMap)) {
        let mut slot = self.slot.write();
        f(&mut slot.map);
    }

    fn generation(&self) -> u64 { self.slot.read().generation }

    fn update_within(&self, generation: u64, f: &mut dyn FnMut(&mut StorageMap)) -> bool {
        let mut slot = self.slot.write();
        if slot.generation != generation { return false; }
        f(&mut slot.map);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_items() {
        let s = MemoryStorage::new();
        assert!(s.get_item("a").is_none());
        s.set_item("a", "1".into());
        s.set_item("b", "2".into());
        assert_eq!(s.get_item("a").as_deref(), Some("1"));
        s.remove_item("a");
        s.remove_item("a");
        assert!(s.get_item("a").is_none());
        assert_eq!(s.len(), 1);
        s.clear();
        assert!(s.is_empty());
    }

    #[test]
    fn update_applies_all_changes_together() {
        let s = MemoryStorage::new();
        s.update(&mut |m| {
            m.insert("x".into(), "1".into());
            m.insert("y".into(), "2".into());
        });
        let mut seen = Vec::new();
        s.read(&mut |m| seen = m.keys().cloned().collect());
        assert_eq!(seen, vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn clear_starts_a_new_generation() {
        let s = MemoryStorage::new();
        let g = s.generation();
        assert!(s.update_within(g, &mut |m| { m.insert("k".into(), "1".into()); }));
        s.remove_item("k");
        assert_eq!(s.generation(), g);
        s.clear();
        assert_eq!(s.generation(), g + 1);
        assert!(!s.update_within(g, &mut |m| { m.insert("late".into(), "1".into()); }));
        assert!(s.is_empty());
        assert!(s.update_within(g + 1, &mut |m| { m.insert("k".into(), "2".into()); }));
        assert_eq!(s.get_item("k").as_deref(), Some("2"));
    }
}
