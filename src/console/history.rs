//! Command history persisted to session-scoped storage.
//!
//! Every mutation is applied as one atomic read-modify-write against the
//! persisted sequence, and the in-memory copy is replaced by the result. Two
//! executions completing at the same time therefore both land, in completion
//! order, even when several console instances share the same storage.
//! Appends are tied to the storage generation the command started in, so a
//! result arriving after teardown never reaches the next session.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConsoleError, ConsoleResult};
use crate::storage::{SharedStorage, StorageMap};

pub const HISTORY_KEY: &str = "command_history";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandHistoryEntry {
    pub command: String,
    pub output: String,
    pub success: bool,
    pub expanded: bool,
}

impl CommandHistoryEntry {
    pub fn completed<C: Into<String>, O: Into<String>>(command: C, output: O, success: bool) -> Self {
        Self { command: command.into(), output: output.into(), success, expanded: true }
    }
}

fn decode(map: &StorageMap) -> Vec<CommandHistoryEntry> {
    let Some(raw) = map.get(HISTORY_KEY) else { return Vec::new(); };
    match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            warn!(target: "console", "discarding unreadable persisted history: {}", e);
            Vec::new()
        }
    }
}

fn encode(map: &mut StorageMap, entries: &[CommandHistoryEntry]) {
    match serde_json::to_string(entries) {
        Ok(s) => { map.insert(HISTORY_KEY.to_string(), s); }
        Err(e) => warn!(target: "console", "failed to persist history: {}", e),
    }
}

#[derive(Clone)]
pub struct CommandHistory {
    storage: SharedStorage,
    entries: Arc<RwLock<Vec<CommandHistoryEntry>>>,
}

impl CommandHistory {
    /// Restore whatever the storage holds; unreadable data restores empty.
    pub fn restore(storage: SharedStorage) -> Self {
        let mut entries = Vec::new();
        storage.read(&mut |m| entries = decode(m));
        Self { storage, entries: Arc::new(RwLock::new(entries)) }
    }

    pub fn entries(&self) -> Vec<CommandHistoryEntry> { self.entries.read().clone() }

    pub fn len(&self) -> usize { self.entries.read().len() }

    pub fn is_empty(&self) -> bool { self.entries.read().is_empty() }

    pub fn get(&self, index: usize) -> Option<CommandHistoryEntry> { self.entries.read().get(index).cloned() }

    /// Storage generation new work should be recorded against.
    pub fn generation(&self) -> u64 { self.storage.generation() }

    /// Append an entry for work started in `generation`. Once the session has
    /// been torn down since, nothing is written and `false` is returned.
    pub fn append(&self, generation: u64, entry: CommandHistoryEntry) -> bool {
        let mut mem = self.entries.write();
        let mut next = Vec::new();
        let written = self.storage.update_within(generation, &mut |m| {
            next = decode(m);
            next.push(entry.clone());
            encode(m, &next);
        });
        if written { *mem = next; }
        written
    }

    /// Flip `expanded` on one entry; returns the new value.
    pub fn toggle_expand(&self, index: usize) -> ConsoleResult<bool> {
        let mut mem = self.entries.write();
        let mut next = Vec::new();
        let mut flipped = None;
        self.storage.update(&mut |m| {
            next = decode(m);
            if let Some(e) = next.get_mut(index) {
                e.expanded = !e.expanded;
                flipped = Some(e.expanded);
                encode(m, &next);
            }
        });
        *mem = next;
        flipped.ok_or(ConsoleError::HistoryIndex(index))
    }

    pub fn clear(&self) {
        let mut mem = self.entries.write();
        self.storage.update(&mut |m| { m.remove(HISTORY_KEY); });
        mem.clear();
    }
}
