use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::ConsoleResult;
use crate::gateway::AuthGateway;
use crate::storage::SharedStorage;

use super::history::{CommandHistory, CommandHistoryEntry};
use super::policy::{self, Classification};

pub const RUN_ENDPOINT: &str = "/cli/run";
pub const LIST_ENDPOINT: &str = "/cli/list";

/// Interactive yes/no gate for destructive commands.
pub trait Confirmer: Send + Sync {
    fn confirm(&self, base: &str) -> bool;
}

pub fn confirmation_prompt(base: &str) -> String {
    format!("Are you sure you want to run: {}?", base)
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AvailableCommand {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Default, Deserialize)]
struct CommandList {
    #[serde(default)]
    commands: Vec<AvailableCommand>,
}

#[derive(Debug, Serialize)]
struct RunRequest<'a> {
    command: &'a str,
}

/// Outcome of `submit`, decided before any network activity.
#[derive(Debug)]
pub enum Submission {
    /// Empty or whitespace-only input.
    Ignored,
    /// Destructive command the operator did not confirm.
    Declined,
    /// Sent; the task resolves to the appended entry, or `None` when the
    /// session was torn down instead.
    Dispatched { command: String, handle: JoinHandle<Option<CommandHistoryEntry>> },
}

impl Submission {
    pub fn is_dispatched(&self) -> bool { matches!(self, Submission::Dispatched { .. }) }

    pub async fn wait(self) -> Option<CommandHistoryEntry> {
        match self {
            Submission::Dispatched { handle, .. } => handle.await.ok().flatten(),
            Submission::Ignored | Submission::Declined => None,
        }
    }
}

#[derive(Clone)]
pub struct CommandConsole {
    gateway: AuthGateway,
    history: CommandHistory,
    confirmer: Arc<dyn Confirmer>,
    input: Arc<Mutex<String>>,
    available: Arc<RwLock<Vec<AvailableCommand>>>,
}

impl CommandConsole {
    /// Initialise over session storage, restoring any persisted history.
    pub fn new(gateway: AuthGateway, storage: SharedStorage, confirmer: Arc<dyn Confirmer>) -> Self {
        Self {
            gateway,
            history: CommandHistory::restore(storage),
            confirmer,
            input: Arc::new(Mutex::new(String::new())),
            available: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn history(&self) -> &CommandHistory { &self.history }

    pub fn input(&self) -> String { self.input.lock().clone() }

    pub fn set_input(&self, text: &str) { *self.input.lock() = text.to_string(); }

    pub fn available(&self) -> Vec<AvailableCommand> { self.available.read().clone() }

    /// Fetch the backend's command list. Failures leave the list empty.
    pub async fn load_available(&self) -> Vec<AvailableCommand> {
        let list = match self.gateway.get(LIST_ENDPOINT).await {
            Ok(resp) => resp.json::<CommandList>().await.map(|l| l.commands).unwrap_or_else(|e| {
                debug!(target: "console", "command list unreadable: {}", e);
                Vec::new()
            }),
            Err(e) => {
                debug!(target: "console", "command list unavailable: {}", e);
                Vec::new()
            }
        };
        *self.available.write() = list.clone();
        list
    }

    /// Submit whatever is in the input field.
    pub fn submit_input(&self) -> Submission {
        let raw = self.input();
        self.submit(&raw)
    }

    /// Classify, gate and dispatch a command. Must be called inside a tokio
    /// runtime; execution continues in the background and lands in history.
    pub fn submit(&self, raw: &str) -> Submission {
        let trimmed = raw.trim();
        if trimmed.is_empty() { return Submission::Ignored; }

        let class: Classification = policy::classify(trimmed);
        if class.needs_prompt() && !self.confirmer.confirm(&class.base) {
            info!(target: "console", command = %class.base, "destructive command declined");
            return Submission::Declined;
        }
        let command = class.wire_command(trimmed);

        self.input.lock().clear();

        let this = self.clone();
        let wire = command.clone();
        let generation = self.history.generation();
        let handle = tokio::spawn(async move { this.execute(wire, generation).await });
        Submission::Dispatched { command, handle }
    }

    /// Send one command as-is and record the outcome against the session
    /// generation it was submitted in. Only reachable through `submit`, so
    /// nothing skips the confirmation gate.
    async fn execute(&self, command: String, generation: u64) -> Option<CommandHistoryEntry> {
        let entry = match self.gateway.post(RUN_ENDPOINT, &RunRequest { command: &command }).await {
            Ok(resp) => {
                let ok = resp.status().is_success();
                match resp.text().await {
                    Ok(text) => CommandHistoryEntry::completed(command.as_str(), text.trim(), ok),
                    Err(e) => CommandHistoryEntry::completed(command.as_str(), e.to_string(), false),
                }
            }
            Err(e) if e.is_session_fatal() => {
                debug!(target: "console", command = %command, "session ended during execution");
                return None;
            }
            Err(e) => CommandHistoryEntry::completed(command.as_str(), e.to_string(), false),
        };
        if !self.history.append(generation, entry.clone()) {
            debug!(target: "console", command = %entry.command, "session ended before the result arrived; discarded");
            return None;
        }
        info!(target: "console", command = %entry.command, success = entry.success, "command finished");
        Some(entry)
    }

    pub fn toggle_expand(&self, index: usize) -> ConsoleResult<bool> { self.history.toggle_expand(index) }

    /// Empty history (memory and storage) and the input field.
    pub fn clear(&self) {
        self.history.clear();
        self.input.lock().clear();
    }
}
