//! Command console: destructive-command gate, execution through the gateway,
//! and the persisted, expandable execution history.

mod policy;
mod history;
mod command_console;

pub use policy::{classify, confirmation_for, with_confirmation, Classification, Confirmation, PolicyRule, CONFIRM_FLAG, POLICY_TABLE};
pub use history::{CommandHistory, CommandHistoryEntry, HISTORY_KEY};
pub use command_console::{confirmation_prompt, AvailableCommand, CommandConsole, Confirmer, Submission, LIST_ENDPOINT, RUN_ENDPOINT};
