//! Destructive-command policy table.
//!
//! Matching is exact against the command with one trailing `--yes` flag
//! stripped. Rules either add the flag once confirmed or, for backend commands
//! that take no such option, prompt every time and send the bare command.
//! The table is the whole policy; nothing else in the crate decides whether a
//! command needs confirmation.

use once_cell::sync::Lazy;
use regex::Regex;

pub const CONFIRM_FLAG: &str = "--yes";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    /// Prompt unless the input already ends with `--yes`; confirmed commands
    /// carry the flag.
    Required,
    /// Always prompt. The backend command takes no `--yes` option, so the
    /// flag is never sent.
    PromptOnly,
    NotRequired,
}

#[derive(Debug, Clone, Copy)]
pub struct PolicyRule {
    pub command: &'static str,
    pub confirmation: Confirmation,
}

const fn destructive(command: &'static str) -> PolicyRule {
    PolicyRule { command, confirmation: Confirmation::Required }
}

const fn prompt_only(command: &'static str) -> PolicyRule {
    PolicyRule { command, confirmation: Confirmation::PromptOnly }
}

/// Commands that drop, truncate or rebuild the schema, with and without the
/// backend CLI's program prefix.
pub const POLICY_TABLE: &[PolicyRule] = &[
    destructive("drop-db"),
    destructive("db137 drop-db"),
    destructive("erase"),
    destructive("db137 erase"),
    destructive("erase-db"),
    destructive("db137 erase-db"),
    prompt_only("reset-db"),
    prompt_only("db137 reset-db"),
];

static TRAILING_FLAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+--yes$").expect("static regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Input with the trailing flag stripped.
    pub base: String,
    pub confirmation: Confirmation,
    /// The input already ends with the confirmation flag.
    pub flagged: bool,
}

impl Classification {
    pub fn is_destructive(&self) -> bool { self.confirmation != Confirmation::NotRequired }

    pub fn needs_prompt(&self) -> bool {
        match self.confirmation {
            Confirmation::Required => !self.flagged,
            Confirmation::PromptOnly => true,
            Confirmation::NotRequired => false,
        }
    }

    /// What goes on the wire once any prompt has been answered yes.
    pub fn wire_command(&self, trimmed: &str) -> String {
        match self.confirmation {
            Confirmation::Required => with_confirmation(trimmed),
            Confirmation::PromptOnly => self.base.clone(),
            Confirmation::NotRequired => trimmed.to_string(),
        }
    }
}

pub fn confirmation_for(base: &str) -> Confirmation {
    POLICY_TABLE
        .iter()
        .find(|r| r.command == base)
        .map(|r| r.confirmation)
        .unwrap_or(Confirmation::NotRequired)
}

/// Classify an already-trimmed command.
pub fn classify(command: &str) -> Classification {
    let flagged = TRAILING_FLAG.is_match(command);
    let base = TRAILING_FLAG.replace(command, "").trim().to_string();
    let confirmation = confirmation_for(&base);
    Classification { base, confirmation, flagged }
}

/// Command with the confirmation flag present exactly once.
pub fn with_confirmation(command: &str) -> String {
    if TRAILING_FLAG.is_match(command) { command.to_string() } else { format!("{} {}", command, CONFIRM_FLAG) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_matches_exactly() {
        assert_eq!(confirmation_for("drop-db"), Confirmation::Required);
        assert_eq!(confirmation_for("db137 erase"), Confirmation::Required);
        assert_eq!(confirmation_for("drop-db now"), Confirmation::NotRequired);
        assert_eq!(confirmation_for("DROP-DB"), Confirmation::NotRequired);
        assert_eq!(confirmation_for("db137 users list"), Confirmation::NotRequired);
    }

    #[test]
    fn classify_strips_one_trailing_flag() {
        let c = classify("drop-db");
        assert_eq!(c, Classification { base: "drop-db".into(), confirmation: Confirmation::Required, flagged: false });
        assert!(c.needs_prompt());

        let c = classify("drop-db --yes");
        assert_eq!(c.base, "drop-db");
        assert!(c.is_destructive() && c.flagged && !c.needs_prompt());

        let c = classify("db137 drop-db \t --yes");
        assert_eq!(c.base, "db137 drop-db");
        assert!(c.is_destructive());

        // flag not preceded by whitespace, or not trailing
        assert!(!classify("drop-db--yes").is_destructive());
        assert!(!classify("--yes drop-db").is_destructive());
        assert!(!classify("drop-db --yes --yes").is_destructive());
        assert!(!classify("create-db").is_destructive());
    }

    #[test]
    fn confirmation_flag_is_added_once() {
        assert_eq!(with_confirmation("drop-db"), "drop-db --yes");
        assert_eq!(with_confirmation("drop-db --yes"), "drop-db --yes");
        assert_eq!(with_confirmation("db137 erase"), "db137 erase --yes");
    }

    #[test]
    fn every_rule_has_a_pinned_wire_form() {
        let expected = [
            ("drop-db", "drop-db --yes"),
            ("db137 drop-db", "db137 drop-db --yes"),
            ("erase", "erase --yes"),
            ("db137 erase", "db137 erase --yes"),
            ("erase-db", "erase-db --yes"),
            ("db137 erase-db", "db137 erase-db --yes"),
            ("reset-db", "reset-db"),
            ("db137 reset-db", "db137 reset-db"),
        ];
        assert_eq!(POLICY_TABLE.len(), expected.len());
        for (rule, (command, wire)) in POLICY_TABLE.iter().zip(expected) {
            assert_eq!(rule.command, command);
            let c = classify(command);
            assert!(c.needs_prompt(), "{} must prompt", command);
            assert_eq!(c.wire_command(command), wire);
        }
    }

    #[test]
    fn reset_never_carries_the_flag() {
        let c = classify("db137 reset-db --yes");
        assert_eq!(c.confirmation, Confirmation::PromptOnly);
        assert!(c.flagged && c.needs_prompt());
        assert_eq!(c.wire_command("db137 reset-db --yes"), "db137 reset-db");
        assert_eq!(classify("db137 users list").wire_command("db137 users list"), "db137 users list");
        assert_eq!(classify("erase-db --yes").wire_command("erase-db --yes"), "erase-db --yes");
    }
}
