//! Unified client error model.
//! Session-fatal errors (unauthorized, expired) are separated from errors the
//! operator can recover from inline (execution, transport, input).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsoleError {
    /// The backend rejected the credential (401/403). Teardown already ran.
    #[error("Unauthorized")]
    Unauthorized,
    /// No session record exists. Teardown already ran.
    #[error("not logged in")]
    NotLoggedIn,
    /// The local expiry policy ended the session. Teardown already ran.
    #[error("session expired")]
    Expired,
    #[error("{0}")]
    Login(String),
    #[error("invalid endpoint '{endpoint}': {reason}")]
    Endpoint { endpoint: String, reason: String },
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend returned {status}: {message}")]
    Backend { status: u16, message: String },
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("no history entry at index {0}")]
    HistoryIndex(usize),
}

impl ConsoleError {
    pub fn code_str(&self) -> &'static str {
        match self {
            ConsoleError::Unauthorized => "unauthorized",
            ConsoleError::NotLoggedIn => "not_logged_in",
            ConsoleError::Expired => "expired",
            ConsoleError::Login(_) => "login_failed",
            ConsoleError::Endpoint { .. } => "bad_endpoint",
            ConsoleError::Transport(_) => "transport",
            ConsoleError::Backend { .. } => "backend",
            ConsoleError::Decode(_) => "decode",
            ConsoleError::Config(_) => "config",
            ConsoleError::HistoryIndex(_) => "history_index",
        }
    }

    /// True for the class of errors that end the session (teardown + redirect).
    pub fn is_session_fatal(&self) -> bool {
        matches!(self, ConsoleError::Unauthorized | ConsoleError::NotLoggedIn | ConsoleError::Expired)
    }

    pub fn login<S: Into<String>>(msg: S) -> Self { ConsoleError::Login(msg.into()) }
    pub fn backend<S: Into<String>>(status: u16, msg: S) -> Self { ConsoleError::Backend { status, message: msg.into() } }
    pub fn config<S: Into<String>>(msg: S) -> Self { ConsoleError::Config(msg.into()) }
}

pub type ConsoleResult<T> = Result<T, ConsoleError>;
