use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{ConsoleError, ConsoleResult};

use super::navigator::{Navigation, TeardownReason, Teardown};
use super::policy::{self, ExpiryPolicy};
use super::record::SessionRecord;
use super::store::SessionStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardState {
    Unauthenticated,
    Authenticated(SessionRecord),
    Expired,
}

impl GuardState {
    pub fn is_authenticated(&self) -> bool { matches!(self, GuardState::Authenticated(_)) }
}

/// Pure state derivation, no side effects.
pub fn classify(record: Option<SessionRecord>, now: DateTime<Utc>) -> GuardState {
    match record {
        None => GuardState::Unauthenticated,
        Some(r) if policy::is_expired(r.issued_at, now) => GuardState::Expired,
        Some(r) => GuardState::Authenticated(r),
    }
}

/// Gate for protected views. Re-evaluated on every protected navigation; it
/// never runs on a timer (that is the countdown's job).
#[derive(Clone)]
pub struct SessionGuard {
    store: SessionStore,
    policy: ExpiryPolicy,
    teardown: Teardown,
}

impl SessionGuard {
    pub fn new(store: SessionStore, policy: ExpiryPolicy, teardown: Teardown) -> Self {
        Self { store, policy, teardown }
    }

    /// Derive the state; `Unauthenticated` and `Expired` tear the session down
    /// and redirect to login replacing history.
    pub fn evaluate(&self) -> GuardState {
        let state = classify(self.store.get(), self.policy.now());
        match &state {
            GuardState::Authenticated(r) => debug!(target: "session", subject = %r.subject, "guard: authenticated"),
            GuardState::Expired => self.teardown.run(Navigation::Replace, TeardownReason::Expired),
            GuardState::Unauthenticated => self.teardown.run(Navigation::Replace, TeardownReason::Unauthenticated),
        }
        state
    }

    /// Run protected content only when authenticated.
    pub fn enter<T, F>(&self, content: F) -> ConsoleResult<T>
    where
        F: FnOnce(&SessionRecord) -> T,
    {
        match self.evaluate() {
            GuardState::Authenticated(r) => Ok(content(&r)),
            GuardState::Expired => Err(ConsoleError::Expired),
            GuardState::Unauthenticated => Err(ConsoleError::NotLoggedIn),
        }
    }
}
