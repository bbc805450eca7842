//! Client-side session lifecycle: the stored record, the shared expiry policy,
//! the guard evaluated on protected navigation, the one-second countdown and
//! teardown back to the login surface.

mod record;
mod store;
mod policy;
mod navigator;
mod guard;
mod clock;
mod login;

use std::sync::Arc;

pub use record::SessionRecord;
pub use store::SessionStore;
pub use policy::{ExpiryPolicy, ManualTime, SystemTime, TimeSource, SESSION_TIMEOUT, format_countdown, is_expired};
pub use navigator::{LoginRedirect, Navigation, Navigator, Teardown, TeardownReason};
pub use guard::{GuardState, SessionGuard, classify};
pub use clock::{ClockTick, SessionClock, CLOCK_CADENCE};
pub use login::LoginClient;

use crate::storage::SharedStorage;

/// The pieces every session component is built from, wired once.
#[derive(Clone)]
pub struct SessionContext {
    pub store: SessionStore,
    pub policy: ExpiryPolicy,
    pub teardown: Teardown,
}

impl SessionContext {
    pub fn new(storage: SharedStorage, navigator: Arc<dyn Navigator>, time: Arc<dyn TimeSource>) -> Self {
        let store = SessionStore::new(storage);
        let teardown = Teardown::new(store.clone(), navigator);
        Self { store, policy: ExpiryPolicy::new(time), teardown }
    }

    pub fn storage(&self) -> &SharedStorage { self.store.storage() }

    pub fn guard(&self) -> SessionGuard {
        SessionGuard::new(self.store.clone(), self.policy.clone(), self.teardown.clone())
    }

    pub fn clock(&self) -> SessionClock {
        SessionClock::new(self.store.clone(), self.policy.clone(), self.teardown.clone())
    }

    pub fn login_client(&self, http: reqwest::Client, base: reqwest::Url) -> LoginClient {
        LoginClient::new(http, base, self.store.clone(), self.policy.clone(), self.teardown.clone())
    }

    /// Greeting for the logged-in operator, if any.
    pub fn badge(&self) -> Option<String> {
        self.store.get().map(|r| format!("Welcome, {}!", r.subject))
    }
}
