use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::warn;

use super::store::SessionStore;

/// How the surface leaves the protected view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Replace the current history entry; no way back into the stale view.
    Replace,
    /// Full reload of the login surface.
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownReason {
    Unauthenticated,
    Expired,
    Unauthorized,
    CountdownElapsed,
    Logout,
}

pub trait Navigator: Send + Sync {
    fn redirect_to_login(&self, nav: Navigation, reason: TeardownReason);
}

/// Navigator that records redirects for the surface to act on when it next
/// regains control (the terminal loop polls `take_pending`).
#[derive(Debug, Default)]
pub struct LoginRedirect {
    pending: Mutex<Option<(Navigation, TeardownReason)>>,
    count: AtomicUsize,
}

impl LoginRedirect {
    pub fn new() -> Self { Self::default() }

    pub fn take_pending(&self) -> Option<(Navigation, TeardownReason)> { self.pending.lock().take() }

    pub fn is_pending(&self) -> bool { self.pending.lock().is_some() }

    pub fn redirect_count(&self) -> usize { self.count.load(Ordering::SeqCst) }
}

impl Navigator for LoginRedirect {
    fn redirect_to_login(&self, nav: Navigation, reason: TeardownReason) {
        self.count.fetch_add(1, Ordering::SeqCst);
        *self.pending.lock() = Some((nav, reason));
    }
}

/// Clear all session-scoped state, then send the operator to the login surface.
#[derive(Clone)]
pub struct Teardown {
    store: SessionStore,
    navigator: Arc<dyn Navigator>,
}

impl Teardown {
    pub fn new(store: SessionStore, navigator: Arc<dyn Navigator>) -> Self { Self { store, navigator } }

    pub fn run(&self, nav: Navigation, reason: TeardownReason) {
        let subject = self.store.get().map(|r| r.subject);
        self.store.end_session();
        warn!(target: "session", ?reason, ?nav, subject = subject.as_deref().unwrap_or(""), "session torn down; redirecting to login");
        self.navigator.redirect_to_login(nav, reason);
    }
}
