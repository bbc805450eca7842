use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use super::navigator::{Navigation, TeardownReason, Teardown};
use super::policy::ExpiryPolicy;
use super::store::SessionStore;

pub const CLOCK_CADENCE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockTick {
    Running { remaining: Duration },
    /// Expiry reached on this tick; teardown ran.
    Elapsed,
    /// No session to count down (ended elsewhere).
    Stopped,
}

/// Visible countdown over the authoritative `issued_at`. It keeps no counter of
/// its own, so it can never disagree with the guard; Refresh re-stamps the
/// stored issuance time.
#[derive(Clone)]
pub struct SessionClock {
    store: SessionStore,
    policy: ExpiryPolicy,
    teardown: Teardown,
}

impl SessionClock {
    pub fn new(store: SessionStore, policy: ExpiryPolicy, teardown: Teardown) -> Self {
        Self { store, policy, teardown }
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.store.get().map(|r| self.policy.remaining(r.issued_at))
    }

    pub fn tick(&self) -> ClockTick {
        let Some(record) = self.store.get() else { return ClockTick::Stopped; };
        if self.policy.is_expired(record.issued_at) {
            self.teardown.run(Navigation::Full, TeardownReason::CountdownElapsed);
            return ClockTick::Elapsed;
        }
        ClockTick::Running { remaining: self.policy.remaining(record.issued_at) }
    }

    /// Reset the countdown to the full timeout. Local only: the backend
    /// credential's own lifetime is not extended.
    pub fn refresh(&self) -> bool {
        let touched = self.store.touch(self.policy.now());
        if touched { info!(target: "session", "countdown refreshed"); }
        touched
    }

    /// Tick every second until the session elapses or disappears.
    pub fn spawn<F>(self, mut on_tick: F) -> JoinHandle<ClockTick>
    where
        F: FnMut(ClockTick) + Send + 'static,
    {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(CLOCK_CADENCE);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // first tick of a tokio interval completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                let t = self.tick();
                on_tick(t);
                match t {
                    ClockTick::Running { .. } => continue,
                    ClockTick::Elapsed | ClockTick::Stopped => {
                        debug!(target: "session", ?t, "countdown finished");
                        return t;
                    }
                }
            }
        })
    }
}
