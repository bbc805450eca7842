//! The one expiry policy shared by the guard and the countdown.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

/// Fixed client-side session lifetime.
pub const SESSION_TIMEOUT: Duration = Duration::from_secs(15 * 60);

pub trait TimeSource: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTime;

impl TimeSource for SystemTime {
    fn now(&self) -> DateTime<Utc> { Utc::now() }
}

/// Manually advanced time for deterministic tests and replays.
#[derive(Debug)]
pub struct ManualTime {
    now: Mutex<DateTime<Utc>>,
}

impl ManualTime {
    pub fn new(start: DateTime<Utc>) -> Self { Self { now: Mutex::new(start) } }

    pub fn advance(&self, by: Duration) {
        let mut g = self.now.lock();
        *g += chrono::Duration::milliseconds(by.as_millis() as i64);
    }
}

impl TimeSource for ManualTime {
    fn now(&self) -> DateTime<Utc> { *self.now.lock() }
}

fn timeout_ms() -> i64 { SESSION_TIMEOUT.as_millis() as i64 }

/// `now - issued_at > SESSION_TIMEOUT`. A record issued in the future is not expired.
pub fn is_expired(issued_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now.signed_duration_since(issued_at).num_milliseconds() > timeout_ms()
}

/// Time left before expiry, clamped to `[0, SESSION_TIMEOUT]`.
pub fn remaining(issued_at: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    let elapsed = now.signed_duration_since(issued_at).num_milliseconds().max(0);
    let left = (timeout_ms() - elapsed).max(0);
    Duration::from_millis(left as u64)
}

#[derive(Clone)]
pub struct ExpiryPolicy {
    time: Arc<dyn TimeSource>,
}

impl ExpiryPolicy {
    pub fn new(time: Arc<dyn TimeSource>) -> Self { Self { time } }

    pub fn timeout(&self) -> Duration { SESSION_TIMEOUT }

    pub fn now(&self) -> DateTime<Utc> { self.time.now() }

    pub fn is_expired(&self, issued_at: DateTime<Utc>) -> bool { is_expired(issued_at, self.now()) }

    pub fn remaining(&self, issued_at: DateTime<Utc>) -> Duration { remaining(issued_at, self.now()) }
}

/// Render a countdown as `m:ss`, rounding partial seconds up.
pub fn format_countdown(left: Duration) -> String {
    let secs = left.as_millis().div_ceil(1000) as u64;
    format!("{}:{:02}", secs / 60, secs % 60)
}
