use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::join_endpoint;
use crate::error::{ConsoleError, ConsoleResult};

use super::navigator::{Navigation, TeardownReason, Teardown};
use super::policy::ExpiryPolicy;
use super::record::SessionRecord;
use super::store::SessionStore;

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct LoginReply {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Login and logout. Login talks to the backend directly: no session exists
/// yet, so it does not go through the gateway.
#[derive(Clone)]
pub struct LoginClient {
    http: reqwest::Client,
    base: Url,
    store: SessionStore,
    policy: ExpiryPolicy,
    teardown: Teardown,
}

impl LoginClient {
    pub fn new(http: reqwest::Client, base: Url, store: SessionStore, policy: ExpiryPolicy, teardown: Teardown) -> Self {
        Self { http, base, store, policy, teardown }
    }

    /// POST /login; on success store a record issued now.
    pub async fn login(&self, username: &str, password: &str) -> ConsoleResult<SessionRecord> {
        let url = join_endpoint(&self.base, "/login")?;
        let resp = self.http.post(url).json(&LoginRequest { username, password }).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        let reply: LoginReply = serde_json::from_str(&body).unwrap_or_default();
        let token = reply.token.filter(|t| !t.is_empty());
        let Some(token) = token.filter(|_| status.is_success()) else {
            let msg = reply.error.unwrap_or_else(|| "Login failed".to_string());
            warn!(target: "session", user = username, status = status.as_u16(), "login rejected: {}", msg);
            return Err(ConsoleError::login(msg));
        };
        let record = SessionRecord::new(token, username, self.policy.now());
        self.store.set(&record);
        info!(target: "session", user = username, "logged in");
        Ok(record)
    }

    /// End the session locally. Returns who was logged in, if anyone.
    pub fn logout(&self) -> Option<String> {
        let subject = self.store.get().map(|r| r.subject)?;
        self.teardown.run(Navigation::Replace, TeardownReason::Logout);
        Some(subject)
    }
}
