//! Client configuration.
//! Values come from the environment first; the binary may override them from
//! command-line flags. The session timeout is intentionally not configurable,
//! see `session::policy::SESSION_TIMEOUT`.

use std::time::Duration;

use reqwest::Url;

use crate::error::{ConsoleError, ConsoleResult};

pub const ENV_API_BASE: &str = "DBCONSOLE_API_BASE";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "DBCONSOLE_HTTP_TIMEOUT_SECS";

pub const DEFAULT_API_BASE: &str = "http://localhost:8000/api";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    pub api_base: Url,
    pub request_timeout: Duration,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_base: Url::parse(DEFAULT_API_BASE).expect("DEFAULT_API_BASE is an absolute URL"),
            request_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl ConsoleConfig {
    pub fn from_env() -> ConsoleResult<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from an arbitrary key lookup; unset or blank keys keep defaults.
    pub fn from_lookup<F>(lookup: F) -> ConsoleResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(base) = lookup(ENV_API_BASE).filter(|s| !s.trim().is_empty()) {
            cfg.set_api_base(&base)?;
        }
        if let Some(secs) = lookup(ENV_HTTP_TIMEOUT_SECS).filter(|s| !s.trim().is_empty()) {
            cfg.set_timeout_secs(&secs)?;
        }
        Ok(cfg)
    }

    pub fn set_api_base(&mut self, base: &str) -> ConsoleResult<()> {
        let url = Url::parse(base.trim()).map_err(|e| ConsoleError::config(format!("invalid API base '{}': {}", base, e)))?;
        match url.scheme() {
            "http" | "https" => { self.api_base = url; Ok(()) }
            other => Err(ConsoleError::config(format!("unsupported API scheme '{}'", other))),
        }
    }

    pub fn set_timeout_secs(&mut self, secs: &str) -> ConsoleResult<()> {
        let n: u64 = secs.trim().parse().map_err(|_| ConsoleError::config(format!("invalid timeout '{}'", secs)))?;
        if n == 0 { return Err(ConsoleError::config("timeout must be at least 1 second")); }
        self.request_timeout = Duration::from_secs(n);
        Ok(())
    }
}

/// Append `path` to the base URL, keeping any path prefix the base carries
/// (e.g. `/api`). `Url::join` with a leading slash would drop it.
pub fn join_endpoint(base: &Url, path: &str) -> ConsoleResult<Url> {
    let joined = format!("{}/{}", base.as_str().trim_end_matches('/'), path.trim_start_matches('/'));
    Url::parse(&joined).map_err(|e| ConsoleError::Endpoint { endpoint: path.to_string(), reason: e.to_string() })
}
