//! AuthGateway: every protected request goes through here.
//!
//! The current credential is attached verbatim as `Authorization` (empty when
//! logged out, which the backend rejects). A 401 or 403 tears the session down
//! and fails the call with `Unauthorized`; the body of that response is never
//! read. Any other status is handed back for the caller to interpret.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, Response, StatusCode, Url};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{join_endpoint, ConsoleConfig};
use crate::error::{ConsoleError, ConsoleResult};
use crate::session::{Navigation, SessionContext, SessionStore, Teardown, TeardownReason};

pub fn build_http_client(cfg: &ConsoleConfig) -> ConsoleResult<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(cfg.request_timeout)
        .build()?;
    Ok(client)
}

fn is_rejection(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

#[derive(Clone)]
pub struct AuthGateway {
    http: reqwest::Client,
    base: Url,
    store: SessionStore,
    teardown: Teardown,
}

impl AuthGateway {
    pub fn new(http: reqwest::Client, base: Url, session: &SessionContext) -> Self {
        Self { http, base, store: session.store.clone(), teardown: session.teardown.clone() }
    }

    pub async fn request<B: Serialize + ?Sized>(&self, method: Method, path: &str, body: Option<&B>) -> ConsoleResult<Response> {
        let url = join_endpoint(&self.base, path)?;
        let mut req = self.http
            .request(method.clone(), url)
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, self.store.credential());
        if let Some(b) = body { req = req.json(b); }
        let resp = req.send().await?;
        let status = resp.status();
        if is_rejection(status) {
            warn!(target: "gateway", %method, path, status = status.as_u16(), "backend rejected credential");
            drop(resp);
            self.teardown.run(Navigation::Full, TeardownReason::Unauthorized);
            return Err(ConsoleError::Unauthorized);
        }
        debug!(target: "gateway", %method, path, status = status.as_u16(), "response");
        Ok(resp)
    }

    pub async fn get(&self, path: &str) -> ConsoleResult<Response> {
        self.request::<()>(Method::GET, path, None).await
    }

    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ConsoleResult<Response> {
        self.request(Method::POST, path, Some(body)).await
    }

    /// POST without a body.
    pub async fn post_empty(&self, path: &str) -> ConsoleResult<Response> {
        self.request::<()>(Method::POST, path, None).await
    }
}
