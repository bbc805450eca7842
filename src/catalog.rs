//! Read-only catalog, table browsing and ad-hoc SQL through the gateway.
//! Only fetching lives here; presenting the results is the surface's business.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ConsoleError, ConsoleResult};
use crate::gateway::AuthGateway;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaOverview {
    #[serde(default)]
    pub tables: Vec<String>,
    #[serde(default)]
    pub views: Vec<String>,
    #[serde(default)]
    pub triggers: Vec<String>,
    #[serde(default)]
    pub procedures: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Table,
    View,
    Procedure,
    Trigger,
}

impl ObjectKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "table" | "tables" => Some(ObjectKind::Table),
            "view" | "views" => Some(ObjectKind::View),
            "procedure" | "procedures" | "proc" => Some(ObjectKind::Procedure),
            "trigger" | "triggers" => Some(ObjectKind::Trigger),
            _ => None,
        }
    }

    fn endpoint(self) -> &'static str {
        match self {
            ObjectKind::Table => "definition",
            ObjectKind::View => "view_definition",
            ObjectKind::Procedure => "procedure_definition",
            ObjectKind::Trigger => "trigger_definition",
        }
    }
}

/// Pull the `error` field out of a JSON error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

#[derive(Clone)]
pub struct CatalogClient {
    gateway: AuthGateway,
}

impl CatalogClient {
    pub fn new(gateway: AuthGateway) -> Self { Self { gateway } }

    pub async fn schema(&self) -> ConsoleResult<SchemaOverview> {
        let resp = self.gateway.post_empty("/schema").await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() { return Err(ConsoleError::backend(status.as_u16(), error_message(&body))); }
        Ok(serde_json::from_str(&body)?)
    }

    /// Definition text of a named object; `None` when the backend has none.
    pub async fn definition(&self, kind: ObjectKind, name: &str) -> ConsoleResult<Option<String>> {
        let path = format!("/{}/{}", kind.endpoint(), urlencoding::encode(name));
        let resp = self.gateway.get(&path).await?;
        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND { return Ok(None); }
        let body = resp.text().await?;
        if !status.is_success() { return Err(ConsoleError::backend(status.as_u16(), error_message(&body))); }
        Ok(Some(body))
    }

    /// First rows of a table as the backend returns them (a JSON array of objects).
    pub async fn browse(&self, table: &str) -> ConsoleResult<Value> {
        let path = format!("/browse/{}", urlencoding::encode(table.trim()));
        let resp = self.gateway.post_empty(&path).await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() { return Err(ConsoleError::backend(status.as_u16(), error_message(&body))); }
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn query(&self, sql: &str) -> ConsoleResult<Value> {
        let resp = self.gateway.post("/query", &serde_json::json!({ "sql": sql.trim() })).await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() { return Err(ConsoleError::backend(status.as_u16(), error_message(&body))); }
        Ok(serde_json::from_str(&body)?)
    }
}
