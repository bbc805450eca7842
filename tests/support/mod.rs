//! Shared harness for integration tests: an in-process mock of the admin
//! backend and a fully wired client around it.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use reqwest::Url;
use serde_json::{json, Value};

use dbconsole::config::ConsoleConfig;
use dbconsole::console::{CommandConsole, Confirmer};
use dbconsole::gateway::{build_http_client, AuthGateway};
use dbconsole::session::{LoginClient, LoginRedirect, ManualTime, SessionContext, SessionRecord, TimeSource};
use dbconsole::storage::MemoryStorage;

pub const USER: &str = "alice";
pub const PASSWORD: &str = "secret";
pub const TOKEN: &str = "alice:secret";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub path: String,
    pub authorization: String,
    pub body: String,
}

#[derive(Default)]
pub struct Backend {
    pub hits: Mutex<Vec<Hit>>,
}

impl Backend {
    pub fn hits_for(&self, path: &str) -> Vec<Hit> {
        self.hits.lock().iter().filter(|h| h.path == path).cloned().collect()
    }

    pub fn run_commands(&self) -> Vec<String> {
        self.hits_for("/api/cli/run")
            .into_iter()
            .map(|h| serde_json::from_str::<Value>(&h.body).ok().and_then(|v| v["command"].as_str().map(str::to_string)).unwrap_or_default())
            .collect()
    }

    fn record(&self, path: &str, headers: &HeaderMap, body: &str) -> bool {
        let authorization = headers.get("authorization").and_then(|v| v.to_str().ok()).unwrap_or("").to_string();
        let ok = authorization == TOKEN;
        self.hits.lock().push(Hit { path: path.to_string(), authorization, body: body.to_string() });
        ok
    }
}

type Shared = Arc<Backend>;

async fn login(State(b): State<Shared>, Json(v): Json<Value>) -> impl IntoResponse {
    b.hits.lock().push(Hit { path: "/api/login".into(), authorization: String::new(), body: v.to_string() });
    if v["username"] == USER && v["password"] == PASSWORD {
        (StatusCode::OK, Json(json!({"token": TOKEN})))
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({"error": "Invalid credentials"})))
    }
}

async fn cli_list(State(b): State<Shared>, headers: HeaderMap) -> impl IntoResponse {
    if !b.record("/api/cli/list", &headers, "") { return (StatusCode::UNAUTHORIZED, "denied").into_response(); }
    Json(json!({"commands": [
        {"name": "db137 create-db", "description": "Create schema and deploy all SQL scripts"},
        {"name": "db137 drop-db", "description": "Drop the entire schema"},
        {"name": "db137 users list"}
    ]})).into_response()
}

async fn cli_run(State(b): State<Shared>, headers: HeaderMap, body: String) -> impl IntoResponse {
    if !b.record("/api/cli/run", &headers, &body) {
        return (StatusCode::UNAUTHORIZED, "{\"error\":\"secret detail\"}".to_string()).into_response();
    }
    let v: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
    let cmd = v["command"].as_str().unwrap_or("").to_string();
    if let Some(ms) = cmd.strip_prefix("slow ").and_then(|s| s.parse::<u64>().ok()) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        return (StatusCode::OK, format!("done {}\n", ms)).into_response();
    }
    match cmd.as_str() {
        "fail" => (StatusCode::INTERNAL_SERVER_ERROR, "  boom\n".to_string()).into_response(),
        "forbidden" => (StatusCode::FORBIDDEN, "nope".to_string()).into_response(),
        _ => (StatusCode::OK, format!("\n  ran {}  \n", cmd)).into_response(),
    }
}

async fn schema(State(b): State<Shared>, headers: HeaderMap) -> impl IntoResponse {
    if !b.record("/api/schema", &headers, "") { return StatusCode::FORBIDDEN.into_response(); }
    Json(json!({"tables": ["Artist", "Festival"], "views": ["v_lineup"]})).into_response()
}

async fn definition(State(b): State<Shared>, headers: HeaderMap, Path(name): Path<String>) -> impl IntoResponse {
    b.record("/api/definition", &headers, &name);
    if name == "Artist" { (StatusCode::OK, "CREATE TABLE Artist (id INT);".to_string()) } else { (StatusCode::NOT_FOUND, "Table not found".to_string()) }
}

async fn browse(State(b): State<Shared>, headers: HeaderMap, Path(table): Path<String>) -> impl IntoResponse {
    if !b.record("/api/browse", &headers, &table) { return StatusCode::UNAUTHORIZED.into_response(); }
    match table.as_str() {
        "Artist" => Json(json!([{"id": 1, "name": "Daft Punk"}, {"id": 2, "name": "Air"}])).into_response(),
        "Stage Door" => Json(json!([])).into_response(),
        other => (StatusCode::BAD_REQUEST, Json(json!({"error": format!("Table 'festival.{}' doesn't exist", other)}))).into_response(),
    }
}

async fn query(State(b): State<Shared>, headers: HeaderMap, Json(v): Json<Value>) -> impl IntoResponse {
    if !b.record("/api/query", &headers, &v.to_string()) { return StatusCode::UNAUTHORIZED.into_response(); }
    let sql = v["sql"].as_str().unwrap_or("");
    if sql.is_empty() { return (StatusCode::BAD_REQUEST, Json(json!({"error": "Query is empty"}))).into_response(); }
    Json(json!([{"n": 1}])).into_response()
}

/// Start the mock backend; returns its API base (`http://127.0.0.1:<port>/api`).
pub async fn spawn_backend() -> (Url, Arc<Backend>) {
    let backend = Arc::new(Backend::default());
    let app = Router::new()
        .route("/api/login", post(login))
        .route("/api/cli/list", get(cli_list))
        .route("/api/cli/run", post(cli_run))
        .route("/api/schema", post(schema))
        .route("/api/definition/{name}", get(definition))
        .route("/api/browse/{table}", post(browse))
        .route("/api/query", post(query))
        .with_state(backend.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    let base = Url::parse(&format!("http://{}/api", addr)).expect("url");
    (base, backend)
}

/// An API base nothing listens on.
pub async fn dead_base() -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    Url::parse(&format!("http://{}/api", addr)).expect("url")
}

/// Confirmer with a fixed answer that remembers what it was asked.
#[derive(Default)]
pub struct ScriptedConfirmer {
    pub answer: bool,
    pub asked: Mutex<Vec<String>>,
    pub count: AtomicUsize,
}

impl ScriptedConfirmer {
    pub fn answering(answer: bool) -> Arc<Self> { Arc::new(Self { answer, ..Default::default() }) }

    pub fn prompts(&self) -> usize { self.count.load(Ordering::SeqCst) }
}

impl Confirmer for ScriptedConfirmer {
    fn confirm(&self, base: &str) -> bool {
        self.count.fetch_add(1, Ordering::SeqCst);
        self.asked.lock().push(base.to_string());
        self.answer
    }
}

pub struct Harness {
    pub ctx: SessionContext,
    pub storage: Arc<MemoryStorage>,
    pub redirect: Arc<LoginRedirect>,
    pub time: Arc<ManualTime>,
    pub gateway: AuthGateway,
    pub login: LoginClient,
}

impl Harness {
    pub fn new(base: Url) -> Self {
        let storage = Arc::new(MemoryStorage::new());
        let redirect = Arc::new(LoginRedirect::new());
        let time = Arc::new(ManualTime::new(Utc.timestamp_millis_opt(1_700_000_000_000).unwrap()));
        let ctx = SessionContext::new(storage.clone(), redirect.clone(), time.clone());
        let http = build_http_client(&ConsoleConfig::default()).expect("client");
        let login = ctx.login_client(http.clone(), base.clone());
        let gateway = AuthGateway::new(http, base, &ctx);
        Self { ctx, storage, redirect, time, gateway, login }
    }

    /// Harness with a valid session already stored.
    pub fn logged_in(base: Url) -> Self {
        let h = Self::new(base);
        h.ctx.store.set(&SessionRecord::new(TOKEN, USER, h.time.now()));
        h
    }

    pub fn console(&self, confirmer: Arc<dyn Confirmer>) -> CommandConsole {
        CommandConsole::new(self.gateway.clone(), self.storage.clone(), confirmer)
    }
}
