#![allow(dead_code)]

//! In-process stand-in for a PostgREST `/rest/v1/` API.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
};
use refseed::config::{Config, RetryConfig};
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use url::Url;

pub const TEST_KEY: &str = "test-service-key";

#[derive(Default)]
pub struct FakeDb {
    pub tables: HashMap<String, Vec<Value>>,
    /// `METHOD path?query` of every request that passed auth.
    pub requests: Vec<String>,
    /// POSTs carrying one of these codes are answered with 409.
    pub reject_codes: HashSet<String>,
    /// Tables answering 404 to everything.
    pub missing_tables: HashSet<String>,
    /// Number of upcoming requests answered with 503.
    pub flaky: usize,
    /// Delay applied to POST answers after the row has been stored.
    pub slow_inserts: Option<Duration>,
    next_id: u64,
}

impl FakeDb {
    pub fn rows(&self, table: &str) -> &[Value] {
        self.tables.get(table).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn seed_row(&mut self, table: &str, row: Value) {
        self.tables.entry(table.to_string()).or_default().push(row);
    }

    fn next_id(&mut self) -> String {
        self.next_id += 1;
        format!("00000000-0000-0000-0000-{:012}", self.next_id)
    }
}

pub type SharedDb = Arc<Mutex<FakeDb>>;

pub struct FakeServer {
    pub db: SharedDb,
    pub url: Url,
}

impl FakeServer {
    pub async fn start() -> Self {
        let db: SharedDb = Arc::default();
        let app = Router::new()
            .route("/rest/v1/", get(root))
            .route(
                "/rest/v1/{table}",
                get(select_rows).post(insert_row).patch(update_rows),
            )
            .with_state(db.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake server");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake server crashed");
        });

        Self {
            db,
            url: Url::parse(&format!("http://{addr}")).expect("fake server url"),
        }
    }

    pub fn config(&self) -> Config {
        Config {
            rest_url: self.url.clone(),
            service_key: TEST_KEY.to_string(),
            request_delay_ms: 0,
            table_pause_ms: 0,
            retry: RetryConfig {
                max_times: 2,
                min_delay_ms: 1,
                max_delay_ms: 5,
            },
            ..Config::default()
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.db.lock().unwrap().requests.clone()
    }

    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.db.lock().unwrap().rows(table).to_vec()
    }
}

/// Auth, flakiness and request logging shared by every route.
fn gate(
    db: &mut FakeDb,
    headers: &HeaderMap,
    method: &Method,
    uri: &Uri,
    table: Option<&str>,
) -> Result<(), Response> {
    let key_ok = headers.get("apikey").is_some_and(|v| v == TEST_KEY)
        && headers
            .get("authorization")
            .is_some_and(|v| v == format!("Bearer {TEST_KEY}").as_str());
    if !key_ok {
        let body = Json(json!({"message": "Invalid API key"}));
        return Err((StatusCode::UNAUTHORIZED, body).into_response());
    }
    if db.flaky > 0 {
        db.flaky -= 1;
        return Err(StatusCode::SERVICE_UNAVAILABLE.into_response());
    }
    let pq = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_default();
    db.requests.push(format!("{method} {pq}"));
    if let Some(table) = table
        && db.missing_tables.contains(table)
    {
        return Err(StatusCode::NOT_FOUND.into_response());
    }
    Ok(())
}

fn wants_representation(headers: &HeaderMap) -> bool {
    headers
        .get("prefer")
        .is_some_and(|v| v == "return=representation")
}

fn matches(row: &Value, filters: &[(String, String)]) -> bool {
    filters.iter().all(|(col, val)| match val.strip_prefix("eq.") {
        Some(expected) => row.get(col).and_then(Value::as_str) == Some(expected),
        None => true,
    })
}

async fn root(
    State(db): State<SharedDb>,
    headers: HeaderMap,
    method: Method,
    uri: Uri,
) -> Response {
    let mut db = db.lock().unwrap();
    if let Err(resp) = gate(&mut db, &headers, &method, &uri, None) {
        return resp;
    }
    Json(json!({"swagger": "2.0"})).into_response()
}

async fn select_rows(
    State(db): State<SharedDb>,
    Path(table): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
    headers: HeaderMap,
    method: Method,
    uri: Uri,
) -> Response {
    let mut db = db.lock().unwrap();
    if let Err(resp) = gate(&mut db, &headers, &method, &uri, Some(&table)) {
        return resp;
    }

    let mut rows: Vec<Value> = db
        .rows(&table)
        .iter()
        .filter(|row| matches(row, &params))
        .cloned()
        .collect();
    for (key, value) in &params {
        match key.as_str() {
            "order" => {
                let (col, dir) = value.split_once('.').unwrap_or((value.as_str(), "asc"));
                rows.sort_by(|a, b| {
                    let a = a.get(col).and_then(Value::as_str).unwrap_or_default();
                    let b = b.get(col).and_then(Value::as_str).unwrap_or_default();
                    a.cmp(b)
                });
                if dir == "desc" {
                    rows.reverse();
                }
            }
            "limit" => rows.truncate(value.parse().unwrap_or(usize::MAX)),
            _ => {}
        }
    }
    Json(rows).into_response()
}

async fn insert_row(
    State(db): State<SharedDb>,
    Path(table): Path<String>,
    headers: HeaderMap,
    method: Method,
    uri: Uri,
    Json(mut body): Json<Value>,
) -> Response {
    let (resp, delay) = {
        let mut db = db.lock().unwrap();
        if let Err(resp) = gate(&mut db, &headers, &method, &uri, Some(&table)) {
            return resp;
        }
        if let Some(code) = body.get("code").and_then(Value::as_str)
            && db.reject_codes.contains(code)
        {
            return (StatusCode::CONFLICT, Json(json!({"code": "23505"}))).into_response();
        }

        if table != "countries" {
            let id = db.next_id();
            body["id"] = json!(id);
        }
        body["created_at"] = json!("2025-11-10T12:00:00+00:00");
        db.seed_row(&table, body.clone());
        let resp = if wants_representation(&headers) {
            (StatusCode::CREATED, Json(vec![body])).into_response()
        } else {
            StatusCode::CREATED.into_response()
        };
        (resp, db.slow_inserts)
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    resp
}

async fn update_rows(
    State(db): State<SharedDb>,
    Path(table): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
    headers: HeaderMap,
    method: Method,
    uri: Uri,
    Json(body): Json<Value>,
) -> Response {
    let mut db = db.lock().unwrap();
    if let Err(resp) = gate(&mut db, &headers, &method, &uri, Some(&table)) {
        return resp;
    }
    let Some(patch) = body.as_object() else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    let mut changed = Vec::new();
    if let Some(rows) = db.tables.get_mut(&table) {
        for row in rows.iter_mut().filter(|row| matches(row, &params)) {
            for (k, v) in patch {
                row[k] = v.clone();
            }
            changed.push(row.clone());
        }
    }
    if wants_representation(&headers) {
        (StatusCode::OK, Json(changed)).into_response()
    } else {
        StatusCode::NO_CONTENT.into_response()
    }
}
