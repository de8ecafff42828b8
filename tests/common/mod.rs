#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::routing::{get, post};
use axum::Router;
use base64::{engine::general_purpose::STANDARD as B64, Engine};
use tokio::net::TcpListener;
use vrage_metrics::{build_hash, MetricsSink, Point};

pub const KEY_B64: &str = "XKb8xk7vrKaq+BpallYnGA==";

pub const SAMPLE_BODY: &str = r#"{"data":{"TotalTime":120,"IsReady":true,"PirateUsedPCU":0,"SimulationCpuLoad":0.42,"ServerName":"S","WorldName":"W","SimSpeed":1.0,"Players":3,"Game":"SE","Version":"1.0","UsedPCU":500,"ServerId":7}}"#;

/// A request as the fake remote API saw it.
#[derive(Debug, Clone)]
pub struct Seen {
    pub path: String,
    pub date: String,
    pub authorization: String,
    pub nonce: u64,
}

/// Stand-in for the VRage remote API. Rejects anything whose signature does
/// not verify against `KEY_B64`.
pub struct FakeApi {
    key: Vec<u8>,
    responses: Mutex<HashMap<String, (StatusCode, String)>>,
    delay: Mutex<Duration>,
    pub seen: Mutex<Vec<Seen>>,
}

impl FakeApi {
    pub fn respond(&self, path: &str, status: StatusCode, body: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(path.to_string(), (status, body.to_string()));
    }

    pub fn set_delay(&self, d: Duration) {
        *self.delay.lock().unwrap() = d;
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }
}

pub async fn spawn_fake_api() -> (String, Arc<FakeApi>) {
    let api = Arc::new(FakeApi {
        key: B64.decode(KEY_B64).unwrap(),
        responses: Mutex::new(HashMap::new()),
        delay: Mutex::new(Duration::ZERO),
        seen: Mutex::new(Vec::new()),
    });
    api.respond("/vrageremote/v1/server", StatusCode::OK, SAMPLE_BODY);

    let app = Router::new().fallback(api_handler).with_state(api.clone());
    let addr = serve(app).await;
    (format!("http://{addr}"), api)
}

async fn api_handler(
    State(api): State<Arc<FakeApi>>,
    uri: Uri,
    headers: HeaderMap,
) -> (StatusCode, String) {
    let delay = *api.delay.lock().unwrap();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let path = uri.path().to_string();
    let date = header_str(&headers, header::DATE);
    let authorization = header_str(&headers, header::AUTHORIZATION);
    let Some((nonce, signature)) = authorization.split_once(':') else {
        return (StatusCode::UNAUTHORIZED, "missing authorization".into());
    };
    let Ok(nonce) = nonce.parse::<u64>() else {
        return (StatusCode::UNAUTHORIZED, "bad nonce".into());
    };
    if build_hash(&api.key, &path, nonce, &date) != signature {
        return (StatusCode::FORBIDDEN, "bad signature".into());
    }

    api.seen.lock().unwrap().push(Seen {
        path: path.clone(),
        date,
        authorization: authorization.clone(),
        nonce,
    });

    match api.responses.lock().unwrap().get(&path) {
        Some((status, body)) => (*status, body.clone()),
        None => (StatusCode::NOT_FOUND, "no such resource".into()),
    }
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Stand-in for an InfluxDB 1.x server.
#[derive(Default)]
pub struct FakeInflux {
    pub queries: Mutex<Vec<String>>,
    pub writes: Mutex<Vec<(HashMap<String, String>, String)>>,
    pub query_error: Mutex<Option<String>>,
    pub write_status: Mutex<Option<StatusCode>>,
}

pub async fn spawn_fake_influx() -> (SocketAddr, Arc<FakeInflux>) {
    let influx = Arc::new(FakeInflux::default());
    let app = Router::new()
        .route("/ping", get(|| async { StatusCode::NO_CONTENT }))
        .route("/query", post(influx_query))
        .route("/write", post(influx_write))
        .with_state(influx.clone());
    (serve(app).await, influx)
}

async fn influx_query(
    State(influx): State<Arc<FakeInflux>>,
    Query(params): Query<HashMap<String, String>>,
) -> axum::Json<serde_json::Value> {
    influx
        .queries
        .lock()
        .unwrap()
        .push(params.get("q").cloned().unwrap_or_default());
    let body = match influx.query_error.lock().unwrap().clone() {
        Some(err) => serde_json::json!({"results": [{"statement_id": 0, "error": err}]}),
        None => serde_json::json!({"results": [{"statement_id": 0}]}),
    };
    axum::Json(body)
}

async fn influx_write(
    State(influx): State<Arc<FakeInflux>>,
    Query(params): Query<HashMap<String, String>>,
    body: String,
) -> (StatusCode, String) {
    if let Some(status) = *influx.write_status.lock().unwrap() {
        return (status, "{\"error\":\"unable to parse\"}".into());
    }
    influx.writes.lock().unwrap().push((params, body));
    (StatusCode::NO_CONTENT, String::new())
}

async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Sink that keeps every batch it is given.
#[derive(Default, Clone)]
pub struct RecordingSink {
    pub batches: Arc<Mutex<Vec<Vec<Point>>>>,
}

impl RecordingSink {
    pub fn batches(&self) -> Vec<Vec<Point>> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetricsSink for RecordingSink {
    async fn write(&self, points: &[Point]) -> vrage_metrics::Result<()> {
        self.batches.lock().unwrap().push(points.to_vec());
        Ok(())
    }
}
