//! Metrics sinks.
//!
//! [`InfluxDbSink`] speaks the InfluxDB 1.x HTTP API: `/ping` to check the
//! server, `/query` to create the database, `/write` with line protocol.

use std::fmt::Write as _;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::types::{FieldValue, Point};

#[async_trait]
pub trait MetricsSink: Send + Sync {
    async fn write(&self, points: &[Point]) -> Result<()>;

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct InfluxDbSink {
    http: Client,
    base_url: String,
    database: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<StatementResult>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatementResult {
    error: Option<String>,
}

impl InfluxDbSink {
    /// Connect to `host:port` and check that the server answers `/ping`.
    ///
    /// `host` may omit the scheme, in which case `http://` is assumed.
    pub async fn connect(host: &str, port: u16, timeout: Duration) -> Result<Self> {
        let host = host.trim_end_matches('/');
        let base_url = if host.contains("://") {
            format!("{host}:{port}")
        } else {
            format!("http://{host}:{port}")
        };
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("failed to create HTTP client: {e}")))?;

        let res = http
            .get(format!("{base_url}/ping"))
            .send()
            .await
            .map_err(|e| Error::publish(format!("could not connect to InfluxDB on {base_url}: {e}")))?;
        check_status(res, "ping").await?;
        info!(%base_url, "connected to InfluxDB");

        Ok(Self {
            http,
            base_url,
            database: None,
        })
    }

    /// Create `name` if needed and direct subsequent writes to it.
    pub async fn ensure_database(&mut self, name: &str) -> Result<()> {
        let q = format!("CREATE DATABASE {}", quote_identifier(name));
        let res = self
            .http
            .post(format!("{}/query", self.base_url))
            .query(&[("q", q.as_str())])
            .send()
            .await
            .map_err(|e| Error::publish(format!("create database request failed: {e}")))?;
        let res = check_status(res, "create database").await?;

        let body: QueryResponse = res
            .json()
            .await
            .map_err(|e| Error::publish(format!("unreadable query response: {e}")))?;
        if let Some(err) = body
            .error
            .or_else(|| body.results.into_iter().find_map(|r| r.error))
        {
            return Err(Error::publish(format!("create database `{name}` failed: {err}")));
        }

        debug!(database = %name, "database ready");
        self.database = Some(name.to_string());
        Ok(())
    }

    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }
}

#[async_trait]
impl MetricsSink for InfluxDbSink {
    async fn write(&self, points: &[Point]) -> Result<()> {
        let Some(db) = self.database.as_deref() else {
            return Err(Error::publish("no database selected; call ensure_database first"));
        };
        if points.is_empty() {
            return Ok(());
        }

        let body = points.iter().map(line_protocol).collect::<Vec<_>>().join("\n");
        let res = self
            .http
            .post(format!("{}/write", self.base_url))
            .query(&[("db", db), ("precision", "ns")])
            .body(body)
            .send()
            .await
            .map_err(|e| Error::publish(format!("write request failed: {e}")))?;
        check_status(res, "write").await?;

        info!(count = points.len(), database = %db, "wrote points to InfluxDB");
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        debug!(base_url = %self.base_url, "closing InfluxDB sink");
        Ok(())
    }
}

async fn check_status(res: Response, operation: &str) -> Result<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let text = res.text().await.unwrap_or_default();
    Err(Error::publish(format!(
        "{operation} returned HTTP {status}: {}",
        text.trim()
    )))
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Encode one point as an InfluxDB line-protocol line (nanosecond precision).
pub fn line_protocol(point: &Point) -> String {
    let mut line = escape_key(&point.measurement, true);
    for (i, (key, value)) in point.fields.iter().enumerate() {
        line.push(if i == 0 { ' ' } else { ',' });
        line.push_str(&escape_key(key, false));
        line.push('=');
        match value {
            FieldValue::Integer(n) => {
                let _ = write!(line, "{n}i");
            }
            FieldValue::Float(x) => {
                let _ = write!(line, "{x}");
            }
            FieldValue::Boolean(b) => {
                let _ = write!(line, "{b}");
            }
            FieldValue::Text(s) => {
                line.push('"');
                line.push_str(&s.replace('\\', "\\\\").replace('"', "\\\""));
                line.push('"');
            }
        }
    }
    if let Some(ns) = point.time.timestamp_nanos_opt() {
        let _ = write!(line, " {ns}");
    }
    line
}

// measurements escape commas and spaces; keys additionally escape `=`
fn escape_key(s: &str, measurement: bool) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c == ',' || c == ' ' || (!measurement && c == '=') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
