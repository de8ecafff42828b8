//! One fetch → project → publish cycle per [`MetricsCollector::collect`] call.

use std::fmt;

use tracing::{debug, info, warn};

use crate::client::{VrageClient, SERVER_RESOURCE};
use crate::clock::Timestamper;
use crate::error::Result;
use crate::sink::MetricsSink;
use crate::types::{ServerStatus, ServerStatusPoint};

/// How far a cycle got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    RequestBuilt,
    ResponseReceived,
    Parsed,
    Projected,
    Published,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Idle => "idle",
            Stage::RequestBuilt => "request_built",
            Stage::ResponseReceived => "response_received",
            Stage::Parsed => "parsed",
            Stage::Projected => "projected",
            Stage::Published => "published",
        };
        f.write_str(s)
    }
}

pub struct MetricsCollector<S> {
    client: VrageClient,
    sink: S,
    timestamper: Timestamper,
}

impl<S: MetricsSink> MetricsCollector<S> {
    pub fn new(client: VrageClient, sink: S, timestamper: Timestamper) -> Self {
        Self {
            client,
            sink,
            timestamper,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Run one cycle. Nothing is written unless every field projected cleanly.
    pub async fn collect(&self) -> Result<ServerStatusPoint> {
        let mut stage = Stage::Idle;
        let result = self.run(&mut stage).await;
        match &result {
            Ok(point) => info!(
                %stage,
                timestamp = %point.timestamp_iso(),
                players = point.status.players,
                "collection cycle complete"
            ),
            Err(e) => warn!(%stage, error = %e, "collection cycle failed"),
        }
        result
    }

    async fn run(&self, stage: &mut Stage) -> Result<ServerStatusPoint> {
        let req = self.client.sign(SERVER_RESOURCE);
        *stage = Stage::RequestBuilt;
        debug!(%stage, method_path = %req.method_path, nonce = req.nonce);

        let raw = self.client.fetch(&req).await?;
        *stage = Stage::ResponseReceived;
        debug!(%stage, bytes = raw.body.len());

        let body = raw.json()?;
        *stage = Stage::Parsed;

        let status = ServerStatus::from_response(&body)?;
        let point = ServerStatusPoint {
            timestamp: self.timestamper.now(),
            status,
        };
        *stage = Stage::Projected;
        debug!(%stage, timestamp = %point.timestamp_iso());

        self.sink.write(&[point.to_point()]).await?;
        *stage = Stage::Published;
        Ok(point)
    }
}
