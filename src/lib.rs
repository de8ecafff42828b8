//! Space Engineers server metrics: signed requests against the VRage remote
//! API, projected into InfluxDB points.

pub mod canon;
pub mod client;
pub mod clock;
pub mod collector;
pub mod config;
pub mod error;
pub mod nonce;
pub mod signing;
pub mod sink;
pub mod types;

pub use client::VrageClient;
pub use clock::{Clock, ManualClock, SystemClock, Timestamper};
pub use collector::{MetricsCollector, Stage};
pub use config::Config;
pub use error::{Error, Result, SchemaProblem};
pub use nonce::NonceCounter;
pub use signing::{build_hash, SignedRequest, SignedRequestBuilder};
pub use sink::{InfluxDbSink, MetricsSink};
pub use types::{FieldValue, Point, ServerStatus, ServerStatusPoint};
