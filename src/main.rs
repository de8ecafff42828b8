// src/main.rs
use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use vrage_metrics::{
    Config, InfluxDbSink, MetricsCollector, MetricsSink, SignedRequestBuilder, Timestamper,
    VrageClient,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = Config::from_env().context("loading configuration")?;
    info!(
        api = %cfg.api_url,
        db = %cfg.db_name,
        zone = ?cfg.assumed_local_timezone,
        "starting vrage-metrics"
    );

    let signer = SignedRequestBuilder::new(&cfg.api_key)?;
    let client = VrageClient::new(&cfg.api_url, signer, cfg.http_timeout)?;

    let mut sink = InfluxDbSink::connect(&cfg.db_host, cfg.db_port, cfg.http_timeout).await?;
    sink.ensure_database(&cfg.db_name).await?;

    let collector = MetricsCollector::new(client, sink, Timestamper::new(cfg.assumed_local_timezone));

    match cfg.interval {
        None => {
            collector.collect().await?;
        }
        Some(every) => {
            info!(interval_secs = every.as_secs(), "collecting on a fixed interval");
            let mut ticker = tokio::time::interval(every);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = collector.collect().await {
                            error!("collection error: {e}");
                        }
                    }
                    _ = tokio::signal::ctrl_c() => {
                        info!("shutting down");
                        break;
                    }
                }
            }
        }
    }

    collector.sink().close().await?;
    Ok(())
}
