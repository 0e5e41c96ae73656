//! Kraftwire server binary: runs the Kafka wire protocol server.
//!
//! Environment overrides:
//! KRAFTWIRE_ADDR (listen address), KRAFTWIRE_METADATA_LOG (segment path),
//! KRAFTWIRE_ENABLE_FETCH (`1`/`true` registers the Fetch stub).

use kraftwire::broker::parse_flag;
use kraftwire::{server, Broker, BrokerConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn env_flag(name: &str) -> bool {
    std::env::var(name).map(|v| parse_flag(&v)).unwrap_or(false)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("kraftwire=info".parse()?))
        .init();

    let defaults = BrokerConfig::default();
    let config = BrokerConfig {
        listen_addr: std::env::var("KRAFTWIRE_ADDR").unwrap_or(defaults.listen_addr),
        metadata_log_path: std::env::var_os("KRAFTWIRE_METADATA_LOG")
            .map(PathBuf::from)
            .unwrap_or(defaults.metadata_log_path),
        enable_fetch: env_flag("KRAFTWIRE_ENABLE_FETCH"),
    };
    let broker = Arc::new(Broker::new(config));
    tracing::info!(
        metadata_log = %broker.config().metadata_log_path.display(),
        apis = ?broker.registry().api_keys(),
        "starting"
    );

    server::run_kafka_server(broker).await?;
    Ok(())
}
