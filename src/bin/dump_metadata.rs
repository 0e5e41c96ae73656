//! Decode a KRaft metadata log segment and print it as JSON.
//!
//! Usage: dump_metadata [PATH]
//! PATH defaults to KRAFTWIRE_METADATA_LOG, then the standard segment location.

use anyhow::Context;
use kraftwire::storage::{MetadataSegment, DEFAULT_METADATA_LOG_PATH};
use kraftwire::ClusterView;
use serde_json::json;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("kraftwire=warn".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let path = std::env::args_os()
        .nth(1)
        .or_else(|| std::env::var_os("KRAFTWIRE_METADATA_LOG"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_METADATA_LOG_PATH));

    let segment = MetadataSegment::new(&path);
    let batches = segment
        .read_batches()
        .with_context(|| format!("decoding {}", path.display()))?;
    let view = ClusterView::from_batches(&batches);
    tracing::debug!(batches = batches.len(), topics = view.topics().len(), "decoded");

    let out = json!({
        "path": path,
        "batches": batches,
        "cluster": view,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
