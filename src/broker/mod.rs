//! Broker context shared by every connection.

mod metadata;

pub use metadata::MetadataLoad;

use crate::cluster::ClusterView;
use crate::error::Result;
use crate::observability::observability;
use crate::protocol::{decode_request, frame_response, ApiRegistry, DecodedRequest};
use crate::storage::{MetadataSegment, DEFAULT_METADATA_LOG_PATH};
use bytes::{Bytes, BytesMut};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Broker-wide configuration.
#[derive(Clone, Debug)]
pub struct BrokerConfig {
    pub listen_addr: String,
    /// Segment read by DescribeTopicPartitions on every request.
    pub metadata_log_path: PathBuf,
    /// Register the Fetch stub under API key 1.
    pub enable_fetch: bool,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:9092".to_string(),
            metadata_log_path: PathBuf::from(DEFAULT_METADATA_LOG_PATH),
            enable_fetch: false,
        }
    }
}

/// Boolean config value: `1` or `true` (any case, surrounding whitespace
/// ignored). Anything else is false.
pub fn parse_flag(value: &str) -> bool {
    let value = value.trim();
    value == "1" || value.eq_ignore_ascii_case("true")
}

/// Read-only handler context: configuration plus the dispatch table.
#[derive(Debug)]
pub struct Broker {
    config: BrokerConfig,
    registry: ApiRegistry,
}

impl Broker {
    pub fn new(config: BrokerConfig) -> Self {
        let registry = ApiRegistry::for_config(&config);
        Self { config, registry }
    }

    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    pub fn registry(&self) -> &ApiRegistry {
        &self.registry
    }

    pub fn metadata_segment(&self) -> MetadataSegment {
        MetadataSegment::new(&self.config.metadata_log_path)
    }

    /// Read and project the metadata log. Called once per request that needs
    /// it; nothing is cached.
    pub fn load_metadata(&self) -> MetadataLoad {
        let segment = self.metadata_segment();
        match segment.read_batches() {
            Ok(batches) => {
                let view = ClusterView::from_batches(&batches);
                let orphaned = view.orphaned_partitions().len();
                observability().record_metadata_read(true, orphaned);
                if orphaned > 0 {
                    warn!(
                        path = %segment.path().display(),
                        orphaned,
                        "partition records without a preceding topic record were dropped"
                    );
                }
                debug!(
                    batches = batches.len(),
                    topics = view.topics().len(),
                    "metadata log loaded"
                );
                MetadataLoad::Topics(view)
            }
            Err(reason) => {
                observability().record_metadata_read(false, 0);
                warn!(error = %reason, "metadata log unreadable; answering with no topics");
                MetadataLoad::PartialFailure { reason }
            }
        }
    }

    /// Dispatch a decoded request and frame the response.
    pub fn handle_request(&self, request: DecodedRequest) -> Result<BytesMut> {
        let DecodedRequest { header, body } = request;
        let response = self.registry.dispatch(self, &header, body)?;
        Ok(frame_response(header.correlation_id, &response))
    }

    /// Decode the header of one frame payload, dispatch it, frame the response.
    pub fn handle_frame(&self, payload: Bytes) -> Result<BytesMut> {
        self.handle_request(decode_request(payload)?)
    }
}
