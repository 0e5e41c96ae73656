//! Kraftwire: a read-only Kafka broker front end backed by a KRaft metadata log.
//!
//! Speaks ApiVersions and DescribeTopicPartitions (plus an optional Fetch
//! stub) over the Kafka binary protocol, answering topic queries from the
//! `__cluster_metadata` segment on disk.

pub mod broker;
pub mod cluster;
pub mod error;
pub mod observability;
pub mod protocol;
pub mod server;
pub mod storage;
pub mod types;

pub use broker::{Broker, BrokerConfig, MetadataLoad};
pub use cluster::ClusterView;
pub use error::{DecodeError, ErrorClass, KraftwireError, Result};
pub use protocol::{ApiRegistry, DecodedRequest, RequestHeader};
pub use storage::{MetadataSegment, RecordBatch};
pub use types::{PartitionState, TopicState};
