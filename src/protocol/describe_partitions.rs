//! DescribeTopicPartitions (key 75).
//!
//! Topics come from the metadata log, re-read on every request. Names that
//! are not in the log are answered with `UNKNOWN_TOPIC_OR_PARTITION`.

use super::codec::{
    put_compact_array, put_compact_string, put_empty_tagged_fields, put_uuid, read_bool,
    read_compact_array, read_compact_string, read_i16, read_i32, read_i8, read_uuid,
    skip_tagged_fields, Decode, Encode,
};
use super::frame::RequestHeader;
use super::registry::ApiHandler;
use super::{error_code, API_DESCRIBE_TOPIC_PARTITIONS};
use crate::broker::Broker;
use crate::error::DecodeResult;
use crate::types::{PartitionState, TopicState};
use bytes::{BufMut, Bytes, BytesMut};
use tracing::debug;
use uuid::Uuid;

/// Authorized-operations value sent for every topic.
pub const TOPIC_AUTHORIZED_OPERATIONS: i32 = 0;

/// Pagination cursor: resume at `partition_index` of `topic_name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    pub topic_name: String,
    pub partition_index: i32,
}

/// Nullable struct: `int8 -1` for null, otherwise `1` followed by the fields.
fn read_cursor(src: &mut Bytes) -> DecodeResult<Option<Cursor>> {
    if read_i8(src)? < 0 {
        return Ok(None);
    }
    let topic_name = read_compact_string(src)?.unwrap_or_default();
    let partition_index = read_i32(src)?;
    skip_tagged_fields(src)?;
    Ok(Some(Cursor {
        topic_name,
        partition_index,
    }))
}

fn put_cursor(dst: &mut BytesMut, cursor: Option<&Cursor>) {
    match cursor {
        None => dst.put_i8(-1),
        Some(cursor) => {
            dst.put_i8(1);
            put_compact_string(dst, &cursor.topic_name);
            dst.put_i32(cursor.partition_index);
            put_empty_tagged_fields(dst);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescribePartitionsRequest {
    pub topics: Vec<String>,
    pub response_partition_limit: i32,
    pub cursor: Option<Cursor>,
}

impl Decode for DescribePartitionsRequest {
    fn decode(src: &mut Bytes) -> DecodeResult<Self> {
        let topics = read_compact_array(src, |src| {
            let name = read_compact_string(src)?.unwrap_or_default();
            skip_tagged_fields(src)?;
            Ok(name)
        })?
        .unwrap_or_default();
        let response_partition_limit = read_i32(src)?;
        let cursor = read_cursor(src)?;
        skip_tagged_fields(src)?;
        Ok(Self {
            topics,
            response_partition_limit,
            cursor,
        })
    }
}

impl Encode for DescribePartitionsRequest {
    fn encode(&self, dst: &mut BytesMut) {
        put_compact_array(dst, &self.topics, |dst, name| {
            put_compact_string(dst, name);
            put_empty_tagged_fields(dst);
        });
        dst.put_i32(self.response_partition_limit);
        put_cursor(dst, self.cursor.as_ref());
        put_empty_tagged_fields(dst);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescribedPartition {
    pub error_code: i16,
    pub partition_index: i32,
    pub leader_id: i32,
    pub leader_epoch: i32,
    pub replica_nodes: Vec<i32>,
    pub isr_nodes: Vec<i32>,
    pub eligible_leader_replicas: Vec<i32>,
    pub last_known_elr: Vec<i32>,
    pub offline_replicas: Vec<i32>,
}

impl From<&PartitionState> for DescribedPartition {
    fn from(partition: &PartitionState) -> Self {
        Self {
            error_code: error_code::NONE,
            partition_index: partition.partition_index,
            leader_id: partition.leader_id,
            leader_epoch: partition.leader_epoch,
            replica_nodes: partition.replicas.clone(),
            isr_nodes: partition.isr.clone(),
            eligible_leader_replicas: Vec::new(),
            last_known_elr: Vec::new(),
            offline_replicas: Vec::new(),
        }
    }
}

fn put_i32_array(dst: &mut BytesMut, values: &[i32]) {
    put_compact_array(dst, values, |dst, v| dst.put_i32(*v));
}

fn read_i32_array(src: &mut Bytes) -> DecodeResult<Vec<i32>> {
    Ok(read_compact_array(src, read_i32)?.unwrap_or_default())
}

impl Encode for DescribedPartition {
    fn encode(&self, dst: &mut BytesMut) {
        dst.put_i16(self.error_code);
        dst.put_i32(self.partition_index);
        dst.put_i32(self.leader_id);
        dst.put_i32(self.leader_epoch);
        put_i32_array(dst, &self.replica_nodes);
        put_i32_array(dst, &self.isr_nodes);
        put_i32_array(dst, &self.eligible_leader_replicas);
        put_i32_array(dst, &self.last_known_elr);
        put_i32_array(dst, &self.offline_replicas);
        put_empty_tagged_fields(dst);
    }
}

impl Decode for DescribedPartition {
    fn decode(src: &mut Bytes) -> DecodeResult<Self> {
        let partition = Self {
            error_code: read_i16(src)?,
            partition_index: read_i32(src)?,
            leader_id: read_i32(src)?,
            leader_epoch: read_i32(src)?,
            replica_nodes: read_i32_array(src)?,
            isr_nodes: read_i32_array(src)?,
            eligible_leader_replicas: read_i32_array(src)?,
            last_known_elr: read_i32_array(src)?,
            offline_replicas: read_i32_array(src)?,
        };
        skip_tagged_fields(src)?;
        Ok(partition)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescribedTopic {
    pub error_code: i16,
    pub name: String,
    pub topic_id: Uuid,
    pub is_internal: bool,
    pub partitions: Vec<DescribedPartition>,
    pub authorized_operations: i32,
}

impl DescribedTopic {
    /// Placeholder for a requested name the metadata log does not know.
    pub fn unknown(name: impl Into<String>) -> Self {
        Self {
            error_code: error_code::UNKNOWN_TOPIC_OR_PARTITION,
            name: name.into(),
            topic_id: Uuid::nil(),
            is_internal: false,
            partitions: Vec::new(),
            authorized_operations: TOPIC_AUTHORIZED_OPERATIONS,
        }
    }
}

impl From<&TopicState> for DescribedTopic {
    fn from(topic: &TopicState) -> Self {
        Self {
            error_code: error_code::NONE,
            name: topic.name.clone(),
            topic_id: topic.topic_id,
            is_internal: false,
            partitions: topic.partitions.iter().map(DescribedPartition::from).collect(),
            authorized_operations: TOPIC_AUTHORIZED_OPERATIONS,
        }
    }
}

impl Encode for DescribedTopic {
    fn encode(&self, dst: &mut BytesMut) {
        dst.put_i16(self.error_code);
        put_compact_string(dst, &self.name);
        put_uuid(dst, &self.topic_id);
        dst.put_u8(u8::from(self.is_internal));
        put_compact_array(dst, &self.partitions, |dst, p| p.encode(dst));
        dst.put_i32(self.authorized_operations);
        put_empty_tagged_fields(dst);
    }
}

impl Decode for DescribedTopic {
    fn decode(src: &mut Bytes) -> DecodeResult<Self> {
        let topic = Self {
            error_code: read_i16(src)?,
            name: read_compact_string(src)?.unwrap_or_default(),
            topic_id: read_uuid(src)?,
            is_internal: read_bool(src)?,
            partitions: read_compact_array(src, DescribedPartition::decode)?.unwrap_or_default(),
            authorized_operations: read_i32(src)?,
        };
        skip_tagged_fields(src)?;
        Ok(topic)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescribePartitionsResponse {
    pub throttle_time_ms: i32,
    pub topics: Vec<DescribedTopic>,
    /// Always `None` from this broker.
    pub next_cursor: Option<Cursor>,
}

impl Encode for DescribePartitionsResponse {
    fn encode(&self, dst: &mut BytesMut) {
        dst.put_i32(self.throttle_time_ms);
        put_compact_array(dst, &self.topics, |dst, t| t.encode(dst));
        put_cursor(dst, self.next_cursor.as_ref());
        put_empty_tagged_fields(dst);
    }
}

impl Decode for DescribePartitionsResponse {
    fn decode(src: &mut Bytes) -> DecodeResult<Self> {
        let throttle_time_ms = read_i32(src)?;
        let topics = read_compact_array(src, DescribedTopic::decode)?.unwrap_or_default();
        let next_cursor = read_cursor(src)?;
        skip_tagged_fields(src)?;
        Ok(Self {
            throttle_time_ms,
            topics,
            next_cursor,
        })
    }
}

pub struct DescribePartitionsHandler;

impl ApiHandler for DescribePartitionsHandler {
    type Request = DescribePartitionsRequest;
    type Response = DescribePartitionsResponse;

    const API_KEY: i16 = API_DESCRIBE_TOPIC_PARTITIONS;
    const NAME: &'static str = "DescribeTopicPartitions";

    fn handle(
        &self,
        broker: &Broker,
        _header: &RequestHeader,
        request: DescribePartitionsRequest,
    ) -> DescribePartitionsResponse {
        let metadata = broker.load_metadata();
        let topics = request
            .topics
            .iter()
            .map(|name| match metadata.topic_by_name(name) {
                Some(topic) => DescribedTopic::from(topic),
                None => {
                    debug!(topic = %name, "topic not in metadata log");
                    DescribedTopic::unknown(name.as_str())
                }
            })
            .collect();
        DescribePartitionsResponse {
            throttle_time_ms: 0,
            topics,
            next_cursor: None,
        }
    }
}
