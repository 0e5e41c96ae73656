//! Fetch (key 1).
//!
//! The request is parsed in full, but the handler does not read any log. It
//! answers with one fixed topic/partition so clients can exercise the
//! response encoding. Registered only when `BrokerConfig::enable_fetch` is set.

use super::codec::{
    put_compact_array, put_compact_bytes, put_compact_nullable_string, put_empty_tagged_fields,
    put_uuid, read_compact_array, read_compact_bytes, read_compact_string, read_i16, read_i32,
    read_i64, read_i8, read_uuid, skip_tagged_fields, Decode, Encode,
};
use super::frame::RequestHeader;
use super::registry::ApiHandler;
use super::{error_code, API_FETCH};
use crate::broker::Broker;
use crate::error::DecodeResult;
use bytes::{BufMut, Bytes, BytesMut};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPartition {
    pub partition: i32,
    pub current_leader_epoch: i32,
    pub fetch_offset: i64,
    pub last_fetched_epoch: i32,
    pub log_start_offset: i64,
    pub partition_max_bytes: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTopic {
    pub topic_id: Uuid,
    pub partitions: Vec<FetchPartition>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForgottenTopic {
    pub topic_id: Uuid,
    pub partitions: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub max_wait_ms: i32,
    pub min_bytes: i32,
    pub max_bytes: i32,
    pub isolation_level: i8,
    pub session_id: i32,
    pub session_epoch: i32,
    pub topics: Vec<FetchTopic>,
    pub forgotten_topics: Vec<ForgottenTopic>,
    pub rack_id: Option<String>,
}

fn read_fetch_partition(src: &mut Bytes) -> DecodeResult<FetchPartition> {
    let partition = FetchPartition {
        partition: read_i32(src)?,
        current_leader_epoch: read_i32(src)?,
        fetch_offset: read_i64(src)?,
        last_fetched_epoch: read_i32(src)?,
        log_start_offset: read_i64(src)?,
        partition_max_bytes: read_i32(src)?,
    };
    skip_tagged_fields(src)?;
    Ok(partition)
}

fn read_fetch_topic(src: &mut Bytes) -> DecodeResult<FetchTopic> {
    let topic_id = read_uuid(src)?;
    let partitions = read_compact_array(src, read_fetch_partition)?.unwrap_or_default();
    skip_tagged_fields(src)?;
    Ok(FetchTopic {
        topic_id,
        partitions,
    })
}

fn read_forgotten_topic(src: &mut Bytes) -> DecodeResult<ForgottenTopic> {
    let topic_id = read_uuid(src)?;
    let partitions = read_compact_array(src, read_i32)?.unwrap_or_default();
    skip_tagged_fields(src)?;
    Ok(ForgottenTopic {
        topic_id,
        partitions,
    })
}

impl Decode for FetchRequest {
    fn decode(src: &mut Bytes) -> DecodeResult<Self> {
        let request = Self {
            max_wait_ms: read_i32(src)?,
            min_bytes: read_i32(src)?,
            max_bytes: read_i32(src)?,
            isolation_level: read_i8(src)?,
            session_id: read_i32(src)?,
            session_epoch: read_i32(src)?,
            topics: read_compact_array(src, read_fetch_topic)?.unwrap_or_default(),
            forgotten_topics: read_compact_array(src, read_forgotten_topic)?.unwrap_or_default(),
            rack_id: read_compact_string(src)?,
        };
        skip_tagged_fields(src)?;
        Ok(request)
    }
}

impl Encode for FetchRequest {
    fn encode(&self, dst: &mut BytesMut) {
        dst.put_i32(self.max_wait_ms);
        dst.put_i32(self.min_bytes);
        dst.put_i32(self.max_bytes);
        dst.put_i8(self.isolation_level);
        dst.put_i32(self.session_id);
        dst.put_i32(self.session_epoch);
        put_compact_array(dst, &self.topics, |dst, topic| {
            put_uuid(dst, &topic.topic_id);
            put_compact_array(dst, &topic.partitions, |dst, p| {
                dst.put_i32(p.partition);
                dst.put_i32(p.current_leader_epoch);
                dst.put_i64(p.fetch_offset);
                dst.put_i32(p.last_fetched_epoch);
                dst.put_i64(p.log_start_offset);
                dst.put_i32(p.partition_max_bytes);
                put_empty_tagged_fields(dst);
            });
            put_empty_tagged_fields(dst);
        });
        put_compact_array(dst, &self.forgotten_topics, |dst, topic| {
            put_uuid(dst, &topic.topic_id);
            put_compact_array(dst, &topic.partitions, |dst, p| dst.put_i32(*p));
            put_empty_tagged_fields(dst);
        });
        put_compact_nullable_string(dst, self.rack_id.as_deref());
        put_empty_tagged_fields(dst);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbortedTransaction {
    pub producer_id: i64,
    pub first_offset: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponsePartition {
    pub partition_index: i32,
    pub error_code: i16,
    pub high_watermark: i64,
    pub last_stable_offset: i64,
    pub log_start_offset: i64,
    pub aborted_transactions: Vec<AbortedTransaction>,
    pub preferred_read_replica: i32,
    pub records: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponseTopic {
    pub topic_id: Uuid,
    pub partitions: Vec<FetchResponsePartition>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub throttle_time_ms: i32,
    pub error_code: i16,
    pub session_id: i32,
    pub responses: Vec<FetchResponseTopic>,
}

impl Encode for FetchResponsePartition {
    fn encode(&self, dst: &mut BytesMut) {
        dst.put_i32(self.partition_index);
        dst.put_i16(self.error_code);
        dst.put_i64(self.high_watermark);
        dst.put_i64(self.last_stable_offset);
        dst.put_i64(self.log_start_offset);
        put_compact_array(dst, &self.aborted_transactions, |dst, txn| {
            dst.put_i64(txn.producer_id);
            dst.put_i64(txn.first_offset);
            put_empty_tagged_fields(dst);
        });
        dst.put_i32(self.preferred_read_replica);
        put_compact_bytes(dst, &self.records);
        put_empty_tagged_fields(dst);
    }
}

impl Decode for FetchResponsePartition {
    fn decode(src: &mut Bytes) -> DecodeResult<Self> {
        let partition = Self {
            partition_index: read_i32(src)?,
            error_code: read_i16(src)?,
            high_watermark: read_i64(src)?,
            last_stable_offset: read_i64(src)?,
            log_start_offset: read_i64(src)?,
            aborted_transactions: read_compact_array(src, |src| {
                let txn = AbortedTransaction {
                    producer_id: read_i64(src)?,
                    first_offset: read_i64(src)?,
                };
                skip_tagged_fields(src)?;
                Ok(txn)
            })?
            .unwrap_or_default(),
            preferred_read_replica: read_i32(src)?,
            records: read_compact_bytes(src)?.unwrap_or_default(),
        };
        skip_tagged_fields(src)?;
        Ok(partition)
    }
}

impl Encode for FetchResponse {
    fn encode(&self, dst: &mut BytesMut) {
        dst.put_i32(self.throttle_time_ms);
        dst.put_i16(self.error_code);
        dst.put_i32(self.session_id);
        put_compact_array(dst, &self.responses, |dst, topic| {
            put_uuid(dst, &topic.topic_id);
            put_compact_array(dst, &topic.partitions, |dst, p| p.encode(dst));
            put_empty_tagged_fields(dst);
        });
        put_empty_tagged_fields(dst);
    }
}

impl Decode for FetchResponse {
    fn decode(src: &mut Bytes) -> DecodeResult<Self> {
        let throttle_time_ms = read_i32(src)?;
        let error_code = read_i16(src)?;
        let session_id = read_i32(src)?;
        let responses = read_compact_array(src, |src| {
            let topic_id = read_uuid(src)?;
            let partitions =
                read_compact_array(src, FetchResponsePartition::decode)?.unwrap_or_default();
            skip_tagged_fields(src)?;
            Ok(FetchResponseTopic {
                topic_id,
                partitions,
            })
        })?
        .unwrap_or_default();
        skip_tagged_fields(src)?;
        Ok(Self {
            throttle_time_ms,
            error_code,
            session_id,
            responses,
        })
    }
}

pub struct FetchHandler;

impl ApiHandler for FetchHandler {
    type Request = FetchRequest;
    type Response = FetchResponse;

    const API_KEY: i16 = API_FETCH;
    const NAME: &'static str = "Fetch";

    fn handle(
        &self,
        _broker: &Broker,
        _header: &RequestHeader,
        request: FetchRequest,
    ) -> FetchResponse {
        debug!(
            topics = request.topics.len(),
            session_id = request.session_id,
            "fetch answered with fixed sample partition"
        );
        FetchResponse {
            throttle_time_ms: 0,
            error_code: error_code::NONE,
            session_id: request.session_id,
            responses: vec![FetchResponseTopic {
                topic_id: Uuid::nil(),
                partitions: vec![FetchResponsePartition {
                    partition_index: 0,
                    error_code: error_code::NONE,
                    high_watermark: 100,
                    last_stable_offset: 90,
                    log_start_offset: 0,
                    aborted_transactions: vec![AbortedTransaction {
                        producer_id: 123,
                        first_offset: 10,
                    }],
                    preferred_read_replica: 1,
                    records: Bytes::from_static(&[0x01, 0x02, 0x03]),
                }],
            }],
        }
    }
}
