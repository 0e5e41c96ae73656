//! Metadata record values: the typed payload inside each log record.
//!
//! Value layout: `frame_version u8 | record_type u8 | version u8 | body`.

use crate::error::DecodeResult;
use crate::protocol::codec::{
    put_compact_array, put_compact_string, put_empty_tagged_fields, put_uuid, read_compact_array,
    read_compact_string, read_i32, read_u16, read_u32, read_u8, read_uuid, skip_tagged_fields,
    Decode, Encode,
};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::Serialize;
use uuid::Uuid;

pub const TOPIC_RECORD: u8 = 2;
pub const PARTITION_RECORD: u8 = 3;
pub const FEATURE_LEVEL_RECORD: u8 = 12;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicRecord {
    pub name: String,
    pub topic_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionRecord {
    pub partition_id: i32,
    pub topic_id: Uuid,
    pub replicas: Vec<i32>,
    pub isr: Vec<i32>,
    pub removing_replicas: Vec<i32>,
    pub adding_replicas: Vec<i32>,
    pub leader: i32,
    pub leader_epoch: i32,
    pub partition_epoch: u32,
    pub directories: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureLevelRecord {
    pub name: String,
    pub feature_level: u16,
}

/// Body of a record value, discriminated on `record_type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetadataBody {
    Topic(TopicRecord),
    Partition(PartitionRecord),
    FeatureLevel(FeatureLevelRecord),
    /// Any other record type; the bytes after the common prefix, undecoded.
    Unknown { payload: Bytes },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordValue {
    pub frame_version: u8,
    pub record_type: u8,
    pub version: u8,
    pub body: MetadataBody,
}

impl RecordValue {
    pub fn new(body: MetadataBody) -> Self {
        let record_type = match &body {
            MetadataBody::Topic(_) => TOPIC_RECORD,
            MetadataBody::Partition(_) => PARTITION_RECORD,
            MetadataBody::FeatureLevel(_) => FEATURE_LEVEL_RECORD,
            MetadataBody::Unknown { .. } => u8::MAX,
        };
        Self {
            frame_version: 1,
            record_type,
            version: 0,
            body,
        }
    }
}

fn read_i32_array(src: &mut Bytes) -> DecodeResult<Vec<i32>> {
    Ok(read_compact_array(src, read_i32)?.unwrap_or_default())
}

fn put_i32_array(dst: &mut BytesMut, values: &[i32]) {
    put_compact_array(dst, values, |dst, v| dst.put_i32(*v));
}

fn decode_topic(src: &mut Bytes) -> DecodeResult<TopicRecord> {
    let name = read_compact_string(src)?.unwrap_or_default();
    let topic_id = read_uuid(src)?;
    skip_tagged_fields(src)?;
    Ok(TopicRecord { name, topic_id })
}

fn decode_partition(src: &mut Bytes) -> DecodeResult<PartitionRecord> {
    let record = PartitionRecord {
        partition_id: read_i32(src)?,
        topic_id: read_uuid(src)?,
        replicas: read_i32_array(src)?,
        isr: read_i32_array(src)?,
        removing_replicas: read_i32_array(src)?,
        adding_replicas: read_i32_array(src)?,
        leader: read_i32(src)?,
        leader_epoch: read_i32(src)?,
        partition_epoch: read_u32(src)?,
        directories: read_compact_array(src, read_uuid)?.unwrap_or_default(),
    };
    skip_tagged_fields(src)?;
    Ok(record)
}

fn decode_feature_level(src: &mut Bytes) -> DecodeResult<FeatureLevelRecord> {
    let name = read_compact_string(src)?.unwrap_or_default();
    let feature_level = read_u16(src)?;
    skip_tagged_fields(src)?;
    Ok(FeatureLevelRecord {
        name,
        feature_level,
    })
}

impl Decode for RecordValue {
    /// `src` must be exactly the value region; bytes left after a known body
    /// are ignored.
    fn decode(src: &mut Bytes) -> DecodeResult<Self> {
        let frame_version = read_u8(src)?;
        let record_type = read_u8(src)?;
        let version = read_u8(src)?;
        let body = match record_type {
            TOPIC_RECORD => MetadataBody::Topic(decode_topic(src)?),
            PARTITION_RECORD => MetadataBody::Partition(decode_partition(src)?),
            FEATURE_LEVEL_RECORD => MetadataBody::FeatureLevel(decode_feature_level(src)?),
            _ => MetadataBody::Unknown {
                payload: src.copy_to_bytes(src.remaining()),
            },
        };
        Ok(Self {
            frame_version,
            record_type,
            version,
            body,
        })
    }
}

impl Encode for RecordValue {
    fn encode(&self, dst: &mut BytesMut) {
        dst.put_u8(self.frame_version);
        dst.put_u8(self.record_type);
        dst.put_u8(self.version);
        match &self.body {
            MetadataBody::Topic(topic) => {
                put_compact_string(dst, &topic.name);
                put_uuid(dst, &topic.topic_id);
                put_empty_tagged_fields(dst);
            }
            MetadataBody::Partition(p) => {
                dst.put_i32(p.partition_id);
                put_uuid(dst, &p.topic_id);
                put_i32_array(dst, &p.replicas);
                put_i32_array(dst, &p.isr);
                put_i32_array(dst, &p.removing_replicas);
                put_i32_array(dst, &p.adding_replicas);
                dst.put_i32(p.leader);
                dst.put_i32(p.leader_epoch);
                dst.put_u32(p.partition_epoch);
                put_compact_array(dst, &p.directories, |dst, dir| put_uuid(dst, dir));
                put_empty_tagged_fields(dst);
            }
            MetadataBody::FeatureLevel(feature) => {
                put_compact_string(dst, &feature.name);
                dst.put_u16(feature.feature_level);
                put_empty_tagged_fields(dst);
            }
            MetadataBody::Unknown { payload } => dst.put_slice(payload),
        }
    }
}
