//! Record-batch envelope and the varint-framed records inside it.

use super::record::RecordValue;
use crate::error::{DecodeError, DecodeResult};
use crate::protocol::codec::{
    put_uvarint, put_varint, read_bytes, read_i8, read_u16, read_u32, read_u64, read_u8,
    read_uvarint, read_varint, Decode, Encode, MAX_PREALLOC_ELEMENTS,
};
use bytes::{BufMut, Bytes, BytesMut};
use serde::Serialize;

/// Fixed header size: everything up to and including `record_count`.
pub const BATCH_HEADER_LEN: usize = 61;

/// Bytes in front of the region that `batch_length` counts
/// (`base_offset` and `batch_length` itself).
const BATCH_LENGTH_OFFSET: usize = 12;

/// length, attributes, timestampDelta, offsetDelta, keyLength, valueLength
/// and headerCount, one byte each at minimum.
const MIN_RECORD_LEN: usize = 7;

/// One record inside a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataRecord {
    /// Encoded size of everything after the length varint.
    pub length: i64,
    pub attributes: i8,
    pub timestamp_delta: i64,
    pub offset_delta: i64,
    pub key: Option<Bytes>,
    pub value: RecordValue,
    pub header_count: u64,
}

impl MetadataRecord {
    pub fn new(offset_delta: i64, value: RecordValue) -> Self {
        Self {
            length: 0,
            attributes: 0,
            timestamp_delta: 0,
            offset_delta,
            key: None,
            value,
            header_count: 0,
        }
    }

    fn encode_body(&self, dst: &mut BytesMut) {
        dst.put_i8(self.attributes);
        put_varint(dst, self.timestamp_delta);
        put_varint(dst, self.offset_delta);
        match &self.key {
            Some(key) if !key.is_empty() => {
                put_varint(dst, key.len() as i64);
                dst.put_slice(key);
            }
            _ => put_varint(dst, -1),
        }
        let value = self.value.to_bytes();
        put_varint(dst, value.len() as i64);
        dst.put_slice(&value);
        put_uvarint(dst, self.header_count);
    }
}

fn read_len(src: &mut Bytes) -> DecodeResult<usize> {
    let len = read_varint(src)?;
    usize::try_from(len).map_err(|_| DecodeError::InvalidLength(len))
}

impl Decode for MetadataRecord {
    fn decode(src: &mut Bytes) -> DecodeResult<Self> {
        let length = read_varint(src)?;
        let attributes = read_i8(src)?;
        let timestamp_delta = read_varint(src)?;
        let offset_delta = read_varint(src)?;
        let key_len = read_varint(src)?;
        let key = if key_len > 0 {
            Some(read_bytes(src, key_len as usize)?)
        } else {
            None
        };
        // The value region is sliced out first so an unrecognised body cannot
        // shift the rest of the batch.
        let value_len = read_len(src)?;
        let mut value_region = read_bytes(src, value_len)?;
        let value = RecordValue::decode(&mut value_region)?;
        let header_count = read_uvarint(src)?;
        Ok(Self {
            length,
            attributes,
            timestamp_delta,
            offset_delta,
            key,
            value,
            header_count,
        })
    }
}

impl Encode for MetadataRecord {
    /// Writes the length varint from the encoded body; `self.length` is ignored.
    fn encode(&self, dst: &mut BytesMut) {
        let mut body = BytesMut::new();
        self.encode_body(&mut body);
        put_varint(dst, body.len() as i64);
        dst.put_slice(&body);
    }
}

/// A `ClusterMetadata` batch: the 61-byte header and its decoded records.
///
/// The CRC is carried through untouched and never verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordBatch {
    pub base_offset: u64,
    pub batch_length: u32,
    pub partition_leader_epoch: u32,
    pub magic: u8,
    pub crc: u32,
    pub attributes: u16,
    pub last_offset_delta: u32,
    pub base_timestamp: u64,
    pub max_timestamp: u64,
    pub producer_id: u64,
    pub producer_epoch: u16,
    pub base_sequence: u32,
    pub records: Vec<MetadataRecord>,
}

impl RecordBatch {
    /// A magic-2 batch holding `records`, with the control fields a
    /// controller writes for metadata batches.
    pub fn new(base_offset: u64, records: Vec<MetadataRecord>) -> Self {
        let last_offset_delta = records.len().saturating_sub(1) as u32;
        Self {
            base_offset,
            batch_length: 0,
            partition_leader_epoch: 1,
            magic: 2,
            crc: 0,
            attributes: 0,
            last_offset_delta,
            base_timestamp: 0,
            max_timestamp: 0,
            producer_id: u64::MAX,
            producer_epoch: u16::MAX,
            base_sequence: u32::MAX,
            records,
        }
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn values(&self) -> impl Iterator<Item = &RecordValue> {
        self.records.iter().map(|r| &r.value)
    }
}

impl Decode for RecordBatch {
    fn decode(src: &mut Bytes) -> DecodeResult<Self> {
        let base_offset = read_u64(src)?;
        let batch_length = read_u32(src)?;
        let partition_leader_epoch = read_u32(src)?;
        let magic = read_u8(src)?;
        let crc = read_u32(src)?;
        let attributes = read_u16(src)?;
        let last_offset_delta = read_u32(src)?;
        let base_timestamp = read_u64(src)?;
        let max_timestamp = read_u64(src)?;
        let producer_id = read_u64(src)?;
        let producer_epoch = read_u16(src)?;
        let base_sequence = read_u32(src)?;
        let record_count = read_u32(src)?;

        // The count is untrusted; a record envelope is at least
        // MIN_RECORD_LEN bytes.
        let capacity = (record_count as usize)
            .min(src.len() / MIN_RECORD_LEN)
            .min(MAX_PREALLOC_ELEMENTS);
        let mut records = Vec::with_capacity(capacity);
        for _ in 0..record_count {
            records.push(MetadataRecord::decode(src)?);
        }
        Ok(Self {
            base_offset,
            batch_length,
            partition_leader_epoch,
            magic,
            crc,
            attributes,
            last_offset_delta,
            base_timestamp,
            max_timestamp,
            producer_id,
            producer_epoch,
            base_sequence,
            records,
        })
    }
}

impl Encode for RecordBatch {
    /// `batch_length` is recomputed from the encoded records; the CRC is
    /// written as stored.
    fn encode(&self, dst: &mut BytesMut) {
        let start = dst.len();
        dst.put_u64(self.base_offset);
        dst.put_u32(0);
        dst.put_u32(self.partition_leader_epoch);
        dst.put_u8(self.magic);
        dst.put_u32(self.crc);
        dst.put_u16(self.attributes);
        dst.put_u32(self.last_offset_delta);
        dst.put_u64(self.base_timestamp);
        dst.put_u64(self.max_timestamp);
        dst.put_u64(self.producer_id);
        dst.put_u16(self.producer_epoch);
        dst.put_u32(self.base_sequence);
        dst.put_u32(self.records.len() as u32);
        for record in &self.records {
            record.encode(dst);
        }
        let batch_length = (dst.len() - start - BATCH_LENGTH_OFFSET) as u32;
        dst[start + 8..start + BATCH_LENGTH_OFFSET].copy_from_slice(&batch_length.to_be_bytes());
    }
}
