//! KRaft metadata log: segment reader, batch envelope and typed records.

mod batch;
mod record;
mod segment;

pub use batch::{MetadataRecord, RecordBatch, BATCH_HEADER_LEN};
pub use record::{
    FeatureLevelRecord, MetadataBody, PartitionRecord, RecordValue, TopicRecord,
    FEATURE_LEVEL_RECORD, PARTITION_RECORD, TOPIC_RECORD,
};
pub use segment::{decode_batches, MetadataSegment, DEFAULT_METADATA_LOG_PATH};
