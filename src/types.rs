//! Cluster state shared by the metadata projection and the request handlers.

use crate::storage::PartitionRecord;
use serde::Serialize;
use uuid::Uuid;

/// A topic as known from the metadata log, with its partitions in log order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicState {
    pub name: String,
    pub topic_id: Uuid,
    pub partitions: Vec<PartitionState>,
}

impl TopicState {
    pub fn new(name: impl Into<String>, topic_id: Uuid) -> Self {
        Self {
            name: name.into(),
            topic_id,
            partitions: Vec::new(),
        }
    }
}

/// Leadership and replica placement of one partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionState {
    pub partition_index: i32,
    pub leader_id: i32,
    pub leader_epoch: i32,
    pub partition_epoch: u32,
    pub replicas: Vec<i32>,
    pub isr: Vec<i32>,
}

impl From<&PartitionRecord> for PartitionState {
    fn from(record: &PartitionRecord) -> Self {
        Self {
            partition_index: record.partition_id,
            leader_id: record.leader,
            leader_epoch: record.leader_epoch,
            partition_epoch: record.partition_epoch,
            replicas: record.replicas.clone(),
            isr: record.isr.clone(),
        }
    }
}
