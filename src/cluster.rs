//! Cluster view projected from the metadata log.
//!
//! Records are folded in log order. A topic record registers the topic; a
//! partition record attaches to the topic with the same id, or is set aside
//! as orphaned when that topic has not been seen yet.

use crate::storage::{MetadataBody, PartitionRecord, RecordBatch, RecordValue};
use crate::types::{PartitionState, TopicState};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

#[derive(Debug, Clone, Default, Serialize)]
pub struct ClusterView {
    /// Topics in the order their records first appeared.
    topics: Vec<TopicState>,
    #[serde(skip)]
    index: HashMap<Uuid, usize>,
    /// Feature name to finalized level; the last record for a name wins.
    features: BTreeMap<String, u16>,
    /// Partition records whose topic id had no preceding topic record.
    orphaned_partitions: Vec<PartitionRecord>,
}

impl ClusterView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_batches(batches: &[RecordBatch]) -> Self {
        let mut view = Self::new();
        for value in batches.iter().flat_map(RecordBatch::values) {
            view.apply(value);
        }
        view
    }

    /// Fold one record into the view. Unknown record types are ignored.
    pub fn apply(&mut self, value: &RecordValue) {
        match &value.body {
            MetadataBody::Topic(topic) => {
                if let Some(&idx) = self.index.get(&topic.topic_id) {
                    // Re-registration keeps already attached partitions.
                    self.topics[idx].name = topic.name.clone();
                } else {
                    self.index.insert(topic.topic_id, self.topics.len());
                    self.topics
                        .push(TopicState::new(topic.name.clone(), topic.topic_id));
                }
            }
            MetadataBody::Partition(partition) => match self.index.get(&partition.topic_id) {
                Some(&idx) => self.topics[idx]
                    .partitions
                    .push(PartitionState::from(partition)),
                None => self.orphaned_partitions.push(partition.clone()),
            },
            MetadataBody::FeatureLevel(feature) => {
                self.features
                    .insert(feature.name.clone(), feature.feature_level);
            }
            MetadataBody::Unknown { .. } => {}
        }
    }

    pub fn topics(&self) -> &[TopicState] {
        &self.topics
    }

    /// First topic carrying `name`.
    pub fn topic_by_name(&self, name: &str) -> Option<&TopicState> {
        self.topics.iter().find(|t| t.name == name)
    }

    pub fn topic_by_id(&self, topic_id: &Uuid) -> Option<&TopicState> {
        self.index.get(topic_id).map(|&idx| &self.topics[idx])
    }

    pub fn feature_level(&self, name: &str) -> Option<u16> {
        self.features.get(name).copied()
    }

    pub fn features(&self) -> &BTreeMap<String, u16> {
        &self.features
    }

    pub fn orphaned_partitions(&self) -> &[PartitionRecord] {
        &self.orphaned_partitions
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}
