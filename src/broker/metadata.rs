//! Outcome of reading the metadata log for one request.

use crate::cluster::ClusterView;
use crate::error::KraftwireError;
use crate::types::TopicState;

/// Either a projected cluster view or the reason the log could not be read.
///
/// A failed read is answered exactly like an empty log: every requested
/// topic is unknown. The failure is never sent to the peer.
#[derive(Debug)]
pub enum MetadataLoad {
    Topics(ClusterView),
    PartialFailure { reason: KraftwireError },
}

impl MetadataLoad {
    pub fn view(&self) -> Option<&ClusterView> {
        match self {
            Self::Topics(view) => Some(view),
            Self::PartialFailure { .. } => None,
        }
    }

    pub fn topic_by_name(&self, name: &str) -> Option<&TopicState> {
        self.view().and_then(|view| view.topic_by_name(name))
    }

    pub fn topics(&self) -> &[TopicState] {
        self.view().map(ClusterView::topics).unwrap_or_default()
    }

    pub fn failure(&self) -> Option<&KraftwireError> {
        match self {
            Self::Topics(_) => None,
            Self::PartialFailure { reason } => Some(reason),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.failure().is_some()
    }
}
