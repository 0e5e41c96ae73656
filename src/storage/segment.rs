//! One on-disk metadata log segment.

use super::batch::RecordBatch;
use crate::error::{KraftwireError, Result};
use crate::protocol::codec::Decode;
use bytes::{Buf, Bytes};
use std::path::{Path, PathBuf};

/// Default location of the single `__cluster_metadata` segment in a
/// combined-mode KRaft data directory.
pub const DEFAULT_METADATA_LOG_PATH: &str =
    "/tmp/kraft-combined-logs/__cluster_metadata-0/00000000000000000000.log";

/// Read-only handle to a metadata log segment. The file is read in full on
/// every call; nothing is cached between reads.
#[derive(Debug, Clone)]
pub struct MetadataSegment {
    path: PathBuf,
}

impl MetadataSegment {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decode every batch in the segment, in file order.
    ///
    /// Any failure (missing file, truncated batch, bad varint) yields an
    /// error and no batches.
    pub fn read_batches(&self) -> Result<Vec<RecordBatch>> {
        let raw = std::fs::read(&self.path)
            .map_err(|e| KraftwireError::metadata_log(&self.path, e.into()))?;
        decode_batches(Bytes::from(raw))
            .map_err(|e| KraftwireError::metadata_log(&self.path, e))
    }
}

/// Decode consecutive batches until `src` is exhausted.
pub fn decode_batches(mut src: Bytes) -> Result<Vec<RecordBatch>> {
    let mut batches = Vec::new();
    while src.has_remaining() {
        batches.push(RecordBatch::decode(&mut src)?);
    }
    Ok(batches)
}
