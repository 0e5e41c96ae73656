//! Kafka binary wire protocol: primitives, framing, and the supported APIs.
//!
//! Tagged fields are a known subset: only the count is consumed on read and
//! a single zero byte is written. Every API uses one fixed body layout
//! regardless of the negotiated version.

mod api_versions;
pub mod codec;
mod describe_partitions;
mod fetch;
pub mod frame;
pub mod registry;

pub use api_versions::{ApiVersion, ApiVersionsHandler, ApiVersionsRequest, ApiVersionsResponse};
pub use codec::{Decode, Encode};
pub use describe_partitions::{
    Cursor, DescribePartitionsHandler, DescribePartitionsRequest, DescribePartitionsResponse,
    DescribedPartition, DescribedTopic, TOPIC_AUTHORIZED_OPERATIONS,
};
pub use fetch::{
    AbortedTransaction, FetchHandler, FetchPartition, FetchRequest, FetchResponse,
    FetchResponsePartition, FetchResponseTopic, FetchTopic, ForgottenTopic,
};
pub use frame::{
    decode_frame, decode_request, decode_response_header, ensure_frame_boundary, frame_request,
    frame_response, DecodedRequest, RequestHeader, MAX_FRAME_LEN,
};
pub use registry::{version_error_code, ApiHandler, ApiRegistry, SUPPORTED_VERSIONS};

pub const API_FETCH: i16 = 1;
pub const API_VERSIONS: i16 = 18;
pub const API_DESCRIBE_TOPIC_PARTITIONS: i16 = 75;

/// Kafka error codes used in responses.
pub mod error_code {
    pub const NONE: i16 = 0;
    pub const UNKNOWN_TOPIC_OR_PARTITION: i16 = 3;
    pub const UNSUPPORTED_VERSION: i16 = 35;
}
