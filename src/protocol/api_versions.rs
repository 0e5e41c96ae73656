//! ApiVersions (key 18).

use super::codec::{
    put_compact_array, put_compact_nullable_string, put_empty_tagged_fields, read_compact_array,
    read_compact_string, read_i16, read_i32, skip_tagged_fields, Decode, Encode,
};
use super::frame::RequestHeader;
use super::registry::{version_error_code, ApiHandler, SUPPORTED_VERSIONS};
use super::{API_DESCRIBE_TOPIC_PARTITIONS, API_VERSIONS};
use crate::broker::Broker;
use crate::error::DecodeResult;
use bytes::{BufMut, Bytes, BytesMut};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiVersionsRequest {
    pub client_software_name: Option<String>,
    pub client_software_version: Option<String>,
}

impl Decode for ApiVersionsRequest {
    fn decode(src: &mut Bytes) -> DecodeResult<Self> {
        let client_software_name = read_compact_string(src)?;
        let client_software_version = read_compact_string(src)?;
        skip_tagged_fields(src)?;
        Ok(Self {
            client_software_name,
            client_software_version,
        })
    }
}

impl Encode for ApiVersionsRequest {
    fn encode(&self, dst: &mut BytesMut) {
        put_compact_nullable_string(dst, self.client_software_name.as_deref());
        put_compact_nullable_string(dst, self.client_software_version.as_deref());
        put_empty_tagged_fields(dst);
    }
}

/// One advertised `{api_key, min_version, max_version}` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiVersion {
    pub api_key: i16,
    pub min_version: i16,
    pub max_version: i16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiVersionsResponse {
    pub error_code: i16,
    pub api_keys: Vec<ApiVersion>,
    pub throttle_time_ms: i32,
}

impl Encode for ApiVersionsResponse {
    fn encode(&self, dst: &mut BytesMut) {
        dst.put_i16(self.error_code);
        put_compact_array(dst, &self.api_keys, |dst, entry| {
            dst.put_i16(entry.api_key);
            dst.put_i16(entry.min_version);
            dst.put_i16(entry.max_version);
            put_empty_tagged_fields(dst);
        });
        dst.put_i32(self.throttle_time_ms);
        put_empty_tagged_fields(dst);
    }
}

impl Decode for ApiVersionsResponse {
    fn decode(src: &mut Bytes) -> DecodeResult<Self> {
        let error_code = read_i16(src)?;
        let api_keys = read_compact_array(src, |src| {
            let entry = ApiVersion {
                api_key: read_i16(src)?,
                min_version: read_i16(src)?,
                max_version: read_i16(src)?,
            };
            skip_tagged_fields(src)?;
            Ok(entry)
        })?
        .unwrap_or_default();
        let throttle_time_ms = read_i32(src)?;
        skip_tagged_fields(src)?;
        Ok(Self {
            error_code,
            api_keys,
            throttle_time_ms,
        })
    }
}

/// Static capability advertisement. The entries are fixed and not read back
/// from the dispatch table.
pub struct ApiVersionsHandler;

impl ApiHandler for ApiVersionsHandler {
    type Request = ApiVersionsRequest;
    type Response = ApiVersionsResponse;

    const API_KEY: i16 = API_VERSIONS;
    const NAME: &'static str = "ApiVersions";

    fn handle(
        &self,
        _broker: &Broker,
        header: &RequestHeader,
        _request: ApiVersionsRequest,
    ) -> ApiVersionsResponse {
        ApiVersionsResponse {
            error_code: version_error_code(header.api_version),
            api_keys: vec![
                ApiVersion {
                    api_key: header.api_key,
                    min_version: *SUPPORTED_VERSIONS.start(),
                    max_version: *SUPPORTED_VERSIONS.end(),
                },
                ApiVersion {
                    api_key: API_DESCRIBE_TOPIC_PARTITIONS,
                    min_version: 0,
                    max_version: 0,
                },
            ],
            throttle_time_ms: 0,
        }
    }
}
