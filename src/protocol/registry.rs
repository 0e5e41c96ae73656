//! API key → handler table.
//!
//! Each API contributes a `{parse, handle, encode}` triple through
//! [`ApiHandler`]; the registry erases the request/response types so the
//! dispatcher never switches on concrete message types.

use super::codec::{Decode, Encode};
use super::frame::RequestHeader;
use super::{error_code, ApiVersionsHandler, DescribePartitionsHandler, FetchHandler};
use crate::broker::{Broker, BrokerConfig};
use crate::error::{KraftwireError, Result};
use bytes::{Bytes, BytesMut};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

/// Versions every registered API answers with error code 0.
pub const SUPPORTED_VERSIONS: RangeInclusive<i16> = 0..=4;

/// `NONE` for versions 0..=4, `UNSUPPORTED_VERSION` otherwise.
///
/// Parsing does not change with the version; every API uses one layout.
pub fn version_error_code(api_version: i16) -> i16 {
    if SUPPORTED_VERSIONS.contains(&api_version) {
        error_code::NONE
    } else {
        error_code::UNSUPPORTED_VERSION
    }
}

/// One Kafka API: how to parse its request, answer it, and encode the answer.
pub trait ApiHandler: Send + Sync + 'static {
    type Request: Decode;
    type Response: Encode;

    const API_KEY: i16;
    const NAME: &'static str;

    fn handle(
        &self,
        broker: &Broker,
        header: &RequestHeader,
        request: Self::Request,
    ) -> Self::Response;
}

trait ErasedHandler: Send + Sync {
    fn name(&self) -> &'static str;

    fn call(&self, broker: &Broker, header: &RequestHeader, body: &mut Bytes) -> Result<BytesMut>;
}

impl<H: ApiHandler> ErasedHandler for H {
    fn name(&self) -> &'static str {
        H::NAME
    }

    fn call(&self, broker: &Broker, header: &RequestHeader, body: &mut Bytes) -> Result<BytesMut> {
        let request = H::Request::decode(body)?;
        let response = self.handle(broker, header, request);
        let mut dst = BytesMut::new();
        response.encode(&mut dst);
        Ok(dst)
    }
}

/// Dispatch table keyed by API key.
#[derive(Default)]
pub struct ApiRegistry {
    handlers: BTreeMap<i16, Box<dyn ErasedHandler>>,
}

impl ApiRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// ApiVersions and DescribeTopicPartitions, plus Fetch when enabled.
    pub fn for_config(config: &BrokerConfig) -> Self {
        let mut registry = Self::new();
        registry
            .register(ApiVersionsHandler)
            .register(DescribePartitionsHandler);
        if config.enable_fetch {
            registry.register(FetchHandler);
        }
        registry
    }

    /// Add (or replace) the handler for `H::API_KEY`.
    pub fn register<H: ApiHandler>(&mut self, handler: H) -> &mut Self {
        self.handlers.insert(H::API_KEY, Box::new(handler));
        self
    }

    pub fn supports(&self, api_key: i16) -> bool {
        self.handlers.contains_key(&api_key)
    }

    /// Registered API keys in ascending order.
    pub fn api_keys(&self) -> Vec<i16> {
        self.handlers.keys().copied().collect()
    }

    pub fn name_of(&self, api_key: i16) -> Option<&'static str> {
        self.handlers.get(&api_key).map(|h| h.name())
    }

    /// Run the handler for `header.api_key` and return the encoded response body.
    ///
    /// An unknown key has no response shape; the caller closes the connection.
    pub fn dispatch(
        &self,
        broker: &Broker,
        header: &RequestHeader,
        mut body: Bytes,
    ) -> Result<BytesMut> {
        let handler = self
            .handlers
            .get(&header.api_key)
            .ok_or(KraftwireError::UnsupportedApiKey(header.api_key))?;
        handler.call(broker, header, &mut body)
    }
}

impl std::fmt::Debug for ApiRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.handlers.iter().map(|(key, h)| (key, h.name())))
            .finish()
    }
}
