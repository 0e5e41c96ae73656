//! Frame layer: length-prefixed frames, request headers, response framing.
//!
//! ```text
//! Request:  int32 length | int16 api_key | int16 api_version | int32 correlation_id
//!           | nullable_string client_id | tagged_fields | body
//! Response: int32 length | int32 correlation_id | tagged_fields | body
//! ```

use super::codec::{
    put_empty_tagged_fields, put_nullable_string, read_i16, read_i32, read_nullable_string,
    skip_tagged_fields, Decode, Encode,
};
use crate::error::{DecodeResult, KraftwireError, Result};
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Largest frame accepted from a peer.
pub const MAX_FRAME_LEN: usize = 100 * 1024 * 1024;

const LENGTH_PREFIX_BYTES: usize = 4;

/// Request header shared by every API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHeader {
    pub api_key: i16,
    pub api_version: i16,
    /// Echoed verbatim in the response.
    pub correlation_id: i32,
    pub client_id: Option<String>,
}

impl Decode for RequestHeader {
    fn decode(src: &mut Bytes) -> DecodeResult<Self> {
        let api_key = read_i16(src)?;
        let api_version = read_i16(src)?;
        let correlation_id = read_i32(src)?;
        let client_id = read_nullable_string(src)?;
        skip_tagged_fields(src)?;
        Ok(Self {
            api_key,
            api_version,
            correlation_id,
            client_id,
        })
    }
}

impl Encode for RequestHeader {
    fn encode(&self, dst: &mut BytesMut) {
        dst.put_i16(self.api_key);
        dst.put_i16(self.api_version);
        dst.put_i32(self.correlation_id);
        put_nullable_string(dst, self.client_id.as_deref());
        put_empty_tagged_fields(dst);
    }
}

/// A request whose header has been decoded; `body` is the API-specific rest.
#[derive(Debug, Clone)]
pub struct DecodedRequest {
    pub header: RequestHeader,
    pub body: Bytes,
}

/// Split one complete frame payload (without its length prefix) off `src`.
///
/// Returns `None` while the buffer holds less than a full frame.
pub fn decode_frame(src: &mut BytesMut) -> Result<Option<Bytes>> {
    if src.len() < LENGTH_PREFIX_BYTES {
        return Ok(None);
    }
    let len = u32::from_be_bytes([src[0], src[1], src[2], src[3]]) as usize;
    if len > MAX_FRAME_LEN {
        return Err(KraftwireError::FrameTooLarge(len));
    }
    if src.len() < LENGTH_PREFIX_BYTES + len {
        return Ok(None);
    }
    src.advance(LENGTH_PREFIX_BYTES);
    Ok(Some(src.split_to(len).freeze()))
}

/// Called when the peer closes: leftover bytes mean it stopped mid-frame.
pub fn ensure_frame_boundary(src: &BytesMut) -> Result<()> {
    if src.is_empty() {
        return Ok(());
    }
    let expected = if src.len() < LENGTH_PREFIX_BYTES {
        LENGTH_PREFIX_BYTES
    } else {
        LENGTH_PREFIX_BYTES + u32::from_be_bytes([src[0], src[1], src[2], src[3]]) as usize
    };
    Err(KraftwireError::ShortFrame {
        expected,
        available: src.len(),
    })
}

/// Decode the request header from a frame payload.
pub fn decode_request(mut payload: Bytes) -> Result<DecodedRequest> {
    let header = RequestHeader::decode(&mut payload)?;
    Ok(DecodedRequest {
        header,
        body: payload,
    })
}

/// Frame a response body. The length prefix is computed from the bytes
/// actually written, never taken from the request.
pub fn frame_response(correlation_id: i32, body: &[u8]) -> BytesMut {
    let mut message = BytesMut::with_capacity(5 + body.len());
    message.put_i32(correlation_id);
    put_empty_tagged_fields(&mut message);
    message.put_slice(body);

    let mut out = BytesMut::with_capacity(LENGTH_PREFIX_BYTES + message.len());
    out.put_u32(message.len() as u32);
    out.extend_from_slice(&message);
    out
}

/// Client-side counterpart of [`decode_request`]: header plus body under a
/// length prefix.
pub fn frame_request<R: Encode>(header: &RequestHeader, body: &R) -> BytesMut {
    let mut message = BytesMut::new();
    header.encode(&mut message);
    body.encode(&mut message);

    let mut out = BytesMut::with_capacity(LENGTH_PREFIX_BYTES + message.len());
    out.put_u32(message.len() as u32);
    out.extend_from_slice(&message);
    out
}

/// Strip the response header from a frame payload, returning the correlation id.
pub fn decode_response_header(payload: &mut Bytes) -> DecodeResult<i32> {
    let correlation_id = read_i32(payload)?;
    skip_tagged_fields(payload)?;
    Ok(correlation_id)
}
