//! Wire-level tests: primitives, framing, and the ApiVersions / Fetch paths
//! through the broker's dispatcher.

use bytes::{BufMut, Bytes, BytesMut};
use kraftwire::broker::parse_flag;
use kraftwire::error::{DecodeError, ErrorClass, KraftwireError};
use kraftwire::protocol::codec::{
    put_compact_array, put_compact_nullable_string, put_nullable_string, put_uvarint, put_varint,
    read_compact_array, read_compact_string, read_i32, read_nullable_string, read_u8,
    read_uvarint, read_varint,
};
use kraftwire::protocol::{
    decode_frame, decode_response_header, ensure_frame_boundary, frame_request, ApiVersion,
    ApiVersionsRequest, ApiVersionsResponse, Decode, Encode, FetchPartition, FetchRequest,
    FetchResponse, FetchTopic, RequestHeader, MAX_FRAME_LEN,
};
use kraftwire::{Broker, BrokerConfig};
use uuid::Uuid;

fn header(api_key: i16, api_version: i16, correlation_id: i32) -> RequestHeader {
    RequestHeader {
        api_key,
        api_version,
        correlation_id,
        client_id: Some("kraftwire-test".to_string()),
    }
}

/// Frame `body` as a request, push it through the broker, and return the
/// correlation id plus the response body.
fn round_trip<R: Encode>(
    broker: &Broker,
    header: &RequestHeader,
    body: &R,
) -> kraftwire::Result<(i32, Bytes)> {
    let mut wire = frame_request(header, body);
    let payload = decode_frame(&mut wire)?.unwrap();
    assert!(wire.is_empty());

    let mut response = broker.handle_frame(payload)?;
    let declared = u32::from_be_bytes(response[..4].try_into().unwrap()) as usize;
    assert_eq!(declared, response.len() - 4, "length prefix must match bytes written");
    let mut payload = decode_frame(&mut response)?.unwrap();
    let correlation_id = decode_response_header(&mut payload)?;
    Ok((correlation_id, payload))
}

// ---- Primitives ----

#[test]
fn uvarint_uses_little_endian_groups_of_seven() {
    let mut buf = BytesMut::new();
    put_uvarint(&mut buf, 0);
    put_uvarint(&mut buf, 300);
    assert_eq!(&buf[..], &[0x00, 0xac, 0x02]);

    let mut src = buf.freeze();
    assert_eq!(read_uvarint(&mut src).unwrap(), 0);
    assert_eq!(read_uvarint(&mut src).unwrap(), 300);
}

#[test]
fn signed_varint_is_zigzag_encoded() {
    let mut buf = BytesMut::new();
    put_varint(&mut buf, -1);
    put_varint(&mut buf, 1);
    put_varint(&mut buf, -64);
    assert_eq!(&buf[..], &[0x01, 0x02, 0x7f]);

    let mut src = buf.freeze();
    assert_eq!(read_varint(&mut src).unwrap(), -1);
    assert_eq!(read_varint(&mut src).unwrap(), 1);
    assert_eq!(read_varint(&mut src).unwrap(), -64);
}

#[test]
fn varint_longer_than_ten_bytes_is_rejected() {
    let mut src = Bytes::from(vec![0xffu8; 11]);
    assert_eq!(read_uvarint(&mut src), Err(DecodeError::VarintTooLong));
}

#[test]
fn short_fixed_width_read_reports_truncation() {
    let mut src = Bytes::from_static(&[0x00, 0x01]);
    assert_eq!(
        read_i32(&mut src),
        Err(DecodeError::Truncated {
            needed: 4,
            available: 2
        })
    );
    let mut empty = Bytes::new();
    assert!(read_u8(&mut empty).is_err());
}

#[test]
fn compact_string_null_and_empty_are_distinct() {
    let mut buf = BytesMut::new();
    put_compact_nullable_string(&mut buf, None);
    put_compact_nullable_string(&mut buf, Some(""));
    put_compact_nullable_string(&mut buf, Some("foo"));
    assert_eq!(&buf[..], &[0x00, 0x01, 0x04, b'f', b'o', b'o']);

    let mut src = buf.freeze();
    assert_eq!(read_compact_string(&mut src).unwrap(), None);
    assert_eq!(read_compact_string(&mut src).unwrap(), Some(String::new()));
    assert_eq!(read_compact_string(&mut src).unwrap(), Some("foo".to_string()));
}

#[test]
fn compact_string_with_invalid_utf8_fails() {
    let mut src = Bytes::from_static(&[0x03, 0xff, 0xfe]);
    assert_eq!(read_compact_string(&mut src), Err(DecodeError::InvalidUtf8));
}

#[test]
fn compact_array_zero_prefix_is_null_and_one_is_empty() {
    let mut src = Bytes::from_static(&[0x00, 0x01]);
    assert_eq!(read_compact_array(&mut src, read_i32).unwrap(), None);
    assert_eq!(read_compact_array(&mut src, read_i32).unwrap(), Some(vec![]));

    let mut buf = BytesMut::new();
    put_compact_array(&mut buf, &[7i32, 8], |dst, v| dst.put_i32(*v));
    assert_eq!(buf[0], 0x03);
    let mut src = buf.freeze();
    assert_eq!(
        read_compact_array(&mut src, read_i32).unwrap(),
        Some(vec![7, 8])
    );
}

#[test]
fn compact_array_count_larger_than_input_is_truncation() {
    let mut src = Bytes::from_static(&[0x7f, 0x00, 0x00, 0x00, 0x01]);
    assert!(matches!(
        read_compact_array(&mut src, read_i32),
        Err(DecodeError::Truncated { .. })
    ));
}

#[test]
fn huge_compact_array_count_fails_as_truncation() {
    let mut buf = BytesMut::new();
    put_uvarint(&mut buf, u64::from(u32::MAX));
    buf.put_bytes(0, 64 * 1024);

    let mut src = buf.freeze();
    let result = read_compact_array(&mut src, |src| {
        let name = read_compact_string(src)?;
        read_u8(src)?;
        Ok(name)
    });
    assert!(matches!(result, Err(DecodeError::Truncated { .. })));
}

#[test]
fn nullable_string_longer_than_i16_is_cut_to_fit() {
    let long = "é".repeat(20_000);
    let mut buf = BytesMut::new();
    put_nullable_string(&mut buf, Some(&long));

    let mut src = buf.freeze();
    let decoded = read_nullable_string(&mut src).unwrap().unwrap();
    assert!(src.is_empty());
    assert_eq!(decoded.len(), i16::MAX as usize - 1);
    assert!(long.starts_with(&decoded));
}

// ---- Framing ----

#[test]
fn partial_frame_waits_for_more_bytes() {
    let mut wire = frame_request(&header(18, 4, 1), &ApiVersionsRequest::default());
    let full_len = wire.len();
    let mut partial = wire.split_to(full_len - 1);

    assert!(decode_frame(&mut partial).unwrap().is_none());
    assert_eq!(partial.len(), full_len - 1, "nothing consumed from a partial frame");

    let err = ensure_frame_boundary(&partial).unwrap_err();
    assert!(matches!(
        err,
        KraftwireError::ShortFrame { expected, available }
            if expected == full_len && available == full_len - 1
    ));
    assert_eq!(err.class(), ErrorClass::Decode);
}

#[test]
fn oversized_frame_is_rejected_before_buffering() {
    let mut wire = BytesMut::new();
    wire.put_u32((MAX_FRAME_LEN + 1) as u32);
    assert!(matches!(
        decode_frame(&mut wire),
        Err(KraftwireError::FrameTooLarge(n)) if n == MAX_FRAME_LEN + 1
    ));
}

#[test]
fn two_frames_in_one_buffer_split_in_order() {
    let mut wire = frame_request(&header(18, 4, 1), &ApiVersionsRequest::default());
    wire.extend_from_slice(&frame_request(&header(18, 3, 2), &ApiVersionsRequest::default()));

    let first = decode_frame(&mut wire).unwrap().unwrap();
    let second = decode_frame(&mut wire).unwrap().unwrap();
    assert!(decode_frame(&mut wire).unwrap().is_none());

    let first = kraftwire::protocol::decode_request(first).unwrap();
    let second = kraftwire::protocol::decode_request(second).unwrap();
    assert_eq!(first.header.correlation_id, 1);
    assert_eq!(second.header.correlation_id, 2);
    assert_eq!(second.header.client_id.as_deref(), Some("kraftwire-test"));
}

// ---- ApiVersions ----

#[test]
fn api_versions_v4_advertises_both_apis() {
    let broker = Broker::new(BrokerConfig::default());
    let request = ApiVersionsRequest {
        client_software_name: Some("kafka-cli".to_string()),
        client_software_version: Some("3.7".to_string()),
    };
    let (correlation_id, mut body) = round_trip(&broker, &header(18, 4, 7), &request).unwrap();
    assert_eq!(correlation_id, 7);

    let response = ApiVersionsResponse::decode(&mut body).unwrap();
    assert!(body.is_empty());
    assert_eq!(response.error_code, 0);
    assert_eq!(response.throttle_time_ms, 0);
    assert_eq!(
        response.api_keys,
        vec![
            ApiVersion {
                api_key: 18,
                min_version: 0,
                max_version: 4
            },
            ApiVersion {
                api_key: 75,
                min_version: 0,
                max_version: 0
            },
        ]
    );
}

#[test]
fn api_versions_accepts_every_version_up_to_four() {
    let broker = Broker::new(BrokerConfig::default());
    for version in 0..=4 {
        let (_, mut body) =
            round_trip(&broker, &header(18, version, 1), &ApiVersionsRequest::default()).unwrap();
        assert_eq!(ApiVersionsResponse::decode(&mut body).unwrap().error_code, 0);
    }
}

#[test]
fn api_versions_unsupported_version_still_answers() {
    let broker = Broker::new(BrokerConfig::default());
    let (correlation_id, mut body) =
        round_trip(&broker, &header(18, 999, 42), &ApiVersionsRequest::default()).unwrap();
    assert_eq!(correlation_id, 42);

    let response = ApiVersionsResponse::decode(&mut body).unwrap();
    assert_eq!(response.error_code, 35);
    assert_eq!(response.api_keys.len(), 2);
}

#[test]
fn unknown_api_key_is_an_error_without_response() {
    let broker = Broker::new(BrokerConfig::default());
    let err = round_trip(&broker, &header(42, 0, 1), &ApiVersionsRequest::default()).unwrap_err();
    assert!(matches!(err, KraftwireError::UnsupportedApiKey(42)));
    assert_eq!(err.class(), ErrorClass::Domain);
}

#[test]
fn truncated_request_body_is_a_decode_error() {
    let broker = Broker::new(BrokerConfig::default());
    let mut payload = BytesMut::new();
    header(18, 4, 1).encode(&mut payload);
    // First compact string claims 9 bytes, only 2 follow.
    payload.put_slice(&[0x0a, b'a', b'b']);

    let err = broker.handle_frame(payload.freeze()).unwrap_err();
    assert_eq!(err.class(), ErrorClass::Decode);
}

#[test]
fn describe_partitions_with_huge_topic_count_is_rejected() {
    let broker = Broker::new(BrokerConfig::default());
    let mut payload = BytesMut::new();
    header(75, 0, 1).encode(&mut payload);
    put_uvarint(&mut payload, u64::from(u32::MAX));
    payload.put_bytes(0, 1024 * 1024);

    let err = broker.handle_frame(payload.freeze()).unwrap_err();
    assert!(matches!(
        err,
        KraftwireError::Decode(DecodeError::Truncated { .. })
    ));
}

// ---- Registry ----

#[test]
fn default_registry_serves_only_api_versions_and_describe_partitions() {
    let broker = Broker::new(BrokerConfig::default());
    assert_eq!(broker.registry().api_keys(), vec![18, 75]);
    assert!(!broker.registry().supports(1));
    assert_eq!(broker.registry().name_of(75), Some("DescribeTopicPartitions"));
}

#[test]
fn enable_flag_accepts_one_and_true_only() {
    for on in ["1", "true", "TRUE", " True "] {
        assert!(parse_flag(on), "{on:?} should enable");
    }
    for off in ["", "0", "false", "yes", "on"] {
        assert!(!parse_flag(off), "{off:?} should not enable");
    }
}

#[test]
fn fetch_is_registered_only_when_enabled() {
    let broker = Broker::new(BrokerConfig {
        enable_fetch: true,
        ..Default::default()
    });
    assert_eq!(broker.registry().api_keys(), vec![1, 18, 75]);

    let request = FetchRequest {
        max_wait_ms: 500,
        min_bytes: 1,
        max_bytes: 1024 * 1024,
        isolation_level: 0,
        session_id: 77,
        session_epoch: 0,
        topics: vec![FetchTopic {
            topic_id: Uuid::from_u128(0x21),
            partitions: vec![FetchPartition {
                partition: 0,
                current_leader_epoch: 0,
                fetch_offset: 0,
                last_fetched_epoch: -1,
                log_start_offset: -1,
                partition_max_bytes: 1024,
            }],
        }],
        forgotten_topics: vec![],
        rack_id: Some(String::new()),
    };

    let mut encoded = request.to_bytes();
    assert_eq!(FetchRequest::decode(&mut encoded).unwrap(), request);

    let (correlation_id, mut body) = round_trip(&broker, &header(1, 16, 9), &request).unwrap();
    assert_eq!(correlation_id, 9);
    let response = FetchResponse::decode(&mut body).unwrap();
    assert_eq!(response.session_id, 77);
    assert_eq!(response.responses.len(), 1);
    let partition = &response.responses[0].partitions[0];
    assert_eq!(partition.high_watermark, 100);
    assert_eq!(partition.last_stable_offset, 90);
    assert_eq!(partition.aborted_transactions.len(), 1);
    assert_eq!(&partition.records[..], &[1, 2, 3]);
}
