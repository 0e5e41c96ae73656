//! The TCP front end over a real socket.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use kraftwire::observability::observability;
use kraftwire::protocol::{
    decode_response_header, frame_request, ApiVersionsRequest, ApiVersionsResponse, Decode,
    DescribePartitionsRequest, DescribePartitionsResponse, RequestHeader,
};
use kraftwire::{server, Broker, BrokerConfig};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/cluster_metadata.log")
}

async fn start_server(config: BrokerConfig) -> std::net::SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let broker = Arc::new(Broker::new(config));
    tokio::spawn(async move {
        let _ = server::run_kafka_server_on_listener(broker, listener).await;
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    addr
}

fn header(api_key: i16, api_version: i16, correlation_id: i32) -> RequestHeader {
    RequestHeader {
        api_key,
        api_version,
        correlation_id,
        client_id: Some("it".to_string()),
    }
}

/// Read one length-prefixed response; returns correlation id and body.
async fn read_response(stream: &mut TcpStream) -> (i32, Bytes) {
    let len = stream.read_u32().await.unwrap() as usize;
    let mut buf = vec![0u8; len];
    stream.read_exact(&mut buf).await.unwrap();
    let mut payload = Bytes::from(buf);
    let correlation_id = decode_response_header(&mut payload).unwrap();
    (correlation_id, payload)
}

async fn assert_closed(stream: &mut TcpStream) {
    let mut rest = Vec::new();
    let n = tokio::time::timeout(Duration::from_secs(2), stream.read_to_end(&mut rest))
        .await
        .expect("server should close the connection")
        .unwrap_or(0);
    assert_eq!(n, 0, "no response bytes expected");
}

#[tokio::test]
async fn api_versions_over_tcp() {
    let addr = start_server(BrokerConfig::default()).await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    let wire = frame_request(&header(18, 4, 1234), &ApiVersionsRequest::default());
    stream.write_all(&wire).await.unwrap();

    let (correlation_id, mut body) = read_response(&mut stream).await;
    assert_eq!(correlation_id, 1234);
    let response = ApiVersionsResponse::decode(&mut body).unwrap();
    assert_eq!(response.error_code, 0);
    let keys: Vec<i16> = response.api_keys.iter().map(|k| k.api_key).collect();
    assert_eq!(keys, [18, 75]);
}

#[tokio::test]
async fn sequential_requests_share_one_connection() {
    let addr = start_server(BrokerConfig {
        metadata_log_path: fixture_path(),
        ..Default::default()
    })
    .await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    for correlation_id in 1..=3 {
        let wire = frame_request(&header(18, 3, correlation_id), &ApiVersionsRequest::default());
        stream.write_all(&wire).await.unwrap();
        let (echoed, _) = read_response(&mut stream).await;
        assert_eq!(echoed, correlation_id);
    }

    let request = DescribePartitionsRequest {
        topics: vec!["foo".to_string(), "bar".to_string()],
        response_partition_limit: 100,
        cursor: None,
    };
    stream
        .write_all(&frame_request(&header(75, 0, 4), &request))
        .await
        .unwrap();
    let (echoed, mut body) = read_response(&mut stream).await;
    assert_eq!(echoed, 4);
    let response = DescribePartitionsResponse::decode(&mut body).unwrap();
    assert_eq!(response.topics[0].error_code, 0);
    assert_eq!(response.topics[1].error_code, 3);
}

#[tokio::test]
async fn request_split_across_writes_is_reassembled() {
    let addr = start_server(BrokerConfig::default()).await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    let wire = frame_request(&header(18, 4, 77), &ApiVersionsRequest::default());
    let (head, tail) = wire.split_at(6);
    stream.write_all(head).await.unwrap();
    stream.flush().await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    stream.write_all(tail).await.unwrap();

    let (correlation_id, _) = read_response(&mut stream).await;
    assert_eq!(correlation_id, 77);
}

#[tokio::test]
async fn two_requests_in_one_write_get_two_responses() {
    let addr = start_server(BrokerConfig::default()).await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    let mut wire = BytesMut::new();
    wire.extend_from_slice(&frame_request(&header(18, 4, 1), &ApiVersionsRequest::default()));
    wire.extend_from_slice(&frame_request(&header(18, 4, 2), &ApiVersionsRequest::default()));
    stream.write_all(&wire).await.unwrap();

    assert_eq!(read_response(&mut stream).await.0, 1);
    assert_eq!(read_response(&mut stream).await.0, 2);
}

#[tokio::test]
async fn unknown_api_key_closes_connection() {
    let addr = start_server(BrokerConfig::default()).await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    let wire = frame_request(&header(1, 12, 9), &ApiVersionsRequest::default());
    stream.write_all(&wire).await.unwrap();
    assert_closed(&mut stream).await;
}

#[tokio::test]
async fn oversized_frame_closes_connection() {
    let addr = start_server(BrokerConfig::default()).await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    stream.write_u32(200 * 1024 * 1024).await.unwrap();
    stream.write_all(&[0u8; 16]).await.unwrap();
    assert_closed(&mut stream).await;
}

#[tokio::test]
async fn requests_are_counted() {
    let before = observability().snapshot();
    let addr = start_server(BrokerConfig::default()).await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    let wire = frame_request(&header(18, 4, 1), &ApiVersionsRequest::default());
    stream.write_all(&wire).await.unwrap();
    read_response(&mut stream).await;

    let after = observability().snapshot();
    assert!(after.requests_total > before.requests_total);
    assert!(after.connections_total > before.connections_total);
}
