//! TCP server that speaks the Kafka wire protocol.

use crate::broker::Broker;
use crate::error::Result;
use crate::observability::observability;
use crate::protocol::{decode_frame, decode_request, ensure_frame_boundary};
use bytes::BytesMut;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

/// Run the server on an existing listener (e.g. from bind("127.0.0.1:0")).
pub async fn run_kafka_server_on_listener(broker: Arc<Broker>, listener: TcpListener) -> Result<()> {
    let addr = listener.local_addr()?;
    info!(%addr, "kraftwire listening");
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(x) => x,
            Err(e) => {
                error!("accept error: {}", e);
                continue;
            }
        };
        let broker = Arc::clone(&broker);
        tokio::spawn(async move {
            observability().record_connection();
            debug!(%peer, "connection opened");
            match handle_kafka_connection(broker, stream).await {
                Ok(()) => debug!(%peer, "connection closed"),
                Err(e) => error!(%peer, class = ?e.class(), "connection error: {}", e),
            }
            debug!(%peer, stats = ?observability().snapshot(), "connection stats");
        });
    }
}

/// Bind `broker.config().listen_addr` and run the accept loop.
pub async fn run_kafka_server(broker: Arc<Broker>) -> Result<()> {
    let listener = TcpListener::bind(&broker.config().listen_addr).await?;
    run_kafka_server_on_listener(broker, listener).await
}

/// Serve one connection until the peer closes or a request fails.
///
/// Any error (short frame, bad header, unknown API key, undecodable body)
/// ends the connection without a response.
pub async fn handle_kafka_connection(broker: Arc<Broker>, mut stream: TcpStream) -> Result<()> {
    let mut read_buf = BytesMut::with_capacity(4096);
    loop {
        read_buf.reserve(4096);
        let n = stream.read_buf(&mut read_buf).await?;
        if n == 0 {
            return ensure_frame_boundary(&read_buf);
        }
        while let Some(payload) = decode_frame(&mut read_buf)? {
            let started = Instant::now();
            let request = match decode_request(payload) {
                Ok(request) => request,
                Err(e) => {
                    observability().record_request(started.elapsed(), false);
                    return Err(e);
                }
            };
            // The span guard is not Send; it must be dropped before the write.
            let framed = {
                let header = &request.header;
                let span = tracing::info_span!(
                    "kraftwire.request",
                    api_key = header.api_key,
                    api_version = header.api_version
                );
                let _entered = span.enter();
                let correlation_id = header.correlation_id;
                info!(correlation_id, client_id = ?header.client_id, "request");

                match broker.handle_request(request) {
                    Ok(framed) => {
                        observability().record_request(started.elapsed(), true);
                        info!(correlation_id, len = framed.len(), "response");
                        framed
                    }
                    Err(e) => {
                        observability().record_request(started.elapsed(), false);
                        warn!(correlation_id, "closing connection: {}", e);
                        return Err(e);
                    }
                }
            };
            stream.write_all(&framed).await?;
            stream.flush().await?;
        }
    }
}
