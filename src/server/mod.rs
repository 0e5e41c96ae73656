//! TCP front end for the Kafka wire protocol.

mod kafka_handler;

pub use kafka_handler::{handle_kafka_connection, run_kafka_server, run_kafka_server_on_listener};
