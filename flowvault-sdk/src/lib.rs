//! # flowvault-sdk
//!
//! Batched transport for shipping point observations to a time-series
//! telemetry backend.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use flowvault_sdk::{Consumer, Tags, Timestamp, Transport};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), flowvault_sdk::TransportError> {
//!     // Connect a consumer that ships a batch every second
//!     let consumer = Consumer::new("tcp://localhost:1234", Duration::from_secs(1)).await?;
//!
//!     // Send observations through a connection
//!     let mut connection = consumer.connect();
//!     let tags = Tags::new().with("type", "ip_traffic").with("field", "tx_bytes");
//!     connection.send_integer(&tags, 34954, Timestamp::from_nanos(1)).await?;
//!
//!     // Release the connection and flush the last batch
//!     connection.close();
//!     consumer.shutdown().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Endpoints**: `tcp://host:port`, `file:///path`, or an in-process channel
//! - **Batching**: observations are shipped once per batch period
//! - **Backpressure**: connections wait when the bounded queue is full
//! - **Fail-stop**: the first delivery error stops the consumer and is
//!   reported to every sender

mod connection;
mod consumer;
mod error;
mod output;

pub use connection::{Connection, Transport};
pub use consumer::{Consumer, ConsumerBuilder, DeliveryStats, DEFAULT_CAPACITY};
pub use error::TransportError;
pub use output::Output;

// Re-export types for convenience
pub use flowvault_types::{Batch, Observation, Tags, Timestamp, Value};
