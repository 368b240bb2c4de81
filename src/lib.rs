//! # flowvault
//!
//! Ships pmacct flow-accounting records to a time-series telemetry backend.
//!
//! pmacct prints one line per flow. flowvault reads those lines, keeps the
//! source IP, destination IP and byte count, stamps each flow with a unique
//! nanosecond timestamp and emits four observations per flow:
//!
//! | `field`    | `ip` tag       | value            |
//! |------------|----------------|------------------|
//! | `tx_bytes` | source IP      | byte count       |
//! | `rx_bytes` | destination IP | byte count       |
//! | `dest_ip`  | source IP      | destination IP   |
//! | `src_ip`   | destination IP | source IP        |
//!
//! All four also carry `type = "ip_traffic"` and the configured
//! `collection_point`, and share one timestamp so they can be correlated.
//!
//! ## Architecture
//!
//! ```text
//! stdin ──▶ LineReader ──▶ record::parse ──▶ Sequencer ──▶ Emitter ──▶ Connection ──▶ Consumer ──▶ backend
//!            (ingest)        (record)       (sequencer)    (emit)      (flowvault-sdk: batching transport)
//! ```
//!
//! - **[`record`]**: tolerant parser for pmacct lines
//! - **[`sequencer`]**: strictly increasing timestamps from a wall clock
//! - **[`emit`]**: four observations per flow through a [`Transport`](flowvault_sdk::Transport)
//! - **[`ingest`]**: the line-by-line loop tying it together
//! - **[`settings`]**: layered configuration
//!
//! ## Usage
//!
//! ```bash
//! pmacct -s -e | flowvault syd1 tcp://localhost:1234
//! ```
//!
//! ### As a library
//!
//! ```
//! use flowvault::record;
//!
//! let flow = record::parse(
//!     "0 unknown 00:00:00:00:00:00 00:00:00:00:00:00 0 0 0 202.4.228.250 180.76.5.15 0 0 0 ip 0 24 0 34954",
//! )
//! .unwrap();
//! assert_eq!(flow.bytes, 34954);
//! ```
//!
//! Running a whole pipeline into an in-process channel:
//!
//! ```
//! use flowvault::{Emitter, LineReader, Pipeline, Sequencer};
//! use flowvault_sdk::{Consumer, Output};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let (output, mut batches) = Output::channel(8);
//! let consumer = Consumer::builder()
//!     .output(output)
//!     .batch_period(Duration::from_secs(1))
//!     .start()
//!     .await
//!     .unwrap();
//!
//! let input = "1 unknown 0 0 0 0 0 10.0.0.1 10.0.0.2 0 0 0 ip 0 1 0 500\n";
//! let mut pipeline = Pipeline::new(
//!     LineReader::new(input.as_bytes(), 8192),
//!     Sequencer::system().unwrap(),
//!     Emitter::new(consumer.connect(), "syd1"),
//! );
//! let stats = pipeline.run().await.unwrap();
//! assert_eq!(stats.records, 1);
//!
//! pipeline.into_emitter().into_inner().close();
//! consumer.shutdown().await.unwrap();
//! assert_eq!(batches.recv().await.unwrap().len(), 4);
//! # });
//! ```

pub mod emit;
pub mod exit;
pub mod ingest;
pub mod logging;
pub mod record;
pub mod sequencer;
pub mod settings;

// Re-export main types for convenience
pub use emit::{Emitter, FlowField};
pub use exit::ExitStatus;
pub use ingest::{IngestError, IngestStats, Line, LineReader, Pipeline};
pub use record::{FlowRecord, ParseError};
pub use sequencer::{Clock, ClockError, Sequencer, SharedSequencer, SystemClock};
pub use settings::{Overrides, Settings, SettingsError};
