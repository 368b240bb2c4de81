//! # flowvault-types
//!
//! Wire types shared by the flowvault ingester and its telemetry transport.
//!
//! A telemetry backend stores *point observations*: a value (integer or text)
//! identified by a set of string tags and a nanosecond timestamp. The backend
//! treats `(tags, timestamp)` as a uniqueness key, which is why producers must
//! never issue the same timestamp twice for the same source.
//!
//! ## Features
//!
//! - `serde`: serialization via serde, used for the JSON-lines wire format
//!
//! ## Example
//!
//! ```rust
//! use flowvault_types::{Batch, Observation, Tags, Timestamp};
//!
//! let tags = Tags::new()
//!     .with("type", "ip_traffic")
//!     .with("collection_point", "syd1")
//!     .with("ip", "10.0.0.1")
//!     .with("field", "tx_bytes");
//!
//! let batch = Batch::builder()
//!     .observation(Observation::integer(tags, 34954, Timestamp::from_nanos(1)))
//!     .build();
//!
//! assert_eq!(batch.len(), 1);
//! ```
//!
//! ## Schema Version
//!
//! The current schema version is **1**. Every serialized [`Batch`] carries it
//! so consumers can handle format evolution.

mod batch;
mod observation;
mod timestamp;
mod version;

pub use batch::*;
pub use observation::*;
pub use timestamp::*;
pub use version::*;

/// Current schema version.
///
/// Increment this when making breaking changes to the batch format.
pub const SCHEMA_VERSION: u32 = 1;
