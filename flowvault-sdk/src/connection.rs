//! Connection handle for sending observations.

use std::sync::Arc;

use async_trait::async_trait;
use flowvault_types::{Observation, Tags, Timestamp};
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::error::TransportError;

/// The sending side of a telemetry transport.
///
/// Each call issues one point observation. Implementations may buffer, so a
/// successful return means the observation was accepted, not that it reached
/// the backend.
#[async_trait]
pub trait Transport: Send {
    /// Send an integer sample.
    async fn send_integer(
        &mut self,
        tags: &Tags,
        value: u64,
        timestamp: Timestamp,
    ) -> Result<(), TransportError>;

    /// Send a text sample.
    async fn send_text(
        &mut self,
        tags: &Tags,
        value: &str,
        timestamp: Timestamp,
    ) -> Result<(), TransportError>;
}

/// A connection to a running [`Consumer`](crate::Consumer).
///
/// Obtain one by calling `Consumer::connect()`. Observations sent here are
/// queued on a bounded channel; when the queue is full the send waits.
///
/// # Example
///
/// ```rust,no_run
/// use flowvault_sdk::{Consumer, Tags, Timestamp, Transport};
/// use std::time::Duration;
///
/// # async fn run() -> Result<(), flowvault_sdk::TransportError> {
/// let consumer = Consumer::new("tcp://localhost:1234", Duration::from_secs(1)).await?;
/// let mut connection = consumer.connect();
///
/// let tags = Tags::new().with("field", "tx_bytes");
/// connection.send_integer(&tags, 34954, Timestamp::from_nanos(1)).await?;
///
/// connection.close();
/// consumer.shutdown().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Connection {
    pub(crate) tx: mpsc::Sender<Observation>,
    pub(crate) failure: Arc<Mutex<Option<String>>>,
}

impl Connection {
    async fn enqueue(&self, observation: Observation) -> Result<(), TransportError> {
        if self.tx.send(observation).await.is_err() {
            return Err(self.closed_error());
        }
        Ok(())
    }

    /// The error to report once the consumer no longer accepts input.
    fn closed_error(&self) -> TransportError {
        match self.failure.lock().clone() {
            Some(reason) => TransportError::Delivery(reason),
            None => TransportError::Closed,
        }
    }

    /// Release this connection.
    ///
    /// Observations already sent stay queued and are delivered by the
    /// consumer's next flush.
    pub fn close(self) {
        drop(self);
    }
}

#[async_trait]
impl Transport for Connection {
    async fn send_integer(
        &mut self,
        tags: &Tags,
        value: u64,
        timestamp: Timestamp,
    ) -> Result<(), TransportError> {
        self.enqueue(Observation::integer(tags.clone(), value, timestamp))
            .await
    }

    async fn send_text(
        &mut self,
        tags: &Tags,
        value: &str,
        timestamp: Timestamp,
    ) -> Result<(), TransportError> {
        self.enqueue(Observation::text(tags.clone(), value, timestamp))
            .await
    }
}
