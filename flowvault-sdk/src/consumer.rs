//! The batching consumer that owns the backend connection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use flowvault_types::{Batch, Observation};
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::connection::Connection;
use crate::error::TransportError;
use crate::output::{Output, Writer};

/// Default bound on observations queued between connections and the consumer.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Background task that batches observations and delivers them to an output.
///
/// Observations arrive from any number of [`Connection`]s. Every batch
/// period the accumulated observations are shipped as one [`Batch`]; a last
/// batch is shipped on shutdown.
///
/// If a delivery fails, the consumer stops: later sends on every connection
/// fail with [`TransportError::Delivery`], and `shutdown()` returns the
/// same error.
///
/// # Example
///
/// ```rust,no_run
/// use flowvault_sdk::{Consumer, Output};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> Result<(), flowvault_sdk::TransportError> {
///     let consumer = Consumer::builder()
///         .output(Output::tcp("localhost:1234"))
///         .batch_period(Duration::from_millis(500))
///         .start()
///         .await?;
///
///     let connection = consumer.connect();
///     // ... send observations ...
///     connection.close();
///
///     consumer.shutdown().await?;
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct Consumer {
    tx: mpsc::Sender<Observation>,
    failure: Arc<Mutex<Option<String>>>,
    stats: Arc<DeliveryCounters>,
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<Result<(), TransportError>>,
    description: String,
}

impl Consumer {
    /// Start a consumer for an endpoint URI such as `tcp://host:port`.
    pub async fn new(endpoint: &str, batch_period: Duration) -> Result<Self, TransportError> {
        Self::builder()
            .output(Output::from_endpoint(endpoint)?)
            .batch_period(batch_period)
            .start()
            .await
    }

    /// Create a builder for configuring the consumer.
    pub fn builder() -> ConsumerBuilder {
        ConsumerBuilder::new()
    }

    /// Open a connection that feeds this consumer.
    pub fn connect(&self) -> Connection {
        Connection {
            tx: self.tx.clone(),
            failure: self.failure.clone(),
        }
    }

    /// Description of the output, for logs.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Totals delivered so far.
    pub fn stats(&self) -> DeliveryStats {
        self.stats.snapshot()
    }

    /// Flush what is queued, close the output and stop the task.
    ///
    /// Returns the final totals, or the delivery error if the consumer
    /// stopped because of one.
    pub async fn shutdown(self) -> Result<DeliveryStats, TransportError> {
        let Consumer {
            tx,
            stats,
            stop_tx,
            task,
            ..
        } = self;
        drop(tx);
        let _ = stop_tx.send(true);

        match task.await {
            Ok(result) => result.map(|()| stats.snapshot()),
            Err(err) => Err(TransportError::Task(err.to_string())),
        }
    }
}

/// Builder for configuring a Consumer.
#[derive(Debug, Default)]
pub struct ConsumerBuilder {
    output: Option<Output>,
    batch_period: Option<Duration>,
    capacity: Option<usize>,
}

impl ConsumerBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the output destination.
    pub fn output(mut self, output: Output) -> Self {
        self.output = Some(output);
        self
    }

    /// Set how long observations accumulate before a batch is shipped.
    ///
    /// Defaults to 1 second if not specified.
    pub fn batch_period(mut self, period: Duration) -> Self {
        self.batch_period = Some(period);
        self
    }

    /// Set the bound of the observation queue.
    ///
    /// Defaults to [`DEFAULT_CAPACITY`].
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Open the output and spawn the consumer task.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn start(self) -> Result<Consumer, TransportError> {
        let output = self
            .output
            .ok_or_else(|| TransportError::invalid_endpoint("", "no output configured"))?;
        let batch_period = self
            .batch_period
            .unwrap_or(Duration::from_secs(1))
            .max(Duration::from_millis(1));
        let capacity = self.capacity.unwrap_or(DEFAULT_CAPACITY).max(1);

        let description = output.describe();
        let writer = output.open().await?;
        tracing::debug!(output = %description, ?batch_period, capacity, "consumer connected");

        let (tx, rx) = mpsc::channel(capacity);
        let (stop_tx, stop_rx) = watch::channel(false);
        let failure = Arc::new(Mutex::new(None));
        let stats = Arc::new(DeliveryCounters::default());

        let task = tokio::spawn(run(
            writer,
            rx,
            stop_rx,
            batch_period,
            failure.clone(),
            stats.clone(),
        ));

        Ok(Consumer {
            tx,
            failure,
            stats,
            stop_tx,
            task,
            description,
        })
    }
}

/// Counts of what the consumer has delivered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryStats {
    pub batches: u64,
    pub observations: u64,
}

#[derive(Debug, Default)]
struct DeliveryCounters {
    batches: AtomicU64,
    observations: AtomicU64,
}

impl DeliveryCounters {
    fn record(&self, observations: usize) {
        self.batches.fetch_add(1, Ordering::Relaxed);
        self.observations
            .fetch_add(observations as u64, Ordering::Relaxed);
    }

    fn snapshot(&self) -> DeliveryStats {
        DeliveryStats {
            batches: self.batches.load(Ordering::Relaxed),
            observations: self.observations.load(Ordering::Relaxed),
        }
    }
}

async fn run(
    mut writer: Writer,
    mut rx: mpsc::Receiver<Observation>,
    mut stop_rx: watch::Receiver<bool>,
    batch_period: Duration,
    failure: Arc<Mutex<Option<String>>>,
    stats: Arc<DeliveryCounters>,
) -> Result<(), TransportError> {
    let mut ticker = tokio::time::interval(batch_period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut batch = Batch::new();

    let result = loop {
        tokio::select! {
            received = rx.recv() => match received {
                Some(observation) => batch.push(observation),
                // Every sender is gone.
                None => break flush(&mut writer, &mut batch, &stats).await,
            },
            _ = ticker.tick() => {
                if let Err(err) = flush(&mut writer, &mut batch, &stats).await {
                    break Err(err);
                }
            }
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    rx.close();
                    while let Some(observation) = rx.recv().await {
                        batch.push(observation);
                    }
                    break flush(&mut writer, &mut batch, &stats).await;
                }
            }
        }
    };

    let result = match result {
        Ok(()) => writer.close().await,
        Err(err) => Err(err),
    };

    if let Err(err) = &result {
        tracing::error!(error = %err, "consumer stopped");
        *failure.lock() = Some(err.to_string());
    }
    result
}

async fn flush(
    writer: &mut Writer,
    batch: &mut Batch,
    stats: &DeliveryCounters,
) -> Result<(), TransportError> {
    if batch.is_empty() {
        return Ok(());
    }
    let outgoing = batch.take();
    let count = outgoing.len();
    writer.emit(outgoing).await?;
    stats.record(count);
    tracing::debug!(observations = count, "flushed batch");
    Ok(())
}
