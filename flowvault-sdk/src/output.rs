//! Output backends for delivering batches.

use std::path::PathBuf;

use flowvault_types::Batch;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use crate::error::TransportError;

/// Where the consumer delivers its batches.
///
/// Every backend receives one JSON-encoded [`Batch`] per line.
#[derive(Debug)]
pub enum Output {
    /// Stream batches to a TCP server.
    Tcp(String),

    /// Append batches to a file.
    File(PathBuf),

    /// Hand batches to an in-process channel.
    ///
    /// Use `Output::channel()` to create this variant and get the receiver.
    Channel(mpsc::Sender<Batch>),
}

impl Output {
    /// Parse an endpoint URI.
    ///
    /// Supported forms are `tcp://host:port` and `file:///path/to/file`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use flowvault_sdk::Output;
    ///
    /// let output = Output::from_endpoint("tcp://localhost:1234").unwrap();
    /// assert!(matches!(output, Output::Tcp(addr) if addr == "localhost:1234"));
    /// ```
    pub fn from_endpoint(endpoint: &str) -> Result<Self, TransportError> {
        let (scheme, rest) = endpoint
            .split_once("://")
            .ok_or_else(|| TransportError::invalid_endpoint(endpoint, "missing scheme"))?;

        match scheme {
            "tcp" => {
                let (host, port) = rest
                    .rsplit_once(':')
                    .ok_or_else(|| TransportError::invalid_endpoint(endpoint, "missing port"))?;
                if host.is_empty() {
                    return Err(TransportError::invalid_endpoint(endpoint, "missing host"));
                }
                port.parse::<u16>()
                    .map_err(|_| TransportError::invalid_endpoint(endpoint, "invalid port"))?;
                Ok(Output::tcp(rest))
            }
            "file" => {
                if rest.is_empty() {
                    return Err(TransportError::invalid_endpoint(endpoint, "missing path"));
                }
                Ok(Output::file(rest))
            }
            other => Err(TransportError::invalid_endpoint(
                endpoint,
                format!("unsupported scheme {other:?}"),
            )),
        }
    }

    /// Create a TCP output.
    pub fn tcp(addr: impl Into<String>) -> Self {
        Output::Tcp(addr.into())
    }

    /// Create a file output.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Output::File(path.into())
    }

    /// Create a channel output and return both the output and receiver.
    ///
    /// # Example
    ///
    /// ```rust
    /// use flowvault_sdk::Output;
    ///
    /// let (output, mut rx) = Output::channel(16);
    ///
    /// // Later, receive batches
    /// // while let Some(batch) = rx.recv().await {
    /// //     println!("Got {} observations", batch.len());
    /// // }
    /// ```
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<Batch>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Output::Channel(tx), rx)
    }

    /// Human-readable description used in logs.
    pub fn describe(&self) -> String {
        match self {
            Output::Tcp(addr) => format!("tcp://{addr}"),
            Output::File(path) => format!("file://{}", path.display()),
            Output::Channel(_) => "channel".to_string(),
        }
    }

    /// Open the backend connection.
    pub(crate) async fn open(self) -> Result<Writer, TransportError> {
        let endpoint = self.describe();
        match self {
            Output::Tcp(addr) => {
                let stream = TcpStream::connect(&addr)
                    .await
                    .map_err(|source| TransportError::Connection { endpoint, source })?;
                Ok(Writer::Tcp(BufWriter::new(stream)))
            }
            Output::File(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)
                    .await
                    .map_err(|source| TransportError::Connection { endpoint, source })?;
                Ok(Writer::File(file))
            }
            Output::Channel(tx) => Ok(Writer::Channel(tx)),
        }
    }
}

/// An opened output.
#[derive(Debug)]
pub(crate) enum Writer {
    Tcp(BufWriter<TcpStream>),
    File(File),
    Channel(mpsc::Sender<Batch>),
}

impl Writer {
    /// Deliver one batch.
    pub(crate) async fn emit(&mut self, batch: Batch) -> Result<(), TransportError> {
        match self {
            Writer::Tcp(stream) => {
                let line = encode_line(&batch)?;
                stream.write_all(&line).await.map_err(delivery)?;
                stream.flush().await.map_err(delivery)?;
            }
            Writer::File(file) => {
                let line = encode_line(&batch)?;
                file.write_all(&line).await.map_err(delivery)?;
                file.flush().await.map_err(delivery)?;
            }
            Writer::Channel(tx) => {
                tx.send(batch).await.map_err(|_| TransportError::Closed)?;
            }
        }
        Ok(())
    }

    /// Flush and release the underlying connection.
    pub(crate) async fn close(self) -> Result<(), TransportError> {
        match self {
            Writer::Tcp(mut stream) => stream.shutdown().await.map_err(delivery),
            Writer::File(file) => file.sync_all().await.map_err(delivery),
            Writer::Channel(_) => Ok(()),
        }
    }
}

fn encode_line(batch: &Batch) -> Result<Vec<u8>, TransportError> {
    let mut line = serde_json::to_vec(batch)?;
    line.push(b'\n');
    Ok(line)
}

fn delivery(err: std::io::Error) -> TransportError {
    TransportError::Delivery(err.to_string())
}
