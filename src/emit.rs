//! Turning a flow record into backend observations.

use flowvault_sdk::{Tags, Timestamp, Transport, TransportError};

use crate::record::FlowRecord;

/// Value of the `type` tag on every observation.
pub const TRAFFIC_TYPE: &str = "ip_traffic";

/// The `field` discriminator of each observation derived from a flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowField {
    /// Bytes sent, keyed by source IP.
    TxBytes,
    /// Bytes received, keyed by destination IP.
    RxBytes,
    /// Peer address, keyed by source IP.
    DestIp,
    /// Peer address, keyed by destination IP.
    SrcIp,
}

impl FlowField {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowField::TxBytes => "tx_bytes",
            FlowField::RxBytes => "rx_bytes",
            FlowField::DestIp => "dest_ip",
            FlowField::SrcIp => "src_ip",
        }
    }
}

/// Sends the four observations of each flow through a [`Transport`].
#[derive(Debug)]
pub struct Emitter<T> {
    transport: T,
    collection_point: String,
}

impl<T: Transport> Emitter<T> {
    pub fn new(transport: T, collection_point: impl Into<String>) -> Self {
        Self {
            transport,
            collection_point: collection_point.into(),
        }
    }

    pub fn collection_point(&self) -> &str {
        &self.collection_point
    }

    /// Give the transport back, e.g. to close it.
    pub fn into_inner(self) -> T {
        self.transport
    }

    fn tags(&self, ip: &str, field: FlowField) -> Tags {
        Tags::new()
            .with("type", TRAFFIC_TYPE)
            .with("collection_point", self.collection_point.as_str())
            .with("ip", ip)
            .with("field", field.as_str())
    }

    /// Emit tx_bytes, rx_bytes, dest_ip and src_ip for one flow, in that
    /// order, all at `timestamp`.
    ///
    /// Stops at the first failed send. Observations already accepted by the
    /// transport are not withdrawn.
    pub async fn emit(
        &mut self,
        record: &FlowRecord,
        timestamp: Timestamp,
    ) -> Result<(), TransportError> {
        let tx_bytes = self.tags(&record.source_ip, FlowField::TxBytes);
        self.transport
            .send_integer(&tx_bytes, record.bytes, timestamp)
            .await?;

        let rx_bytes = self.tags(&record.dest_ip, FlowField::RxBytes);
        self.transport
            .send_integer(&rx_bytes, record.bytes, timestamp)
            .await?;

        let dest_ip = self.tags(&record.source_ip, FlowField::DestIp);
        self.transport
            .send_text(&dest_ip, &record.dest_ip, timestamp)
            .await?;

        let src_ip = self.tags(&record.dest_ip, FlowField::SrcIp);
        self.transport
            .send_text(&src_ip, &record.source_ip, timestamp)
            .await
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingTransport;
    use super::*;

    fn record() -> FlowRecord {
        FlowRecord {
            source_ip: "202.4.228.250".to_string(),
            dest_ip: "180.76.5.15".to_string(),
            bytes: 34954,
        }
    }

    #[tokio::test]
    async fn emits_four_observations_at_one_timestamp() {
        let mut emitter = Emitter::new(RecordingTransport::default(), "syd1");
        let ts = Timestamp::from_nanos(1_000);
        emitter.emit(&record(), ts).await.unwrap();

        let sent = emitter.into_inner().sent;
        assert_eq!(sent.len(), 4);
        assert!(sent.iter().all(|o| o.timestamp == ts));
        assert!(sent
            .iter()
            .all(|o| o.tags.get("type") == Some("ip_traffic")
                && o.tags.get("collection_point") == Some("syd1")
                && o.tags.len() == 4));

        let summary: Vec<_> = sent
            .iter()
            .map(|o| (o.tags.get("field").unwrap(), o.tags.get("ip").unwrap()))
            .collect();
        assert_eq!(
            summary,
            [
                ("tx_bytes", "202.4.228.250"),
                ("rx_bytes", "180.76.5.15"),
                ("dest_ip", "202.4.228.250"),
                ("src_ip", "180.76.5.15"),
            ]
        );

        assert_eq!(sent[0].value.as_integer(), Some(34954));
        assert_eq!(sent[1].value.as_integer(), Some(34954));
        assert_eq!(sent[2].value.as_text(), Some("180.76.5.15"));
        assert_eq!(sent[3].value.as_text(), Some("202.4.228.250"));
    }

    #[tokio::test]
    async fn stops_at_first_failed_send() {
        let mut emitter = Emitter::new(RecordingTransport::failing_at(1), "syd1");
        let err = emitter
            .emit(&record(), Timestamp::from_nanos(5))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Delivery(_)));

        // tx_bytes went out before rx_bytes failed; nothing after it was tried.
        let transport = emitter.into_inner();
        assert_eq!(transport.sent.len(), 1);
        assert_eq!(transport.sent[0].tags.get("field"), Some("tx_bytes"));
    }

    #[test]
    fn field_names() {
        assert_eq!(FlowField::TxBytes.as_str(), "tx_bytes");
        assert_eq!(FlowField::RxBytes.as_str(), "rx_bytes");
        assert_eq!(FlowField::DestIp.as_str(), "dest_ip");
        assert_eq!(FlowField::SrcIp.as_str(), "src_ip");
    }
}
