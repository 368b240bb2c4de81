//! End-to-end runs through the library pipeline and the binary.

use std::io::Write;
use std::process::{Command, Stdio};
use std::time::Duration;

use flowvault::{Emitter, LineReader, Pipeline, Sequencer};
use flowvault_sdk::{Batch, Consumer, Observation, Output};

const PMACCT_OUTPUT: &str = "\
INFO ( default/memory ): Start logging ...
ID     CLASS             SRC_MAC            DST_MAC            VLAN   COS ETYPE  SRC_IP           DST_IP           SRC_PORT  DST_PORT  TCP_FLAGS  PROTOCOL    TOS    PACKETS               FLOWS                 BYTES
0      unknown           00:00:00:00:00:00  00:00:00:00:00:00  0      0   0      202.4.228.250    180.76.5.15      0         0         0          ip          0      24                    0                     34954
0      unknown           00:00:00:00:00:00  00:00:00:00:00:00  0      0   0      180.76.5.15      202.4.228.250    0         0         0          ip          0      31                    0                     2110

For a total of: 2 entries
";

fn flatten(batches: Vec<Batch>) -> Vec<Observation> {
    batches.into_iter().flat_map(|b| b.observations).collect()
}

fn tag<'a>(o: &'a Observation, key: &str) -> &'a str {
    o.tags.get(key).unwrap_or_default()
}

#[tokio::test]
async fn pmacct_dump_becomes_four_observations_per_flow() {
    let (output, mut rx) = Output::channel(16);
    let consumer = Consumer::builder()
        .output(output)
        .batch_period(Duration::from_secs(3600))
        .start()
        .await
        .unwrap();

    let mut pipeline = Pipeline::new(
        LineReader::new(PMACCT_OUTPUT.as_bytes(), 8192),
        Sequencer::system().unwrap(),
        Emitter::new(consumer.connect(), "mel2"),
    );
    let stats = pipeline.run().await.unwrap();
    assert_eq!(stats.lines, 6);
    assert_eq!(stats.records, 2);

    pipeline.into_emitter().into_inner().close();
    let delivered = consumer.shutdown().await.unwrap();
    assert_eq!(delivered.observations, 8);

    let mut batches = Vec::new();
    while let Some(batch) = rx.recv().await {
        batches.push(batch);
    }
    let observations = flatten(batches);
    assert_eq!(observations.len(), 8);

    let first = &observations[..4];
    let fields: Vec<_> = first.iter().map(|o| tag(o, "field")).collect();
    assert_eq!(fields, ["tx_bytes", "rx_bytes", "dest_ip", "src_ip"]);
    assert_eq!(tag(&first[0], "ip"), "202.4.228.250");
    assert_eq!(tag(&first[1], "ip"), "180.76.5.15");
    assert_eq!(first[0].value.as_integer(), Some(34954));
    assert_eq!(first[2].value.as_text(), Some("180.76.5.15"));
    assert_eq!(first[3].value.as_text(), Some("202.4.228.250"));
    assert!(observations
        .iter()
        .all(|o| tag(o, "collection_point") == "mel2" && tag(o, "type") == "ip_traffic"));

    // One timestamp per flow, strictly increasing across flows.
    assert!(first.iter().all(|o| o.timestamp == first[0].timestamp));
    let second = &observations[4..];
    assert!(second.iter().all(|o| o.timestamp == second[0].timestamp));
    assert!(second[0].timestamp > first[0].timestamp);
    assert_eq!(second[0].value.as_integer(), Some(2110));
}

#[test]
fn binary_writes_batches_to_a_file_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("observations.jsonl");

    let mut child = Command::new(env!("CARGO_BIN_EXE_flowvault"))
        .arg("syd1")
        .arg(format!("file://{}", path.display()))
        .args(["--batch-period", "50ms"])
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(PMACCT_OUTPUT.as_bytes())
        .unwrap();
    let status = child.wait().unwrap();
    assert_eq!(status.code(), Some(0));

    let written = std::fs::read_to_string(&path).unwrap();
    let batches: Vec<Batch> = written
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    let observations = flatten(batches);
    assert_eq!(observations.len(), 8);
    assert!(observations
        .iter()
        .all(|o| tag(o, "collection_point") == "syd1"));
}

#[test]
fn binary_rejects_missing_arguments() {
    let status = Command::new(env!("CARGO_BIN_EXE_flowvault"))
        .arg("syd1")
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .unwrap();
    assert_eq!(status.code(), Some(2));
}

#[test]
fn binary_reports_unreachable_backend() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let status = Command::new(env!("CARGO_BIN_EXE_flowvault"))
        .arg("syd1")
        .arg(format!("tcp://{addr}"))
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .unwrap();
    assert_eq!(status.code(), Some(1));
}
