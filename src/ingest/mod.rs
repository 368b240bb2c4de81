//! The ingest loop: lines in, observations out.
//!
//! Each line is read, filtered, parsed, timestamped and emitted before the
//! next one is read. A timestamp is drawn only for lines that parsed, so
//! pmacct's log chatter never consumes one.

mod lines;

pub use lines::{Line, LineReader, DEFAULT_MAX_LINE_BYTES};

use flowvault_sdk::{Transport, TransportError};
use thiserror::Error;
use tokio::io::AsyncBufRead;

use crate::emit::Emitter;
use crate::record;
use crate::sequencer::{Clock, ClockError, Sequencer};

/// A condition that ends an ingest run early.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("clock failure: {0}")]
    Clock(#[from] ClockError),

    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("failed to read input: {0}")]
    Input(#[from] std::io::Error),
}

/// Counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Lines read, of any kind.
    pub lines: u64,
    /// Lines emitted as flows.
    pub records: u64,
    /// Lines that did not start with a digit or did not parse.
    pub skipped: u64,
    /// Lines over the length cap.
    pub oversized: u64,
}

/// Run a whole input through `emitter`, reading lines of at most
/// `max_line_bytes`.
pub async fn run<R, C, T>(
    reader: R,
    sequencer: Sequencer<C>,
    emitter: Emitter<T>,
    max_line_bytes: usize,
) -> Result<IngestStats, IngestError>
where
    R: AsyncBufRead + Unpin,
    C: Clock,
    T: Transport,
{
    Pipeline::new(LineReader::new(reader, max_line_bytes), sequencer, emitter)
        .run()
        .await
}

/// Drives lines from a reader through the parser, the sequencer and an
/// emitter.
#[derive(Debug)]
pub struct Pipeline<R, C, T> {
    lines: LineReader<R>,
    sequencer: Sequencer<C>,
    emitter: Emitter<T>,
    stats: IngestStats,
}

impl<R, C, T> Pipeline<R, C, T>
where
    R: AsyncBufRead + Unpin,
    C: Clock,
    T: Transport,
{
    pub fn new(lines: LineReader<R>, sequencer: Sequencer<C>, emitter: Emitter<T>) -> Self {
        Self {
            lines,
            sequencer,
            emitter,
            stats: IngestStats::default(),
        }
    }

    pub fn stats(&self) -> IngestStats {
        self.stats
    }

    pub fn sequencer(&self) -> &Sequencer<C> {
        &self.sequencer
    }

    /// Hand back the emitter so its transport can be closed.
    pub fn into_emitter(self) -> Emitter<T> {
        self.emitter
    }

    /// Process lines until the input ends or a fatal error occurs.
    ///
    /// Counters stay readable through [`stats`](Self::stats) either way.
    pub async fn run(&mut self) -> Result<IngestStats, IngestError> {
        while let Some(line) = self.lines.next_line().await? {
            self.stats.lines += 1;
            self.process(line).await?;
        }
        Ok(self.stats)
    }

    async fn process(&mut self, line: Line) -> Result<(), IngestError> {
        let text = match line {
            Line::Complete(text) => text,
            Line::Oversized { len } => {
                tracing::debug!(len, "skipping oversized line");
                self.stats.oversized += 1;
                return Ok(());
            }
        };

        if !record::starts_with_digit(&text) {
            tracing::trace!(line = %text.trim_end(), "skipping non-record line");
            self.stats.skipped += 1;
            return Ok(());
        }

        let flow = match record::parse(&text) {
            Ok(flow) => flow,
            Err(err) => {
                tracing::trace!(line = %text.trim_end(), error = %err, "skipping unparseable line");
                self.stats.skipped += 1;
                return Ok(());
            }
        };

        let timestamp = self.sequencer.next_timestamp()?;
        self.emitter.emit(&flow, timestamp).await?;
        self.stats.records += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::testing::RecordingTransport;
    use crate::sequencer::testing::ScriptedClock;

    const FLOW_A: &str = "0 unknown 00:00:00:00:00:00 00:00:00:00:00:00 0 0 0 202.4.228.250 180.76.5.15 0 0 0 ip 0 24 0 34954\n";
    const FLOW_B: &str = "1 unknown 00:00:00:00:00:00 00:00:00:00:00:00 0 0 0 10.1.1.1 10.2.2.2 0 0 0 ip 0 2 0 120\n";

    fn pipeline<'a>(
        input: &'a str,
        clock: ScriptedClock,
        transport: RecordingTransport,
    ) -> Pipeline<&'a [u8], ScriptedClock, RecordingTransport> {
        Pipeline::new(
            LineReader::new(input.as_bytes(), DEFAULT_MAX_LINE_BYTES),
            Sequencer::new(clock).unwrap(),
            Emitter::new(transport, "syd1"),
        )
    }

    #[tokio::test]
    async fn emits_each_record_at_its_own_timestamp() {
        let input = format!("{FLOW_A}{FLOW_B}");
        let mut p = pipeline(&input, ScriptedClock::new([100, 100, 100]), RecordingTransport::default());

        let stats = p.run().await.unwrap();
        assert_eq!(stats.records, 2);

        let sent = p.into_emitter().into_inner().sent;
        assert_eq!(sent.len(), 8);
        assert!(sent[..4].iter().all(|o| o.timestamp.as_nanos() == 101));
        assert!(sent[4..].iter().all(|o| o.timestamp.as_nanos() == 102));
    }

    #[tokio::test]
    async fn noise_does_not_consume_timestamps() {
        let input = format!(
            "INFO ( default/memory ): Purging cache - START\n\
             ID CLASS SRC_MAC DST_MAC\n\
             42 too short\n\
             {FLOW_A}\
             7 unknown 0 0 0 0 0 1.1.1.1 2.2.2.2 0 0 0 ip 0 1 0 many\n"
        );
        let mut p = pipeline(&input, ScriptedClock::new([500]), RecordingTransport::default());

        let stats = p.run().await.unwrap();
        assert_eq!(
            stats,
            IngestStats {
                lines: 5,
                records: 1,
                skipped: 4,
                oversized: 0,
            }
        );
        // Seeded at 500, exactly one timestamp drawn.
        assert_eq!(p.sequencer().last().as_nanos(), 501);
    }

    #[tokio::test]
    async fn oversized_lines_are_counted_and_skipped() {
        let long = format!("9 {}\n", "x ".repeat(DEFAULT_MAX_LINE_BYTES));
        let input = format!("{long}{FLOW_B}");
        let mut p = pipeline(&input, ScriptedClock::new([1, 2]), RecordingTransport::default());

        let stats = p.run().await.unwrap();
        assert_eq!(stats.oversized, 1);
        assert_eq!(stats.records, 1);
    }

    #[tokio::test]
    async fn transport_failure_stops_the_run() {
        let input = format!("{FLOW_A}{FLOW_B}{FLOW_A}");
        // Fail on the second record's first send.
        let mut p = pipeline(&input, ScriptedClock::new([1, 2, 3, 4]), RecordingTransport::failing_at(4));

        let err = p.run().await.unwrap_err();
        assert!(matches!(err, IngestError::Transport(_)));
        assert_eq!(p.stats().records, 1);
        assert_eq!(p.stats().lines, 2);
        assert_eq!(p.into_emitter().into_inner().sent.len(), 4);
    }

    #[tokio::test]
    async fn clock_failure_stops_the_run() {
        let input = format!("{FLOW_A}{FLOW_B}");
        let mut p = pipeline(&input, ScriptedClock::failing_after([1, 2]), RecordingTransport::default());

        let err = p.run().await.unwrap_err();
        assert!(matches!(err, IngestError::Clock(_)));
        assert_eq!(p.stats().records, 1);
    }

    #[tokio::test]
    async fn run_reads_the_whole_input() {
        let input = format!("{FLOW_A}garbage\n{FLOW_B}");
        let emitter = Emitter::new(RecordingTransport::default(), "syd1");
        let sequencer = Sequencer::new(ScriptedClock::new([10, 20, 30])).unwrap();

        let stats = run(input.as_bytes(), sequencer, emitter, 95).await.unwrap();
        // FLOW_A is 100 bytes, FLOW_B 89.
        assert_eq!(stats.oversized, 1);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.records, 1);
    }

    #[tokio::test]
    async fn empty_input_is_a_clean_run() {
        let mut p = pipeline("", ScriptedClock::new([1]), RecordingTransport::default());
        assert_eq!(p.run().await.unwrap(), IngestStats::default());
    }

    #[tokio::test]
    async fn read_error_stops_the_run_as_input_failure() {
        let reader = tokio::io::BufReader::new(
            tokio_test::io::Builder::new()
                .read(FLOW_A.as_bytes())
                .read_error(std::io::Error::other("stdin went away"))
                .build(),
        );
        let mut p = Pipeline::new(
            LineReader::new(reader, DEFAULT_MAX_LINE_BYTES),
            Sequencer::new(ScriptedClock::new([1, 2])).unwrap(),
            Emitter::new(RecordingTransport::default(), "syd1"),
        );

        let err = p.run().await.unwrap_err();
        assert!(matches!(err, IngestError::Input(_)));
        assert_eq!(crate::ExitStatus::from(&err), crate::ExitStatus::Input);
        assert_eq!(p.stats().records, 1);
        assert_eq!(p.into_emitter().into_inner().sent.len(), 4);
    }
}
