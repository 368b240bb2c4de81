use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tokio::io::BufReader;

use flowvault::logging::init_logging;
use flowvault::{
    Emitter, ExitStatus, IngestStats, LineReader, Overrides, Pipeline, Sequencer, Settings,
};
use flowvault_sdk::{Consumer, Output};

#[derive(Parser, Debug)]
#[command(name = "flowvault")]
#[command(about = "Ship pmacct flow records from stdin to a time-series telemetry backend")]
struct Args {
    /// Collection point label attached to every observation (e.g. syd1)
    collection_point: String,

    /// Backend endpoint (tcp://host:port or file:///path)
    endpoint: String,

    /// Optional TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// How long observations accumulate before a batch is sent (e.g. "1s", "250ms")
    #[arg(long)]
    batch_period: Option<String>,

    /// Longest input line accepted, newline included; longer lines are skipped
    #[arg(long)]
    max_line_bytes: Option<usize>,

    /// Log filter used when RUST_LOG is unset (e.g. "info", "flowvault=debug")
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> ExitCode {
    // Exits with status 2 on bad usage.
    let args = Args::parse();

    let overrides = Overrides {
        config_file: args.config.clone(),
        batch_period: args.batch_period.clone(),
        max_line_bytes: args.max_line_bytes,
        log_level: args.log_level.clone(),
    };
    let settings = match Settings::load(&overrides) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("flowvault: {e}");
            return ExitStatus::Usage.into();
        }
    };

    if let Err(e) = init_logging(&settings.log_level) {
        eprintln!("flowvault: {e:#}");
        return ExitStatus::Usage.into();
    }

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!(error = %e, "failed to start async runtime");
            return ExitStatus::Transport.into();
        }
    };

    let status = rt.block_on(run(args, settings));
    // A pending stdin read must not hold the process open.
    rt.shutdown_timeout(Duration::from_secs(1));
    status.into()
}

async fn run(args: Args, settings: Settings) -> ExitStatus {
    tracing::info!(
        collection_point = %args.collection_point,
        endpoint = %args.endpoint,
        batch_period = ?settings.batch_period,
        max_line_bytes = settings.max_line_bytes,
        "starting"
    );

    let output = match Output::from_endpoint(&args.endpoint) {
        Ok(output) => output,
        Err(e) => {
            tracing::error!(error = %e, "bad endpoint");
            return ExitStatus::Usage;
        }
    };

    let consumer = match Consumer::builder()
        .output(output)
        .batch_period(settings.batch_period)
        .capacity(settings.channel_capacity)
        .start()
        .await
    {
        Ok(consumer) => consumer,
        Err(e) => {
            tracing::error!(error = %e, "failed to connect to backend");
            return ExitStatus::Transport;
        }
    };

    let sequencer = match Sequencer::system() {
        Ok(sequencer) => sequencer,
        Err(e) => {
            tracing::error!(error = %e, "cannot read the system clock");
            if let Err(e) = consumer.shutdown().await {
                tracing::warn!(error = %e, "consumer shutdown failed");
            }
            return ExitStatus::Clock;
        }
    };

    let lines = LineReader::new(BufReader::new(tokio::io::stdin()), settings.max_line_bytes);
    let emitter = Emitter::new(consumer.connect(), args.collection_point);
    let mut pipeline = Pipeline::new(lines, sequencer, emitter);

    let outcome = pipeline.run().await;
    let stats = pipeline.stats();
    pipeline.into_emitter().into_inner().close();
    let delivered = consumer.shutdown().await;

    log_summary(&stats);

    match (outcome, delivered) {
        (Err(e), _) => {
            tracing::error!(error = %e, "ingest aborted");
            ExitStatus::from(&e)
        }
        (Ok(_), Err(e)) => {
            tracing::error!(error = %e, "final flush failed");
            ExitStatus::Transport
        }
        (Ok(_), Ok(delivered)) => {
            tracing::info!(
                batches = delivered.batches,
                observations = delivered.observations,
                "delivered"
            );
            ExitStatus::Success
        }
    }
}

fn log_summary(stats: &IngestStats) {
    tracing::info!(
        lines = stats.lines,
        records = stats.records,
        skipped = stats.skipped,
        oversized = stats.oversized,
        "ingest finished"
    );
}
