use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use flowvault::record;
use flowvault::Sequencer;

const PADDED: &str = "0      unknown           00:00:00:00:00:00  00:00:00:00:00:00  0      0   0      202.4.228.250    180.76.5.15      0         0         0          ip          0      24                    0                     34954\n";
const COMPACT: &str = "0 unknown 0 0 0 0 0 10.0.0.1 10.0.0.2 0 0 0 ip 0 1 0 500\n";
const CHATTER: &str = "INFO ( default/memory ): Purging cache - END (PID: 1234, QN: 12/12, ET: 0)\n";

/// Benchmark parsing a single line (hot path)
fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    for (name, line) in [("padded", PADDED), ("compact", COMPACT)] {
        group.bench_with_input(BenchmarkId::from_parameter(name), line, |b, line| {
            b.iter(|| record::parse(black_box(line)));
        });
    }

    group.finish();
}

/// Benchmark the digit prefilter that discards log chatter
fn bench_prefilter(c: &mut Criterion) {
    c.bench_function("prefilter_chatter", |b| {
        b.iter(|| record::starts_with_digit(black_box(CHATTER)));
    });
}

/// Benchmark drawing timestamps from the system clock
fn bench_next_timestamp(c: &mut Criterion) {
    let mut sequencer = match Sequencer::system() {
        Ok(sequencer) => sequencer,
        Err(e) => panic!("system clock unavailable: {e}"),
    };

    c.bench_function("next_timestamp", |b| {
        b.iter(|| black_box(sequencer.next_timestamp()));
    });
}

criterion_group!(benches, bench_parse, bench_prefilter, bench_next_timestamp);
criterion_main!(benches);
