use std::fmt::Write as _;
use std::hint::black_box;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use yt_mini_analytics::config::AliasConfig;
use yt_mini_analytics::ingest::{self, ParseOptions, TableCache, Upload};
use yt_mini_analytics::report::{self, AnalysisOptions};

fn generate_export(rows: usize, offset: usize) -> String {
    let mut text = String::from(
        "Date,Video title,Views,Watch time (hours),Average view duration,Impressions,Impressions click-through rate (%),Subscribers\n",
    );
    for i in 0..rows {
        let id = i + offset;
        let title = if id % 4 == 0 {
            format!("Clip {} #shorts", id % 500)
        } else {
            format!("Video {}", id % 500)
        };
        let day = (id % 28) + 1;
        let views = (id * 37) % 10_000;
        let _ = writeln!(
            text,
            "2024-02-{day:02},{title},\"{views}\",{:.1},{},{},{:.1}%,{}",
            views as f64 / 60.0,
            30 + id % 600,
            views * 12,
            (id % 90) as f64 / 10.0,
            id % 7
        );
    }
    text
}

fn bench_pipeline(c: &mut Criterion) {
    let uploads = vec![
        Upload::new("january.csv", generate_export(25_000, 0)),
        Upload::new("february.csv", generate_export(25_000, 25_000)),
    ];
    let options = ParseOptions::default();
    let aliases = AliasConfig::default();
    let analysis = AnalysisOptions::default();

    let mut group = c.benchmark_group("pipeline");

    group.bench_function("ingest_and_analyze", |b| {
        b.iter_batched(
            TableCache::new,
            |mut cache| {
                let outcome = ingest::ingest(&uploads, &options, &mut cache).expect("ingest");
                black_box(report::analyze(outcome, None, &aliases, &analysis));
            },
            BatchSize::SmallInput,
        );
    });

    let mut warm = TableCache::new();
    ingest::ingest(&uploads, &options, &mut warm).expect("warm cache");
    group.bench_function("analyze_cached_uploads", |b| {
        b.iter(|| {
            let outcome = ingest::ingest(&uploads, &options, &mut warm).expect("ingest");
            black_box(report::analyze(outcome, None, &aliases, &analysis));
        });
    });

    group.finish();
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
