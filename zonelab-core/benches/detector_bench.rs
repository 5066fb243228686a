//! Criterion benchmarks for ZoneLab hot paths.
//!
//! Benchmarks:
//! 1. Gap detector forward pass
//! 2. Momentum detector forward pass
//! 3. Full signal pipeline (both detectors + enrichment)
//! 4. Trade simulation over the pipeline's signals

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use zonelab_core::detectors::{GapConfig, GapDetector, MomentumDetector};
use zonelab_core::domain::{Bar, BarSeries, MarketData};
use zonelab_core::engine::{simulate, SimulatorConfig};
use zonelab_core::pipeline::{PipelineConfig, SignalPipeline};

// ── Helpers ──────────────────────────────────────────────────────────

/// Deterministic oscillating series with periodic gaps.
fn make_bars(n: usize) -> Vec<Bar> {
    let base = chrono::NaiveDate::from_ymd_opt(2015, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    (0..n)
        .map(|i| {
            let drift = if i % 37 == 0 { 3.0 } else { 0.0 };
            let close = 100.0 + (i as f64 * 0.07).sin() * 12.0 + drift;
            let open = close - (i as f64 * 0.31).cos() * 0.8;
            Bar {
                timestamp: base + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 0.9,
                low: open.min(close) - 0.9,
                close,
            }
        })
        .collect()
}

fn signal_config() -> PipelineConfig {
    PipelineConfig {
        gap: GapConfig {
            show_signal: true,
            filter_gap: 0.2,
            ..GapConfig::default()
        },
        ..PipelineConfig::default()
    }
}

// ── Benchmarks ───────────────────────────────────────────────────────

fn bench_detectors(c: &mut Criterion) {
    let mut group = c.benchmark_group("detectors");
    let gap = GapDetector::new(signal_config().gap).unwrap();
    let momentum = MomentumDetector::default();

    for n in [1_000usize, 5_000, 20_000] {
        let bars = make_bars(n);
        group.bench_with_input(BenchmarkId::new("gap", n), &bars, |b, bars| {
            b.iter(|| gap.run(black_box(bars)))
        });
        group.bench_with_input(BenchmarkId::new("momentum", n), &bars, |b, bars| {
            b.iter(|| momentum.run(black_box(bars)))
        });
    }
    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let pipeline = SignalPipeline::new(&signal_config()).unwrap();
    let series = BarSeries::new("BENCH", make_bars(5_000));

    c.bench_function("pipeline_5000", |b| {
        b.iter(|| pipeline.generate(black_box(&series)))
    });
}

fn bench_simulation(c: &mut Criterion) {
    let pipeline = SignalPipeline::new(&signal_config()).unwrap();
    let series = BarSeries::new("BENCH", make_bars(5_000));
    let signals = pipeline.generate(&series).signals;
    let market = MarketData::from(series);

    c.bench_function("simulate_5000", |b| {
        b.iter(|| simulate(SimulatorConfig::default(), black_box(&signals), &market))
    });
}

criterion_group!(benches, bench_detectors, bench_pipeline, bench_simulation);
criterion_main!(benches);
