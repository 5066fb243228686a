//! Batch runner: wires together loading, the signal pipeline and the
//! simulator.
//!
//! Two entry points:
//! - `run_batch()`: loads CSV files, then runs. Used by the CLI.
//! - `run_batch_on_series()`: takes pre-built series. Used by the synthetic
//!   mode and tests.
//!
//! Loading and signal generation fan out over a private rayon pool, one job
//! per input. Merging and simulation then run on the calling thread, so the
//! result is identical for any worker count.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use zonelab_core::domain::{
    BarSeries, Direction, EnrichedSignal, MarketData, Position, SignalSource, TradeRecord,
};
use zonelab_core::engine::{ForceCloseError, TradeSimulator, TradeSummary};
use zonelab_core::pipeline::{PipelineOutput, SignalPipeline};

use crate::config::{BacktestConfig, ConfigError, RunId};
use crate::data_loader::{load_csv, sort_and_dedup, LoadError};
use crate::metrics::TradeStats;

/// Errors that abort a whole batch. Per-input problems become
/// [`BatchFailure`]s instead.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid config: {0}")]
    Invalid(#[from] zonelab_core::ConfigError),
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// An input that was excluded from the batch, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchFailure {
    pub source: String,
    pub error: String,
}

/// Per-security counts after merging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityReport {
    pub symbol: String,
    pub bar_count: usize,
    pub signal_count: usize,
    pub gap_zone_count: usize,
    pub momentum_zone_count: usize,
}

/// Complete result of one batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub config: BacktestConfig,
    pub securities: Vec<SecurityReport>,
    /// Every enriched signal, including zero-strength and sell signals.
    pub signals: Vec<EnrichedSignal>,
    pub trades: Vec<TradeRecord>,
    pub open_positions: Vec<Position>,
    pub summary: TradeSummary,
    pub stats: TradeStats,
    pub failures: Vec<BatchFailure>,
    pub force_close_failures: Vec<ForceCloseError>,
    pub synthetic: bool,
}

/// Default schema version for serde deserialization of older JSON without the field.
fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// One loaded input with its pipeline output.
struct Generated {
    series: BarSeries,
    output: PipelineOutput,
}

/// Load every file and run the batch.
///
/// Unreadable or malformed files are reported in `BatchResult::failures` and
/// skipped; the rest proceed.
pub fn run_batch(paths: &[PathBuf], config: &BacktestConfig) -> Result<BatchResult, RunError> {
    let pipeline = SignalPipeline::new(&config.pipeline_config())?;
    info!(files = paths.len(), "loading inputs");

    let loaded: Vec<(String, Result<Generated, LoadError>)> =
        with_pool(paths.len(), config.batch.max_workers, || {
            paths
                .par_iter()
                .map(|path| (path.display().to_string(), generate_from_file(path, &pipeline)))
                .collect()
        })?;

    let mut generated = Vec::with_capacity(loaded.len());
    let mut failures = Vec::new();
    for (source, result) in loaded {
        match result {
            Ok(g) => generated.push(g),
            Err(e) => {
                warn!(source = %source, error = %e, "input excluded from batch");
                failures.push(BatchFailure {
                    source,
                    error: e.to_string(),
                });
            }
        }
    }

    assemble(generated, failures, config, false)
}

/// Run the batch over series that are already in memory.
pub fn run_batch_on_series(
    series: Vec<BarSeries>,
    config: &BacktestConfig,
    synthetic: bool,
) -> Result<BatchResult, RunError> {
    let pipeline = SignalPipeline::new(&config.pipeline_config())?;

    let generated: Vec<Generated> = with_pool(series.len(), config.batch.max_workers, || {
        series
            .into_par_iter()
            .map(|series| {
                let output = pipeline.generate(&series);
                Generated { series, output }
            })
            .collect()
    })?;

    assemble(generated, Vec::new(), config, synthetic)
}

/// Run `job` on a private pool of `min(jobs, max_workers)` threads.
fn with_pool<T, F>(jobs: usize, max_workers: usize, job: F) -> Result<T, RunError>
where
    T: Send,
    F: FnOnce() -> T + Send,
{
    let threads = jobs.min(max_workers).max(1);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()?;
    Ok(pool.install(job))
}

fn generate_from_file(path: &Path, pipeline: &SignalPipeline) -> Result<Generated, LoadError> {
    let series = load_csv(path)?;
    let output = pipeline.generate(&series);
    debug!(
        symbol = %series.symbol,
        bars = series.len(),
        signals = output.signals.len(),
        "generated signals"
    );
    Ok(Generated { series, output })
}

/// Merge by security, re-index signals, simulate and package the result.
fn assemble(
    generated: Vec<Generated>,
    failures: Vec<BatchFailure>,
    config: &BacktestConfig,
    synthetic: bool,
) -> Result<BatchResult, RunError> {
    let run_id = config.run_id()?;

    // Group inputs by security, keeping input order within a group.
    let mut groups: BTreeMap<String, Vec<Generated>> = BTreeMap::new();
    for g in generated {
        groups.entry(g.series.symbol.clone()).or_default().push(g);
    }

    let mut market = MarketData::new();
    let mut securities = Vec::with_capacity(groups.len());
    let mut signals = Vec::new();

    for (symbol, parts) in groups {
        let (merged, mut merged_signals, gap_zones, momentum_zones) = if parts.len() == 1 {
            let mut parts = parts;
            let Some(only) = parts.pop() else { continue };
            let gap = only.output.gap.zone_count();
            let momentum = only.output.momentum.zone_count();
            (only.series, only.output.signals, gap, momentum)
        } else {
            merge_parts(&symbol, parts)
        };

        securities.push(SecurityReport {
            symbol: symbol.clone(),
            bar_count: merged.len(),
            signal_count: merged_signals.len(),
            gap_zone_count: gap_zones,
            momentum_zone_count: momentum_zones,
        });
        signals.append(&mut merged_signals);
        market.insert(merged);
    }

    signals.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });

    let tradable: Vec<EnrichedSignal> = signals
        .iter()
        .filter(|s| s.strength > 0)
        .filter(|s| !config.batch.long_only || s.is_buy())
        .cloned()
        .collect();
    info!(
        securities = market.len(),
        signals = signals.len(),
        tradable = tradable.len(),
        "simulating"
    );

    let mut sim = TradeSimulator::new(config.simulation.clone())?;
    sim.run(&tradable, &market);
    if config.batch.settle_scheduled_exits {
        sim.settle_scheduled_exits();
    }
    let report = sim.report();
    let stats = TradeStats::compute(&report.trades);

    info!(
        trades = report.trades.len(),
        open = report.open_positions.len(),
        final_balance = report.summary.final_balance,
        failures = failures.len(),
        "batch complete"
    );

    Ok(BatchResult {
        schema_version: SCHEMA_VERSION,
        run_id,
        config: config.clone(),
        securities,
        signals,
        trades: report.trades,
        open_positions: report.open_positions,
        summary: report.summary,
        stats,
        failures,
        force_close_failures: report.force_close_failures,
        synthetic,
    })
}

/// Concatenate several inputs of one security into a single series and move
/// their signals onto it.
///
/// Bars are de-duplicated by timestamp keeping the first input's bar. Signals
/// are re-indexed by timestamp; a signal whose bar no longer exists, or that
/// repeats one already kept, is dropped. Zone counts are summed over the
/// per-input passes the signals came from.
fn merge_parts(
    symbol: &str,
    parts: Vec<Generated>,
) -> (BarSeries, Vec<EnrichedSignal>, usize, usize) {
    let bars = parts
        .iter()
        .flat_map(|p| p.series.bars.iter().cloned())
        .collect();
    let merged = BarSeries::new(symbol, sort_and_dedup(bars));
    let gap_zones = parts.iter().map(|p| p.output.gap.zone_count()).sum();
    let momentum_zones = parts.iter().map(|p| p.output.momentum.zone_count()).sum();

    let mut seen: HashSet<(usize, Direction, SignalSource, u64)> = HashSet::new();
    let mut signals = Vec::new();
    for signal in parts.into_iter().flat_map(|p| p.output.signals) {
        let Some(index) = signal.timestamp.and_then(|ts| merged.index_of(ts)) else {
            debug!(symbol, "signal bar missing from merged series, dropped");
            continue;
        };
        let key = (index, signal.direction, signal.source, signal.price.to_bits());
        if !seen.insert(key) {
            continue;
        }
        signals.push(EnrichedSignal {
            bar_index: index,
            ..signal
        });
    }

    (merged, signals, gap_zones, momentum_zones)
}
