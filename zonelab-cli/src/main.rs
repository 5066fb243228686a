//! ZoneLab CLI: batch runs, signal listings and zone dumps.
//!
//! Commands:
//! - `run`: load price files, generate signals, simulate trades, save artifacts
//! - `signals`: list the enriched signals for one file
//! - `zones`: list the surviving zones of both detectors for one file
//!
//! Logging goes to stderr through `tracing`; set `RUST_LOG` to adjust
//! (default `info`).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use zonelab_core::domain::{EnrichedSignal, Zone};
use zonelab_core::pipeline::SignalPipeline;
use zonelab_runner::{
    load_csv, run_batch, run_batch_on_series, save_artifacts, synthetic_series, BacktestConfig,
    BatchResult,
};

#[derive(Parser)]
#[command(
    name = "zonelab",
    about = "ZoneLab CLI: order-block signals and trade simulation"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline over one or more CSV files.
    Run {
        /// Path to a TOML config file. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory for result artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Close positions still open at the end at their last close.
        #[arg(long, default_value_t = false)]
        force_close: bool,

        /// Ignore FILES and run on this many bars of synthetic data.
        #[arg(long)]
        synthetic: Option<usize>,

        /// Seed for --synthetic.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Price files (CSV).
        #[arg(required_unless_present = "synthetic")]
        files: Vec<PathBuf>,
    },
    /// List enriched signals for one CSV file.
    Signals {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Price file (CSV).
        file: PathBuf,
    },
    /// List surviving zones for one CSV file.
    Zones {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Price file (CSV).
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            output_dir,
            force_close,
            synthetic,
            seed,
            files,
        } => run_cmd(
            config.as_deref(),
            &output_dir,
            force_close,
            synthetic,
            seed,
            &files,
        ),
        Commands::Signals { config, json, file } => signals_cmd(config.as_deref(), json, &file),
        Commands::Zones { config, json, file } => zones_cmd(config.as_deref(), json, &file),
    }
}

fn load_config(path: Option<&Path>) -> Result<BacktestConfig> {
    match path {
        Some(p) => BacktestConfig::from_file(p)
            .with_context(|| format!("failed to load config {}", p.display())),
        None => Ok(BacktestConfig::default()),
    }
}

fn run_cmd(
    config_path: Option<&Path>,
    output_dir: &Path,
    force_close: bool,
    synthetic: Option<usize>,
    seed: u64,
    files: &[PathBuf],
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if force_close {
        config.simulation.force_close_at_end = true;
    }

    let result = match synthetic {
        Some(bars) => {
            tracing::warn!("running on synthetic data; results are not meaningful");
            let series = vec![synthetic_series("SYNTH", bars, seed)];
            run_batch_on_series(series, &config, true)?
        }
        None => run_batch(files, &config)?,
    };

    print_summary(&result);

    let run_dir = save_artifacts(&result, output_dir)?;
    println!("Artifacts saved to: {}", run_dir.display());

    Ok(())
}

fn signals_cmd(config_path: Option<&Path>, json: bool, file: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let series = load_csv(file)?;
    let pipeline = SignalPipeline::new(&config.pipeline_config())?;
    let output = pipeline.generate(&series);

    if json {
        println!("{}", serde_json::to_string_pretty(&output.signals)?);
        return Ok(());
    }

    println!("{}: {} bars, {} signals", series.symbol, series.len(), output.signals.len());
    println!(
        "{:<20} {:>6} {:>12} {:<5} {:<9} {:>5} {:>5} {:>6} {:>3}",
        "Time", "Bar", "Price", "Dir", "Source", "Gap", "Mom", "Alpha", "Str"
    );
    println!("{}", "-".repeat(82));
    for s in &output.signals {
        print_signal_row(s);
    }
    Ok(())
}

fn print_signal_row(s: &EnrichedSignal) {
    let time = s
        .timestamp
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default();
    let alpha = s.zone_alpha.map(|a| format!("{a:.2}")).unwrap_or_default();
    println!(
        "{:<20} {:>6} {:>12.4} {:<5} {:<9} {:>5} {:>5} {:>6} {:>3}",
        time,
        s.bar_index,
        s.price,
        s.direction.as_str(),
        s.source.as_str(),
        s.inside_gap_zone,
        s.inside_momentum_zone,
        alpha,
        s.strength
    );
}

fn zones_cmd(config_path: Option<&Path>, json: bool, file: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let series = load_csv(file)?;
    let pipeline = SignalPipeline::new(&config.pipeline_config())?;
    let output = pipeline.generate(&series);

    if json {
        let body = serde_json::json!({
            "symbol": series.symbol,
            "gap": output.gap,
            "momentum": output.momentum,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    println!("{}: {} bars", series.symbol, series.len());
    let sections = [
        ("Gap bullish", &output.gap.bullish),
        ("Gap bearish", &output.gap.bearish),
        ("Gap imbalance", &output.gap.temporary),
        ("Momentum bullish", &output.momentum.bullish),
        ("Momentum bearish", &output.momentum.bearish),
    ];
    for (title, zones) in sections {
        println!();
        println!("{title} ({})", zones.len());
        for zone in zones {
            print_zone_row(zone);
        }
    }
    Ok(())
}

fn print_zone_row(z: &Zone) {
    println!(
        "  [{:>6} .. {:>6}] {:>12.4} .. {:<12.4} height {:<10.4} alpha {:.2}{}",
        z.left,
        z.right,
        z.bottom,
        z.top,
        z.height(),
        z.alpha,
        if z.broken { " (broken)" } else { "" }
    );
}

fn print_summary(result: &BatchResult) {
    let s = &result.summary;
    println!();
    println!("=== Batch Result ===");
    println!("Run ID:         {}", result.run_id);
    println!("Securities:     {}", result.securities.len());
    println!("Signals:        {}", result.signals.len());
    println!("Trades:         {}", s.num_trades);
    println!("Open positions: {}", result.open_positions.len());
    println!();
    println!("--- Performance ---");
    println!("Initial:        {:.2}", s.initial_capital);
    println!("Final balance:  {:.2}", s.final_balance);
    println!("Final P&L:      {:.2}", s.final_pnl);
    println!("Win Rate:       {:.1}%", s.win_rate);
    println!("Wins/Losses:    {}/{}", s.wins, s.losses);
    println!(
        "Max Streaks:    {} win / {} loss",
        s.max_winning_streak, s.max_losing_streak
    );
    println!("Avg P&L:        {:.2}", result.stats.average_pnl);
    println!("Avg Return:     {:.2}%", result.stats.average_return_pct);
    println!("Avg Holding:    {:.1} days", result.stats.average_holding_days);
    if result.synthetic {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
    for f in &result.failures {
        println!("WARNING: skipped {}: {}", f.source, f.error);
    }
    for f in &result.force_close_failures {
        println!("WARNING: {f}");
    }
}
