//! Reporting and export: JSON, CSV, and Markdown artifact generation.
//!
//! - **JSON**: full round-trip serialization of a `BatchResult` with schema
//!   versioning
//! - **CSV**: the trade ledger and the enriched signal list
//! - **Markdown**: a short human-readable run summary
//!
//! Persisted results carry a `schema_version`; newer versions are rejected
//! on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use zonelab_core::domain::{EnrichedSignal, TradeRecord};

use crate::runner::{BatchResult, SCHEMA_VERSION};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn fmt_ts(ts: Option<NaiveDateTime>) -> String {
    ts.map(|t| t.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_default()
}

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `BatchResult` to pretty JSON.
pub fn export_json(result: &BatchResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BatchResult to JSON")
}

/// Deserialize a `BatchResult` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BatchResult> {
    let result: BatchResult =
        serde_json::from_str(json).context("failed to deserialize BatchResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export the completed-trade ledger as CSV.
///
/// Columns: security, side, strength, entry_bar, entry_time, entry_price,
/// exit_bar, exit_time, exit_price, outcome, shares, capital_allocated, pnl,
/// cash_before, cash_after, holding_days
pub fn export_trades_csv(trades: &[TradeRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "security",
        "side",
        "strength",
        "entry_bar",
        "entry_time",
        "entry_price",
        "exit_bar",
        "exit_time",
        "exit_price",
        "outcome",
        "shares",
        "capital_allocated",
        "pnl",
        "cash_before",
        "cash_after",
        "holding_days",
    ])?;

    for t in trades {
        let holding_days = t
            .holding_period()
            .map(|d| d.num_days().to_string())
            .unwrap_or_default();
        wtr.write_record([
            t.security.clone(),
            t.side.as_str().to_string(),
            t.strength.to_string(),
            t.entry_bar.to_string(),
            fmt_ts(t.entry_timestamp),
            format!("{:.6}", t.entry_price),
            t.exit_bar.to_string(),
            fmt_ts(Some(t.exit_timestamp)),
            format!("{:.6}", t.exit_price),
            t.outcome.as_str().to_string(),
            t.shares.to_string(),
            format!("{:.2}", t.capital_allocated),
            format!("{:.2}", t.pnl),
            format!("{:.2}", t.cash_before),
            format!("{:.2}", t.cash_after),
            holding_days,
        ])?;
    }

    into_string(wtr)
}

/// Export enriched signals as CSV.
///
/// Columns: security, time, bar_index, price, direction, source,
/// in_gap_zone, in_momentum_zone, zone_alpha, strength
pub fn export_signals_csv(signals: &[EnrichedSignal]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "security",
        "time",
        "bar_index",
        "price",
        "direction",
        "source",
        "in_gap_zone",
        "in_momentum_zone",
        "zone_alpha",
        "strength",
    ])?;

    for s in signals {
        wtr.write_record([
            s.symbol.clone(),
            fmt_ts(s.timestamp),
            s.bar_index.to_string(),
            format!("{:.6}", s.price),
            s.direction.as_str().to_string(),
            s.source.as_str().to_string(),
            s.inside_gap_zone.to_string(),
            s.inside_momentum_zone.to_string(),
            s.zone_alpha.map(|a| format!("{a:.4}")).unwrap_or_default(),
            s.strength.to_string(),
        ])?;
    }

    into_string(wtr)
}

fn into_string(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = wtr.into_inner().context("CSV writer did not flush")?;
    Ok(String::from_utf8(bytes)?)
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a batch run.
///
/// Creates `{run_id prefix}_{timestamp}/` under `output_dir` containing
/// `result.json`, `trades.csv`, `signals.csv` and `report.md`. Returns the
/// created directory.
pub fn save_artifacts(result: &BatchResult, output_dir: &Path) -> Result<PathBuf> {
    let prefix: String = result.run_id.chars().take(12).collect();
    let dirname = format!(
        "{}_{}",
        prefix,
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let write = |name: &str, contents: String| -> Result<()> {
        let path = run_dir.join(name);
        std::fs::write(&path, contents)
            .with_context(|| format!("failed to write {}", path.display()))
    };
    write("result.json", export_json(result)?)?;
    write("trades.csv", export_trades_csv(&result.trades)?)?;
    write("signals.csv", export_signals_csv(&result.signals)?)?;
    write("report.md", generate_report(result))?;

    Ok(run_dir)
}

/// Load a `BatchResult` from an artifact directory's result.json.
pub fn load_artifacts(dir: &Path) -> Result<BatchResult> {
    let path = dir.join("result.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

// ─── Markdown report ────────────────────────────────────────────────

/// Generate a Markdown summary of a batch run.
pub fn generate_report(result: &BatchResult) -> String {
    let mut md = String::with_capacity(2048);
    let s = &result.summary;
    let stats = &result.stats;

    md.push_str("# ZoneLab Run Report\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Run ID | {} |\n", result.run_id));
    md.push_str(&format!("| Securities | {} |\n", result.securities.len()));
    md.push_str(&format!("| Signals | {} |\n", result.signals.len()));
    if result.synthetic {
        md.push_str("| Data | **SYNTHETIC** |\n");
    }
    md.push('\n');

    md.push_str("## Performance Summary\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Initial Capital | {:.2} |\n", s.initial_capital));
    md.push_str(&format!("| Final Balance | {:.2} |\n", s.final_balance));
    md.push_str(&format!("| Final P&L | {:.2} |\n", s.final_pnl));
    md.push_str(&format!("| Trades | {} |\n", s.num_trades));
    md.push_str(&format!("| Wins / Losses | {} / {} |\n", s.wins, s.losses));
    md.push_str(&format!("| Win Rate | {:.1}% |\n", s.win_rate));
    md.push_str(&format!(
        "| Max Winning / Losing Streak | {} / {} |\n",
        s.max_winning_streak, s.max_losing_streak
    ));
    md.push_str(&format!("| Avg P&L per Trade | {:.2} |\n", stats.average_pnl));
    md.push_str(&format!(
        "| Avg Return per Trade | {:.2}% |\n",
        stats.average_return_pct
    ));
    md.push_str(&format!(
        "| Return on Allocated | {:.2}% |\n",
        stats.return_on_allocated_pct
    ));
    md.push_str(&format!(
        "| Avg Holding | {:.1} days |\n",
        stats.average_holding_days
    ));
    md.push_str(&format!("| Avg Bars Held | {:.1} |\n", stats.average_bars_held));
    md.push_str(&format!("| Profit Factor | {:.2} |\n", stats.profit_factor));
    md.push_str(&format!(
        "| Open Positions | {} |\n",
        result.open_positions.len()
    ));
    md.push('\n');

    if !result.securities.is_empty() {
        md.push_str("## Securities\n\n");
        md.push_str("| Security | Bars | Signals | Gap Zones | Momentum Zones |\n");
        md.push_str("| --- | --- | --- | --- | --- |\n");
        for sec in &result.securities {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                sec.symbol,
                sec.bar_count,
                sec.signal_count,
                sec.gap_zone_count,
                sec.momentum_zone_count
            ));
        }
        md.push('\n');
    }

    if !result.failures.is_empty() || !result.force_close_failures.is_empty() {
        md.push_str("## Failures\n\n");
        for f in &result.failures {
            md.push_str(&format!("- `{}`: {}\n", f.source, f.error));
        }
        for f in &result.force_close_failures {
            md.push_str(&format!("- force close: {f}\n"));
        }
        md.push('\n');
    }

    md
}
