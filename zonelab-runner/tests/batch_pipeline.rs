//! Integration tests for the batch runner: CSV files on disk through to
//! trades and artifacts.

use std::fs;
use std::path::{Path, PathBuf};

use zonelab_core::domain::Outcome;
use zonelab_runner::{load_artifacts, run_batch, save_artifacts, BacktestConfig};

/// Gap retest: long entry at 100 on the fourth row, target 107 two rows later.
const RETEST_ROWS: &[&str] = &[
    "01-Mar-2024,100.00,101.00,99.00,100.50",
    "04-Mar-2024,101.00,106.00,100.50,105.50",
    "05-Mar-2024,105.00,108.00,104.00,107.00",
    "06-Mar-2024,106.00,107.00,100.00,101.00",
    "07-Mar-2024,102.00,104.00,102.00,103.50",
    "08-Mar-2024,103.50,108.00,103.00,107.50",
];

fn write_csv(dir: &Path, name: &str, rows: &[&str]) -> PathBuf {
    let mut body = String::from("Date,Open Price,High Price,Low Price,Close Price\n");
    for row in rows {
        body.push_str(row);
        body.push('\n');
    }
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    path
}

fn signal_config() -> BacktestConfig {
    BacktestConfig::from_toml("[gap]\nshow_signal = true\n").unwrap()
}

#[test]
fn csv_file_flows_into_a_winning_trade() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(
        dir.path(),
        "01-03-2024-TO-08-03-2024-ACME-EQ-N.csv",
        RETEST_ROWS,
    );

    let result = run_batch(&[path], &signal_config()).unwrap();

    assert!(result.failures.is_empty());
    assert_eq!(result.securities[0].symbol, "ACME");
    assert_eq!(result.trades.len(), 1);
    let trade = &result.trades[0];
    assert_eq!(trade.security, "ACME");
    assert_eq!(trade.outcome, Outcome::Win);
    assert_eq!(trade.shares, 400);
    assert!((trade.exit_price - 107.0).abs() < 1e-9);
    assert!((result.summary.final_balance - 102_800.0).abs() < 1e-6);
    assert_eq!(result.summary.win_rate, 100.0);
}

#[test]
fn split_files_for_one_security_are_merged() {
    let dir = tempfile::tempdir().unwrap();
    let first = write_csv(
        dir.path(),
        "01-03-2024-TO-07-03-2024-ACME-EQ-N.csv",
        &RETEST_ROWS[..5],
    );
    // Overlaps the first file by two rows.
    let second = write_csv(
        dir.path(),
        "06-03-2024-TO-08-03-2024-ACME-EQ-N.csv",
        &RETEST_ROWS[3..],
    );

    let result = run_batch(&[first, second], &signal_config()).unwrap();

    assert_eq!(result.securities.len(), 1);
    assert_eq!(result.securities[0].bar_count, 6);
    // The retest found in the first file lands on the merged index.
    assert_eq!(result.signals.len(), 1);
    assert_eq!(result.signals[0].bar_index, 3);
    assert_eq!(result.trades.len(), 1);
    assert_eq!(result.trades[0].exit_bar, 5);
}

#[test]
fn bad_files_are_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let good = write_csv(dir.path(), "ACME.csv", RETEST_ROWS);
    let bad = dir.path().join("BROKEN.csv");
    fs::write(&bad, "Date,Open,High,Close\n2024-03-01,1,2,1\n").unwrap();
    let empty = write_csv(dir.path(), "EMPTY.csv", &[]);

    let result = run_batch(&[good, bad, empty], &signal_config()).unwrap();

    assert_eq!(result.failures.len(), 2);
    assert!(result
        .failures
        .iter()
        .any(|f| f.source.ends_with("BROKEN.csv") && f.error.contains("Low")));
    assert!(result
        .failures
        .iter()
        .any(|f| f.source.ends_with("EMPTY.csv")));
    assert_eq!(result.trades.len(), 1);
}

#[test]
fn worker_count_does_not_change_the_result() {
    let dir = tempfile::tempdir().unwrap();
    let paths: Vec<PathBuf> = ["AAA", "BBB", "CCC"]
        .iter()
        .map(|name| write_csv(dir.path(), &format!("{name}.csv"), RETEST_ROWS))
        .collect();

    let mut serial = signal_config();
    serial.batch.max_workers = 1;
    let mut parallel = signal_config();
    parallel.batch.max_workers = 3;

    let a = run_batch(&paths, &serial).unwrap();
    let b = run_batch(&paths, &parallel).unwrap();

    assert_eq!(a.trades, b.trades);
    assert_eq!(a.signals, b.signals);
    assert_eq!(a.summary, b.summary);
    assert_ne!(a.run_id, b.run_id);
}

#[test]
fn artifacts_round_trip_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(dir.path(), "ACME.csv", RETEST_ROWS);
    let result = run_batch(&[path], &signal_config()).unwrap();

    let out = dir.path().join("results");
    let run_dir = save_artifacts(&result, &out).unwrap();
    let loaded = load_artifacts(&run_dir).unwrap();

    assert_eq!(loaded.trades, result.trades);
    assert_eq!(loaded.summary, result.summary);
    let trades_csv = fs::read_to_string(run_dir.join("trades.csv")).unwrap();
    assert_eq!(trades_csv.lines().count(), 2);
}
