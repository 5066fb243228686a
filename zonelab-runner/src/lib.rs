//! ZoneLab Runner: batch orchestration over many price files.
//!
//! This crate builds on `zonelab-core` to provide:
//! - TOML configuration with a content-addressed run id
//! - CSV loading with flexible headers and date formats, plus synthetic data
//! - Parallel per-file signal generation, per-security merging and simulation
//! - Trade statistics
//! - JSON / CSV / Markdown artifact export

pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod runner;

pub use config::{BacktestConfig, BatchConfig, ConfigError, RunId};
pub use data_loader::{load_csv, read_bars, security_from_path, synthetic_series, LoadError};
pub use export::{
    export_json, export_signals_csv, export_trades_csv, generate_report, import_json,
    load_artifacts, save_artifacts,
};
pub use metrics::TradeStats;
pub use runner::{
    run_batch, run_batch_on_series, BatchFailure, BatchResult, RunError, SecurityReport,
    SCHEMA_VERSION,
};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<BacktestConfig>();
        assert_sync::<BacktestConfig>();
        assert_send::<BatchConfig>();
        assert_sync::<BatchConfig>();
    }

    #[test]
    fn batch_result_is_send_sync() {
        assert_send::<BatchResult>();
        assert_sync::<BatchResult>();
        assert_send::<BatchFailure>();
        assert_sync::<BatchFailure>();
    }

    #[test]
    fn trade_stats_is_send_sync() {
        assert_send::<TradeStats>();
        assert_sync::<TradeStats>();
    }

    #[test]
    fn errors_are_send_sync() {
        assert_send::<LoadError>();
        assert_sync::<LoadError>();
        assert_send::<RunError>();
        assert_sync::<RunError>();
    }
}
