//! ZoneLab Core: domain types, order-block detectors, signal enrichment, trade simulation.
//!
//! This crate contains the heart of the signal-to-trade engine:
//! - Domain types (bars, zones, signals, positions, trades, portfolio)
//! - Gap ("FVG") and momentum-reversal ("Sonar") zone detectors
//! - Signal enrichment with a 0..=4 strength score
//! - Trade execution simulator with deferred exit settlement and cash accounting
//!
//! Everything here is single-threaded and caller-owned. Parallel fan-out over
//! many securities lives in `zonelab-runner`.

pub mod config;
pub mod detectors;
pub mod domain;
pub mod engine;
pub mod enrichment;
pub mod indicators;
pub mod pipeline;

pub use config::ConfigError;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: all core types are Send + Sync.
    ///
    /// The runner moves series, detectors and pipeline outputs across rayon
    /// workers. If any type fails this check, the build breaks immediately.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::BarSeries>();
        require_sync::<domain::BarSeries>();
        require_send::<domain::MarketData>();
        require_sync::<domain::MarketData>();
        require_send::<domain::Zone>();
        require_sync::<domain::Zone>();
        require_send::<domain::TouchSignal>();
        require_sync::<domain::TouchSignal>();
        require_send::<domain::EnrichedSignal>();
        require_sync::<domain::EnrichedSignal>();
        require_send::<domain::Position>();
        require_sync::<domain::Position>();
        require_send::<domain::Portfolio>();
        require_sync::<domain::Portfolio>();
        require_send::<domain::TradeRecord>();
        require_sync::<domain::TradeRecord>();

        // Detectors
        require_send::<detectors::GapDetector>();
        require_sync::<detectors::GapDetector>();
        require_send::<detectors::MomentumDetector>();
        require_sync::<detectors::MomentumDetector>();
        require_send::<detectors::Detection>();
        require_sync::<detectors::Detection>();

        // Enrichment + pipeline
        require_send::<enrichment::SignalEnricher>();
        require_sync::<enrichment::SignalEnricher>();
        require_send::<pipeline::SignalPipeline>();
        require_sync::<pipeline::SignalPipeline>();
        require_send::<pipeline::PipelineOutput>();
        require_sync::<pipeline::PipelineOutput>();

        // Engine types
        require_send::<engine::SimulatorConfig>();
        require_sync::<engine::SimulatorConfig>();
        require_send::<engine::TradeSimulator>();
        require_sync::<engine::TradeSimulator>();
        require_send::<engine::SimulationReport>();
        require_sync::<engine::SimulationReport>();
    }

    /// Architecture contract: detectors see bars only, never the portfolio.
    ///
    /// `ZoneDetector::run` takes `&[Bar]` and nothing else. If someone adds
    /// portfolio or simulator state to the signature, this stops compiling.
    #[test]
    fn zone_detector_trait_has_no_portfolio_parameter() {
        fn _check_trait_object_builds(
            det: &dyn detectors::ZoneDetector,
            bars: &[domain::Bar],
        ) -> detectors::Detection {
            det.run(bars)
        }
    }
}
