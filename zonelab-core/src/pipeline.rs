//! Signal pipeline: both detectors plus enrichment over one series.

use crate::config::ConfigError;
use crate::detectors::{
    Detection, GapConfig, GapDetector, MomentumConfig, MomentumDetector, ZoneDetector,
};
use crate::domain::{BarSeries, EnrichedSignal};
use crate::enrichment::{EnrichmentConfig, SignalEnricher};
use serde::{Deserialize, Serialize};

/// Detector and enrichment parameters for one pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub gap: GapConfig,
    pub momentum: MomentumConfig,
    pub enrichment: EnrichmentConfig,
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.gap.validate()?;
        self.momentum.validate()?;
        self.enrichment.validate()
    }
}

/// Everything one series produced: scored signals plus both zone sets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub symbol: String,
    pub signals: Vec<EnrichedSignal>,
    pub gap: Detection,
    pub momentum: Detection,
}

#[derive(Debug, Clone, Default)]
pub struct SignalPipeline {
    gap: GapDetector,
    momentum: MomentumDetector,
    enricher: SignalEnricher,
}

impl SignalPipeline {
    pub fn new(config: &PipelineConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            gap: GapDetector::new(config.gap.clone())?,
            momentum: MomentumDetector::new(config.momentum.clone())?,
            enricher: SignalEnricher::new(config.enrichment.clone())?,
        })
    }

    /// Run both detectors, then score their touches (gap touches first).
    pub fn generate(&self, series: &BarSeries) -> PipelineOutput {
        let gap = ZoneDetector::run(&self.gap, &series.bars);
        let momentum = ZoneDetector::run(&self.momentum, &series.bars);

        let raw: Vec<_> = gap
            .signals
            .iter()
            .chain(&momentum.signals)
            .copied()
            .collect();
        let signals = self.enricher.enrich(&raw, &gap, &momentum, series);

        tracing::debug!(
            symbol = %series.symbol,
            bars = series.len(),
            raw = raw.len(),
            enriched = signals.len(),
            gap_zones = gap.zone_count(),
            momentum_zones = momentum.zone_count(),
            "signals generated"
        );

        PipelineOutput {
            symbol: series.symbol.clone(),
            signals,
            gap,
            momentum,
        }
    }
}
