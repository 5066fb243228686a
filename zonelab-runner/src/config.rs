//! Serializable batch configuration.
//!
//! One TOML file drives a whole run. Every section is optional and falls back
//! to its defaults:
//!
//! ```toml
//! [gap]
//! filter_gap = 0.5
//! show_signal = true
//!
//! [momentum]
//! sensitivity_percent = 28
//! mitigation = "close"
//!
//! [enrichment]
//! dark_alpha_threshold = 0.4
//!
//! [simulation]
//! initial_capital = 100000.0
//! tie_break = "target_first"
//!
//! [batch]
//! max_workers = 4
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use zonelab_core::detectors::{GapConfig, MomentumConfig};
use zonelab_core::engine::SimulatorConfig;
use zonelab_core::enrichment::EnrichmentConfig;
use zonelab_core::pipeline::PipelineConfig;

/// Unique identifier for a batch run (content-addressable hash).
pub type RunId = String;

/// Errors from loading or validating a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    Invalid(#[from] zonelab_core::ConfigError),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Settings that only matter to the batch runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Settle every scheduled exit after the last signal.
    pub settle_scheduled_exits: bool,
    /// Drop sell-direction signals before simulation.
    pub long_only: bool,
    /// Upper bound on loader/pipeline threads.
    pub max_workers: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            settle_scheduled_exits: true,
            long_only: true,
            max_workers: 4,
        }
    }
}

impl BatchConfig {
    pub fn validate(&self) -> Result<(), zonelab_core::ConfigError> {
        if self.max_workers == 0 {
            return Err(zonelab_core::ConfigError::TooSmall {
                field: "batch.max_workers",
                min: 1,
                value: 0,
            });
        }
        Ok(())
    }
}

/// Full configuration for a batch run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    pub gap: GapConfig,
    pub momentum: MomentumConfig,
    pub enrichment: EnrichmentConfig,
    pub simulation: SimulatorConfig,
    pub batch: BatchConfig,
}

impl BacktestConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn validate(&self) -> Result<(), zonelab_core::ConfigError> {
        self.pipeline_config().validate()?;
        self.simulation.validate()?;
        self.batch.validate()
    }

    /// The detector and enrichment sections as a pipeline config.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            gap: self.gap.clone(),
            momentum: self.momentum.clone(),
            enrichment: self.enrichment.clone(),
        }
    }

    /// Computes a deterministic hash ID for this configuration.
    ///
    /// Two runs with identical configs share the same id.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        let json = serde_json::to_string(self)?;
        let hash = blake3::hash(json.as_bytes());
        Ok(hash.to_hex().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zonelab_core::detectors::MitigationMode;
    use zonelab_core::engine::TieBreak;

    #[test]
    fn empty_document_yields_defaults() {
        let config = BacktestConfig::from_toml("").unwrap();
        assert_eq!(config, BacktestConfig::default());
        assert!(config.batch.settle_scheduled_exits);
        assert!(config.batch.long_only);
        assert_eq!(config.batch.max_workers, 4);
    }

    #[test]
    fn sections_override_individual_fields() {
        let config = BacktestConfig::from_toml(
            r#"
[gap]
filter_gap = 0.2
show_signal = true

[momentum]
mitigation = "wick"

[simulation]
tie_break = "stop_first"
force_close_at_end = true

[batch]
max_workers = 2
"#,
        )
        .unwrap();

        assert_eq!(config.gap.filter_gap, 0.2);
        assert!(config.gap.show_signal);
        assert_eq!(config.gap.box_amount, GapConfig::default().box_amount);
        assert_eq!(config.momentum.mitigation, MitigationMode::Wick);
        assert_eq!(config.simulation.tie_break, TieBreak::StopFirst);
        assert!(config.simulation.force_close_at_end);
        assert_eq!(config.simulation.target_pct, 0.07);
        assert_eq!(config.batch.max_workers, 2);
    }

    #[test]
    fn unknown_mitigation_fails_parsing() {
        let err = BacktestConfig::from_toml("[momentum]\nmitigation = \"body\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn invalid_values_fail_validation() {
        let err = BacktestConfig::from_toml("[simulation]\ninitial_capital = -5.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = BacktestConfig::from_toml("[batch]\nmax_workers = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn run_id_is_deterministic_and_config_sensitive() {
        let a = BacktestConfig::default();
        let b = BacktestConfig::default();
        assert_eq!(a.run_id().unwrap(), b.run_id().unwrap());
        assert_eq!(a.run_id().unwrap().len(), 64);

        let mut c = BacktestConfig::default();
        c.simulation.target_pct = 0.05;
        assert_ne!(a.run_id().unwrap(), c.run_id().unwrap());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = BacktestConfig::from_file(Path::new("/nonexistent/zonelab.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/zonelab.toml"));
    }
}
