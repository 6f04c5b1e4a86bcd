//! Pipeline orchestration
//!
//! This module provides the public API for NeuroTune metrics. It picks an
//! ingestion strategy, runs loader and scorer, and always ends in a complete
//! metric record: either derived from data or the neutral defaults.

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::loader::{TableLoader, TraceLoader};
use crate::scoring::ScoreCalculator;
use crate::types::{MetricResult, MetricSource, NEUTRAL_DEFAULTS};
use crate::waveform::{self, RawSignals};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which input contract is in force for an invocation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Only the fourth file is read, as a combined biomarker table
    #[default]
    Table,
    /// Four independent traces: EEG 1, EEG 2, ECG, GSR
    Raw,
    /// Table first, then raw traces, then defaults
    Auto,
}

/// The four positional input files.
///
/// Under the table strategy only `biomarkers` is read; the others are kept
/// for interface parity with the raw-trace contract, where the fourth file is
/// the GSR trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFiles {
    pub eeg1: PathBuf,
    pub eeg2: PathBuf,
    pub ecg: PathBuf,
    pub biomarkers: PathBuf,
}

/// A metric record together with the path that produced it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisOutcome {
    pub metrics: MetricResult,
    pub source: MetricSource,
}

impl AnalysisOutcome {
    pub fn defaults() -> Self {
        Self {
            metrics: NEUTRAL_DEFAULTS,
            source: MetricSource::Defaults,
        }
    }

    /// Serialize the metric record as a single JSON line
    pub fn to_json(&self) -> Result<String, AnalysisError> {
        serde_json::to_string(&self.metrics)
            .map_err(|e| AnalysisError::SerializationError(e.to_string()))
    }
}

/// Score the biomarker table at `path` with default settings.
///
/// Falls back to neutral defaults when the file yields no usable table.
pub fn biomarkers_to_metrics(path: &Path) -> MetricResult {
    MetricsProcessor::default().process_table(path).metrics
}

/// Processor holding the configured loaders and scorer
#[derive(Debug, Clone)]
pub struct MetricsProcessor {
    config: AnalysisConfig,
    table_loader: TableLoader,
    trace_loader: TraceLoader,
    calculator: ScoreCalculator,
}

impl Default for MetricsProcessor {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}

impl MetricsProcessor {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            table_loader: TableLoader::new(config.encodings.clone()),
            trace_loader: TraceLoader::new(config.encodings.clone()),
            calculator: ScoreCalculator::from_config(&config),
            config,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Run the selected strategy over the input files
    pub fn process(&self, inputs: &InputFiles, strategy: Strategy) -> AnalysisOutcome {
        let outcome = match strategy {
            Strategy::Table => self.process_table(&inputs.biomarkers),
            Strategy::Raw => self.process_waveforms(inputs),
            Strategy::Auto => {
                let table = self.process_table(&inputs.biomarkers);
                if table.source == MetricSource::Table {
                    table
                } else {
                    log::info!("Biomarker table unusable, trying raw traces");
                    self.process_waveforms(inputs)
                }
            }
        };

        log::info!("Metrics computed from {}", outcome.source.as_str());
        outcome
    }

    /// Score the combined biomarker table
    pub fn process_table(&self, path: &Path) -> AnalysisOutcome {
        let table = self.table_loader.load(path);
        if table.is_empty() {
            log::warn!("No data loaded, returning defaults");
            return AnalysisOutcome::defaults();
        }

        match self.calculator.derive(&table) {
            Some(metrics) => {
                let metrics = match self.config.round_decimals {
                    Some(decimals) => metrics.rounded(decimals),
                    None => metrics,
                };
                finish(metrics, MetricSource::Table)
            }
            None => AnalysisOutcome::defaults(),
        }
    }

    /// Score the four raw traces
    pub fn process_waveforms(&self, inputs: &InputFiles) -> AnalysisOutcome {
        let signals = RawSignals {
            eeg1: self.trace_loader.load(&inputs.eeg1),
            eeg2: self.trace_loader.load(&inputs.eeg2),
            ecg: self.trace_loader.load(&inputs.ecg),
            gsr: self.trace_loader.load(&inputs.biomarkers),
        };

        match waveform::derive(&signals) {
            Some(metrics) => finish(metrics, MetricSource::Waveform),
            None => {
                log::warn!("Raw traces incomplete, returning defaults");
                AnalysisOutcome::defaults()
            }
        }
    }
}

/// Replace any non-finite field so the record always serializes to numbers
fn finish(metrics: MetricResult, source: MetricSource) -> AnalysisOutcome {
    let (metrics, replaced) = metrics.sanitized();
    if !replaced.is_empty() {
        log::warn!(
            "Non-finite values replaced with defaults: {}",
            replaced.join(", ")
        );
    }
    AnalysisOutcome { metrics, source }
}
