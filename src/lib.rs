//! NeuroTune metrics - offline scoring of biosignal exports
//!
//! Turns an already-recorded biomarker export into a fixed set of normalized
//! psychophysiological indices through a deterministic pipeline:
//! tolerant table loading → column averaging → band-ratio scoring → JSON.
//!
//! ## Ingestion paths
//!
//! - **Table**: a tab-delimited EEG band-power export (plus optional HRV columns)
//! - **Waveform**: four raw traces (two EEG channels, ECG, GSR) scored with
//!   signal-shape heuristics
//!
//! Malformed input never aborts the pipeline; when nothing usable is found the
//! result is the fixed [`NEUTRAL_DEFAULTS`] record.

pub mod config;
pub mod decoder;
pub mod error;
pub mod loader;
pub mod pipeline;
pub mod scoring;
pub mod types;
pub mod waveform;

pub use config::AnalysisConfig;
pub use error::AnalysisError;
pub use loader::{TableLoader, TraceLoader};
pub use pipeline::{biomarkers_to_metrics, AnalysisOutcome, InputFiles, MetricsProcessor, Strategy};
pub use scoring::ScoreCalculator;
pub use types::{CleanTable, MetricResult, MetricSource, NEUTRAL_DEFAULTS};

/// Crate version reported by the CLI
pub const METRICS_VERSION: &str = env!("CARGO_PKG_VERSION");
