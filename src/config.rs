//! Analysis configuration
//!
//! Every knob has a default matching the biomarker export layout, so a
//! configuration file is optional. Files are JSON; missing fields take defaults.

use crate::decoder::{TextEncoding, DEFAULT_ENCODINGS};
use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Denominator padding for ratio metrics
pub const DEFAULT_EPSILON: f64 = 1e-10;

/// Five bands for each of two hemispheres
pub const MIN_BAND_COLUMNS: usize = 10;

/// P300 latency reported by the table path, in milliseconds
pub const P300_PLACEHOLDER_MS: f64 = 300.0;

/// Decimal places used by the raw-waveform path
pub const WAVEFORM_DECIMALS: u32 = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Added to every ratio denominator
    pub epsilon: f64,
    /// Minimum column count for the band-power layout
    pub min_band_columns: usize,
    /// Constant P300 latency emitted by the table path
    pub p300_placeholder_ms: f64,
    /// Encodings to try, in priority order
    pub encodings: Vec<TextEncoding>,
    /// Round table-path metrics to this many decimals (unrounded when absent)
    pub round_decimals: Option<u32>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
            min_band_columns: MIN_BAND_COLUMNS,
            p300_placeholder_ms: P300_PLACEHOLDER_MS,
            encodings: DEFAULT_ENCODINGS.to_vec(),
            round_decimals: None,
        }
    }
}

impl AnalysisConfig {
    /// Parse a configuration from JSON and validate it
    pub fn from_json(json: &str) -> Result<Self, AnalysisError> {
        let config: Self = serde_json::from_str(json)?;
        config.validated()
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self, AnalysisError> {
        let json = fs::read_to_string(path).map_err(|e| AnalysisError::io(path, e))?;
        Self::from_json(&json)
    }

    /// Check invariants and make sure the encoding chain cannot run dry
    pub fn validated(mut self) -> Result<Self, AnalysisError> {
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(AnalysisError::InvalidConfig(format!(
                "epsilon must be a positive finite number, got {}",
                self.epsilon
            )));
        }

        if self.min_band_columns < MIN_BAND_COLUMNS {
            return Err(AnalysisError::InvalidConfig(format!(
                "min_band_columns must be at least {MIN_BAND_COLUMNS}, got {}",
                self.min_band_columns
            )));
        }

        if !self.p300_placeholder_ms.is_finite() {
            return Err(AnalysisError::InvalidConfig(
                "p300_placeholder_ms must be finite".to_string(),
            ));
        }

        if matches!(self.round_decimals, Some(d) if d > 12) {
            return Err(AnalysisError::InvalidConfig(
                "round_decimals must be at most 12".to_string(),
            ));
        }

        if !self.encodings.iter().any(TextEncoding::is_total) {
            log::debug!("Appending latin1 to the encoding chain");
            self.encodings.push(TextEncoding::Latin1);
        }

        Ok(self)
    }
}
