//! Heuristic scoring from raw EEG, ECG and GSR traces
//!
//! Used when four independent traces are available instead of a band-power
//! table. These are coarse signal-shape proxies, not spectral measures:
//! - theta power: variance and mean amplitude of the averaged EEG
//! - HRV: spread of successive ECG differences
//! - P300 latency: relative position of the largest EEG excursion
//! - GSR level: mean absolute skin conductance
//!
//! All outputs are rounded to four decimals.

use crate::config::WAVEFORM_DECIMALS;
use crate::scoring::sigmoid;
use crate::types::MetricResult;

const THETA_CENTER: f64 = 4.0;
const HRV_CENTER: f64 = 2.0;
const GSR_CENTER: f64 = 2.0;

/// The four raw traces of one recording
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSignals {
    pub eeg1: Vec<f64>,
    pub eeg2: Vec<f64>,
    pub ecg: Vec<f64>,
    pub gsr: Vec<f64>,
}

impl RawSignals {
    /// True when every trace has at least one sample
    pub fn is_complete(&self) -> bool {
        !(self.eeg1.is_empty() || self.eeg2.is_empty() || self.ecg.is_empty() || self.gsr.is_empty())
    }

    /// Sample-wise mean of the two EEG channels over their common length
    pub fn averaged_eeg(&self) -> Vec<f64> {
        self.eeg1
            .iter()
            .zip(&self.eeg2)
            .map(|(a, b)| (a + b) / 2.0)
            .collect()
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

fn mean_abs(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|v| v.abs()).sum::<f64>() / values.len() as f64
}

/// Squash a non-negative magnitude onto (0, 1) on a log scale
fn log_squash(magnitude: f64, center: f64) -> f64 {
    sigmoid(magnitude.max(0.0).ln_1p() - center)
}

/// Theta power proxy from EEG variance and mean amplitude
pub fn theta_power(eeg: &[f64]) -> f64 {
    sigmoid(variance(eeg).ln_1p() + mean_abs(eeg).ln_1p() - THETA_CENTER)
}

/// HRV proxy from the standard deviation of successive ECG differences
pub fn hrv(ecg: &[f64]) -> f64 {
    let diffs: Vec<f64> = ecg.windows(2).map(|w| w[1] - w[0]).collect();
    log_squash(variance(&diffs).sqrt(), HRV_CENTER)
}

/// Position of the peak absolute amplitude, as a fraction of signal length
pub fn p300_latency(eeg: &[f64]) -> f64 {
    let peak = eeg
        .iter()
        .enumerate()
        .fold((0usize, f64::NEG_INFINITY), |best, (i, v)| {
            if v.abs() > best.1 {
                (i, v.abs())
            } else {
                best
            }
        });

    if eeg.is_empty() {
        0.0
    } else {
        peak.0 as f64 / eeg.len() as f64
    }
}

/// Skin conductance level on (0, 1)
pub fn gsr_level(gsr: &[f64]) -> f64 {
    log_squash(mean_abs(gsr), GSR_CENTER)
}

/// Derive metrics from raw traces, `None` when any trace is empty
pub fn derive(signals: &RawSignals) -> Option<MetricResult> {
    if !signals.is_complete() {
        return None;
    }

    let eeg = signals.averaged_eeg();
    let theta = theta_power(&eeg);
    let variability = hrv(&signals.ecg);
    let p300 = p300_latency(&eeg);
    let gsr = gsr_level(&signals.gsr);

    let engagement = 0.5 * theta + 0.3 * variability + 0.2 * (1.0 - p300);
    let arousal = 0.6 * gsr + 0.4 * (1.0 - variability);
    let valence = 0.5 * variability + 0.3 * (1.0 - gsr) + 0.2 * theta;
    let overall_preference = 0.35 * theta + 0.25 * variability + 0.2 * (1.0 - p300) + 0.2 * gsr;

    let metrics = MetricResult {
        theta_power: theta,
        hrv: variability,
        p300_latency: p300,
        engagement,
        arousal,
        valence,
        overall_preference,
        focus: engagement,
        relax: 1.0 - arousal,
        excite: arousal,
        preference: overall_preference,
    };

    Some(metrics.rounded(WAVEFORM_DECIMALS))
}
