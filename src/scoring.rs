//! Score derivation from averaged band powers
//!
//! Column layout of a biomarker table (time column already removed):
//!
//! | columns | content |
//! |---------|---------|
//! | 0-4     | hemisphere A (Fp1) Delta, Theta, Alpha, Beta, Gamma |
//! | 5-9     | hemisphere B (Fp2), same band order |
//! | 10      | heartbeat |
//! | 11      | SDNN |
//! | 12      | RMSSD |
//!
//! Hemisphere bands are averaged, combined into ratio metrics with an epsilon
//! on every denominator, and frontal alpha asymmetry gives the preference score.

use crate::config::AnalysisConfig;
use crate::types::{BandPowers, CleanTable, ColumnAverages, MetricResult};

const HEMISPHERE_A: usize = 0;
const HEMISPHERE_B: usize = BandPowers::BANDS;
const SDNN_COLUMN: usize = 11;
const RMSSD_COLUMN: usize = 12;

/// Logistic squash onto (0, 1)
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Frontal alpha asymmetry between hemisphere A and B.
///
/// Uses the log difference when both alpha powers are positive and a
/// normalized difference otherwise. A non-finite result counts as no asymmetry.
pub fn frontal_asymmetry(alpha_a: f64, alpha_b: f64, epsilon: f64) -> f64 {
    let asym = if alpha_a > 0.0 && alpha_b > 0.0 {
        alpha_b.ln() - alpha_a.ln()
    } else {
        (alpha_b - alpha_a) / (alpha_b + alpha_a + epsilon)
    };

    if asym.is_finite() {
        asym
    } else {
        log::warn!("Frontal asymmetry is not finite, treating as 0");
        0.0
    }
}

/// Heart-rate variability column: RMSSD, then SDNN, then 0
pub fn select_hrv(averages: &ColumnAverages) -> f64 {
    averages
        .get(RMSSD_COLUMN)
        .or_else(|| averages.get(SDNN_COLUMN))
        .unwrap_or(0.0)
}

/// Score calculator for the table path
#[derive(Debug, Clone)]
pub struct ScoreCalculator {
    epsilon: f64,
    min_columns: usize,
    p300_placeholder_ms: f64,
}

impl Default for ScoreCalculator {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

impl ScoreCalculator {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            epsilon: config.epsilon,
            min_columns: config.min_band_columns,
            p300_placeholder_ms: config.p300_placeholder_ms,
        }
    }

    /// Derive metrics from a clean table.
    ///
    /// Returns `None` when the table is empty or too narrow for the two
    /// hemisphere band blocks; callers fall back to neutral defaults.
    pub fn derive(&self, table: &CleanTable) -> Option<MetricResult> {
        let averages = table.column_averages()?;
        self.derive_from_averages(&averages)
    }

    /// Derive metrics from precomputed column averages.
    ///
    /// Ratios that overflow are replaced with their neutral default, so the
    /// returned record is always finite.
    pub fn derive_from_averages(&self, averages: &ColumnAverages) -> Option<MetricResult> {
        if averages.len() < self.min_columns {
            log::warn!(
                "Insufficient columns in biomarker data: {} (need {})",
                averages.len(),
                self.min_columns
            );
            return None;
        }

        let hemi_a = BandPowers::from_columns(averages, HEMISPHERE_A)?;
        let hemi_b = BandPowers::from_columns(averages, HEMISPHERE_B)?;
        let bands = BandPowers::mean(&hemi_a, &hemi_b);
        let eps = self.epsilon;

        let focus = bands.beta / (bands.theta + eps);
        let relax = bands.alpha / (bands.beta + eps);
        let excite = (bands.beta + bands.gamma) / (bands.alpha + eps);
        let engagement = bands.beta / (bands.alpha + bands.theta + eps);
        let arousal = bands.beta / (bands.alpha + eps);

        let preference = sigmoid(frontal_asymmetry(hemi_a.alpha, hemi_b.alpha, eps));

        let metrics = MetricResult {
            theta_power: bands.theta,
            hrv: select_hrv(averages),
            p300_latency: self.p300_placeholder_ms,
            engagement,
            arousal,
            valence: preference,
            overall_preference: preference,
            focus,
            relax,
            excite,
            preference,
        };

        let (metrics, replaced) = metrics.sanitized();
        if !replaced.is_empty() {
            log::warn!(
                "Non-finite scores replaced with defaults: {}",
                replaced.join(", ")
            );
        }
        Some(metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-6;

    fn table(rows: Vec<Vec<f64>>) -> CleanTable {
        CleanTable::from_majority(rows)
    }

    fn doubling_row() -> Vec<f64> {
        vec![1.0, 2.0, 4.0, 8.0, 16.0, 1.0, 2.0, 4.0, 8.0, 16.0]
    }

    #[test]
    fn test_ratio_metrics() {
        let metrics = ScoreCalculator::default()
            .derive(&table(vec![doubling_row()]))
            .unwrap();

        assert!((metrics.theta_power - 2.0).abs() < TOL);
        assert!((metrics.focus - 4.0).abs() < TOL);
        assert!((metrics.relax - 0.5).abs() < TOL);
        assert!((metrics.excite - 6.0).abs() < TOL);
        assert!((metrics.engagement - 8.0 / 6.0).abs() < TOL);
        assert!((metrics.arousal - 2.0).abs() < TOL);
        assert!((metrics.preference - 0.5).abs() < TOL);
        assert_eq!(metrics.p300_latency, 300.0);
        assert_eq!(metrics.hrv, 0.0);
    }

    #[test]
    fn test_asymmetric_preference() {
        let e = std::f64::consts::E;
        let row = vec![1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, e, 1.0, 1.0];
        let metrics = ScoreCalculator::default().derive(&table(vec![row])).unwrap();

        assert!((metrics.preference - 0.731_058_6).abs() < TOL);
        assert_eq!(metrics.valence, metrics.preference);
        assert_eq!(metrics.overall_preference, metrics.preference);
    }

    #[test]
    fn test_non_positive_alpha_uses_normalized_difference() {
        assert!((frontal_asymmetry(0.0, 2.0, 1e-10) - 1.0).abs() < TOL);
        assert!((frontal_asymmetry(-1.0, 1.0, 1e-10)).abs() > 1e3);
        assert_eq!(frontal_asymmetry(0.0, 0.0, 1e-10), 0.0);
    }

    #[test]
    fn test_non_finite_asymmetry_is_zero() {
        assert_eq!(frontal_asymmetry(-1.0, 1.0, 0.0), 0.0);
    }

    #[test]
    fn test_zero_band_powers_stay_finite() {
        let metrics = ScoreCalculator::default()
            .derive(&table(vec![vec![0.0; 10]]))
            .unwrap();

        assert!(metrics.is_finite());
        assert_eq!(metrics.focus, 0.0);
        assert!((metrics.preference - 0.5).abs() < TOL);
    }

    #[test]
    fn test_overflowing_ratio_is_replaced() {
        let row = vec![0.0, 0.0, 1.0, 1e300, 0.0, 0.0, 0.0, 1.0, 1e300, 0.0];
        let metrics = ScoreCalculator::default().derive(&table(vec![row])).unwrap();

        assert!(metrics.is_finite());
        assert_eq!(metrics.focus, 0.5);
        assert!((metrics.arousal / 1e300 - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_huge_band_powers_average_finitely() {
        let rows = vec![vec![1e308; 10], vec![1e308; 10]];
        let metrics = ScoreCalculator::default().derive(&table(rows)).unwrap();

        assert!(metrics.is_finite());
        assert_eq!(metrics.theta_power, 1e308);
        assert_eq!(metrics.excite, 0.5);
    }

    #[test]
    fn test_hrv_prefers_rmssd() {
        let mut row = doubling_row();
        row.extend([72.0, 40.0, 35.0]);
        let metrics = ScoreCalculator::default().derive(&table(vec![row])).unwrap();

        assert_eq!(metrics.hrv, 35.0);
    }

    #[test]
    fn test_hrv_falls_back_to_sdnn() {
        let mut row = doubling_row();
        row.extend([72.0, 40.0]);
        let metrics = ScoreCalculator::default().derive(&table(vec![row])).unwrap();

        assert_eq!(metrics.hrv, 40.0);
    }

    #[test]
    fn test_columns_are_averaged() {
        let mut low = doubling_row();
        let mut high = doubling_row();
        low[1] = 1.0;
        high[1] = 3.0;
        let metrics = ScoreCalculator::default()
            .derive(&table(vec![low, high]))
            .unwrap();

        assert!((metrics.theta_power - 2.0).abs() < TOL);
    }

    #[test]
    fn test_insufficient_columns() {
        let calculator = ScoreCalculator::default();

        assert!(calculator.derive(&CleanTable::empty()).is_none());
        assert!(calculator.derive(&table(vec![vec![1.0; 9]])).is_none());
    }

    #[test]
    fn test_sigmoid() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!((sigmoid(1.0) - 0.731_058_6).abs() < TOL);
        assert!(sigmoid(-800.0) >= 0.0);
    }
}
