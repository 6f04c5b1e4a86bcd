//! Core types for the NeuroTune metrics pipeline
//!
//! This module defines the data structures that flow through each stage:
//! parsed rows, the row-length histogram, the rectangular clean table,
//! column averages, band powers and the final metric record.

use serde::{Deserialize, Serialize};

/// Numeric fields recovered from one data line, in original column order.
///
/// Unparseable or empty cells are omitted, so a row with bad cells is shorter
/// than its neighbours rather than holding gaps.
pub type ParsedRow = Vec<f64>;

/// Occurrence count per parsed-row length, kept in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowLengthHistogram {
    entries: Vec<(usize, usize)>,
}

impl RowLengthHistogram {
    /// Build a histogram over a sequence of parsed rows
    pub fn from_rows(rows: &[ParsedRow]) -> Self {
        let mut histogram = Self::default();
        for row in rows {
            histogram.record(row.len());
        }
        histogram
    }

    /// Count one more row of the given length
    pub fn record(&mut self, len: usize) {
        match self.entries.iter_mut().find(|(l, _)| *l == len) {
            Some((_, count)) => *count += 1,
            None => self.entries.push((len, 1)),
        }
    }

    /// Number of rows seen with the given length
    pub fn count(&self, len: usize) -> usize {
        self.entries
            .iter()
            .find(|(l, _)| *l == len)
            .map_or(0, |(_, count)| *count)
    }

    /// The most frequent row length.
    ///
    /// Ties go to the length that was seen first.
    pub fn canonical_length(&self) -> Option<usize> {
        let mut best: Option<(usize, usize)> = None;
        for &(len, count) in &self.entries {
            match best {
                Some((_, best_count)) if count <= best_count => {}
                _ => best = Some((len, count)),
            }
        }
        best.map(|(len, _)| len)
    }

    /// Total number of rows recorded
    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, count)| count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Rectangular numeric table: every row has the same length and every value is finite
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanTable {
    rows: Vec<ParsedRow>,
    columns: usize,
}

impl CleanTable {
    /// An empty table, the normal result when nothing usable could be loaded
    pub fn empty() -> Self {
        Self::default()
    }

    /// Keep only the rows whose length matches the histogram's canonical length.
    ///
    /// Rows holding a non-finite value are discarded before the vote. Rows of
    /// any other length are dropped whole, never padded or truncated.
    pub fn from_majority(mut rows: Vec<ParsedRow>) -> Self {
        rows.retain(|row| row.iter().all(|v| v.is_finite()));

        let histogram = RowLengthHistogram::from_rows(&rows);
        let Some(columns) = histogram.canonical_length() else {
            return Self::empty();
        };

        let rows: Vec<ParsedRow> = rows.into_iter().filter(|row| row.len() == columns).collect();

        if rows.is_empty() {
            return Self::empty();
        }

        Self { rows, columns }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> &[ParsedRow] {
        &self.rows
    }

    /// Arithmetic mean down each column, `None` for an empty table.
    ///
    /// Each value is scaled by the row count before summing, so columns near
    /// `f64::MAX` still average to a finite number.
    pub fn column_averages(&self) -> Option<ColumnAverages> {
        if self.is_empty() {
            return None;
        }

        let count = self.rows.len() as f64;
        let mut means = vec![0.0; self.columns];
        for row in &self.rows {
            for (mean, value) in means.iter_mut().zip(row) {
                *mean += value / count;
            }
        }

        Some(ColumnAverages(means))
    }
}

/// Per-column means of a clean table
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnAverages(Vec<f64>);

impl ColumnAverages {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

/// Averaged band powers for one electrode site (or the mean of two sites)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BandPowers {
    pub delta: f64,
    pub theta: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl BandPowers {
    /// Number of bands per hemisphere in the export layout
    pub const BANDS: usize = 5;

    /// Read five consecutive columns in Delta, Theta, Alpha, Beta, Gamma order
    pub fn from_columns(averages: &ColumnAverages, offset: usize) -> Option<Self> {
        let values = averages.as_slice().get(offset..offset + Self::BANDS)?;
        Some(Self {
            delta: values[0],
            theta: values[1],
            alpha: values[2],
            beta: values[3],
            gamma: values[4],
        })
    }

    /// Band-wise mean of two sites
    pub fn mean(a: &Self, b: &Self) -> Self {
        let half = |x: f64, y: f64| x / 2.0 + y / 2.0;
        Self {
            delta: half(a.delta, b.delta),
            theta: half(a.theta, b.theta),
            alpha: half(a.alpha, b.alpha),
            beta: half(a.beta, b.beta),
            gamma: half(a.gamma, b.gamma),
        }
    }
}

/// The externally visible result: eleven named scalar indices.
///
/// `valence`, `overall_preference` and `preference` carry the same score;
/// downstream consumers read all three names.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricResult {
    pub theta_power: f64,
    pub hrv: f64,
    pub p300_latency: f64,
    pub engagement: f64,
    pub arousal: f64,
    pub valence: f64,
    pub overall_preference: f64,
    pub focus: f64,
    pub relax: f64,
    pub excite: f64,
    pub preference: f64,
}

/// Fallback record emitted when no usable signal data is available
pub const NEUTRAL_DEFAULTS: MetricResult = MetricResult {
    theta_power: 0.0,
    hrv: 0.0,
    p300_latency: 0.0,
    engagement: 0.5,
    arousal: 0.5,
    valence: 0.5,
    overall_preference: 0.5,
    focus: 0.5,
    relax: 0.5,
    excite: 0.5,
    preference: 0.5,
};

impl Default for MetricResult {
    fn default() -> Self {
        NEUTRAL_DEFAULTS
    }
}

impl MetricResult {
    /// Field names paired with mutable references, in serialization order
    fn fields_mut(&mut self) -> [(&'static str, &mut f64); 11] {
        [
            ("theta_power", &mut self.theta_power),
            ("hrv", &mut self.hrv),
            ("p300_latency", &mut self.p300_latency),
            ("engagement", &mut self.engagement),
            ("arousal", &mut self.arousal),
            ("valence", &mut self.valence),
            ("overall_preference", &mut self.overall_preference),
            ("focus", &mut self.focus),
            ("relax", &mut self.relax),
            ("excite", &mut self.excite),
            ("preference", &mut self.preference),
        ]
    }

    /// Field names paired with values, in serialization order
    pub fn fields(&self) -> [(&'static str, f64); 11] {
        [
            ("theta_power", self.theta_power),
            ("hrv", self.hrv),
            ("p300_latency", self.p300_latency),
            ("engagement", self.engagement),
            ("arousal", self.arousal),
            ("valence", self.valence),
            ("overall_preference", self.overall_preference),
            ("focus", self.focus),
            ("relax", self.relax),
            ("excite", self.excite),
            ("preference", self.preference),
        ]
    }

    /// True when every field is a finite number
    pub fn is_finite(&self) -> bool {
        self.fields().iter().all(|(_, v)| v.is_finite())
    }

    /// Replace non-finite fields with their neutral default.
    ///
    /// Returns the names of the fields that were replaced.
    pub fn sanitized(mut self) -> (Self, Vec<&'static str>) {
        let defaults = NEUTRAL_DEFAULTS.fields();
        let mut replaced = Vec::new();
        for ((name, value), (_, fallback)) in self.fields_mut().into_iter().zip(defaults) {
            if !value.is_finite() {
                *value = fallback;
                replaced.push(name);
            }
        }
        (self, replaced)
    }

    /// Round every field to a fixed number of decimal places.
    ///
    /// Values too large to scale are already whole and stay as they are.
    pub fn rounded(mut self, decimals: u32) -> Self {
        let scale = 10f64.powi(decimals as i32);
        for (_, value) in self.fields_mut() {
            let scaled = *value * scale;
            if scaled.is_finite() {
                *value = scaled.round() / scale;
            }
        }
        self
    }
}

/// Which ingestion path produced a metric record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricSource {
    /// Averaged band powers from the combined biomarker table
    Table,
    /// Heuristics over raw EEG/ECG/GSR traces
    Waveform,
    /// Neutral defaults, no usable data
    Defaults,
}

impl MetricSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricSource::Table => "table",
            MetricSource::Waveform => "waveform",
            MetricSource::Defaults => "defaults",
        }
    }
}
